//! Human-readable error descriptions and structured JSON error formatting.

use scalebridge_core::BridgeError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BridgeError>() {
        return match be {
            BridgeError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then run `scalebridge self-check`."
            ),
            BridgeError::Timeout => "What happened: Scale read timed out.\nLikely causes: Wrong port, scale powered off, or baud rate mismatch.\nHow to fix: Check [serial] port/baud_rate and the cable; consider raising serial.timeout_ms.".to_string(),
            BridgeError::Link(msg) | BridgeError::LinkFault(msg) => format!(
                "What happened: Could not talk to the scale ({msg}).\nLikely causes: Port missing, in use by another program, or insufficient permissions.\nHow to fix: Run `scalebridge ports`, fix serial.port, and make sure the user can open the device."
            ),
            BridgeError::Io(msg) => format!(
                "What happened: I/O failure ({msg}).\nLikely causes: Audit file not writable, or the WebSocket port already in use.\nHow to fix: Check audit.file permissions and websocket.host/port."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<BridgeError>() {
        Some(BridgeError::Config(_)) => "Config",
        Some(BridgeError::Timeout) => "Timeout",
        Some(BridgeError::Link(_) | BridgeError::LinkFault(_)) => "Link",
        Some(BridgeError::Io(_)) => "Io",
        Some(BridgeError::Sink(_)) => "Sink",
        Some(BridgeError::Serialization(_)) => "Serialization",
        None => "Error",
    }
}

/// Stable exit codes per error family; anything untyped returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<BridgeError>() {
        Some(BridgeError::Config(_)) => 3,
        Some(BridgeError::Link(_) | BridgeError::LinkFault(_) | BridgeError::Timeout) => 4,
        Some(BridgeError::Io(_) | BridgeError::Sink(_) | BridgeError::Serialization(_)) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
