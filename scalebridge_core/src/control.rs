//! Listener control protocol.
//!
//! Listeners may send `{"type":"ping"}` and get `{"type":"pong"}` back.
//! Anything else, including malformed JSON, is ignored.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

pub const PONG: &str = r#"{"type":"pong"}"#;

/// Reply to send for an incoming listener message, if any.
pub fn control_reply(text: &str) -> Option<&'static str> {
    let msg: Value = serde_json::from_str(text).ok()?;
    match msg.get("type").and_then(Value::as_str) {
        Some("ping") => Some(PONG),
        _ => None,
    }
}

/// Greeting sent to a listener right after it connects.
pub fn welcome_message(now: DateTime<Utc>) -> String {
    json!({
        "type": "connected",
        "message": "Connected to scale bridge",
        "timestamp": now.to_rfc3339(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_gets_pong() {
        assert_eq!(control_reply(r#"{"type":"ping"}"#), Some(PONG));
        assert_eq!(control_reply(r#"{ "type" : "ping", "seq": 4 }"#), Some(PONG));
    }

    #[test]
    fn everything_else_is_ignored() {
        for msg in [
            "",
            "ping",
            "{not json",
            r#"{"type":"pong"}"#,
            r#"{"kind":"ping"}"#,
            r#"["ping"]"#,
            r#"{"type":42}"#,
        ] {
            assert_eq!(control_reply(msg), None, "input {msg:?}");
        }
    }

    #[test]
    fn welcome_is_tagged_connected() {
        let v: serde_json::Value = serde_json::from_str(&welcome_message(Utc::now())).unwrap();
        assert_eq!(v["type"], "connected");
        assert!(v["timestamp"].is_string());
    }
}
