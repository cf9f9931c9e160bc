//! Maps `Box<dyn Error>` from trait boundaries to typed `BridgeError`.
//!
//! The traits in `scalebridge_traits` use `Box<dyn Error + Send + Sync>` so
//! any link implementation can plug in; this module converts those to our
//! typed error enum, with an optional feature-gated path for
//! `scalebridge_hardware::HwError` downcasting.

use crate::error::BridgeError;

/// Map a link-boundary error to a typed `BridgeError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_link_error(e: &(dyn std::error::Error + 'static)) -> BridgeError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<scalebridge_hardware::error::HwError>() {
            return match hw {
                scalebridge_hardware::error::HwError::Timeout => BridgeError::Timeout,
                other => BridgeError::LinkFault(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::TimedOut
    {
        return BridgeError::Timeout;
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        BridgeError::Timeout
    } else {
        BridgeError::Link(s)
    }
}
