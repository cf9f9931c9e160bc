//! Rounding and time helpers shared by the pipeline stages.

use std::time::Duration;

/// Tolerance applied to decimal comparisons (spread, duplicate distance) so
/// that values such as `1.01 - 1.00` compare as the decimal `0.01` they
/// represent rather than the binary `0.010000000000000009`.
pub const DECIMAL_EPS: f64 = 1e-9;

/// Round to `places` decimal digits, half away from zero.
/// Non-finite inputs are returned unchanged.
#[inline]
pub fn round_to(x: f64, places: i32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

/// Weights are reported in grams precision.
#[inline]
pub fn round_kg(x: f64) -> f64 {
    round_to(x, 3)
}

/// Money is reported to two decimals.
#[inline]
pub fn round_money(x: f64) -> f64 {
    round_to(x, 2)
}

/// `a <= b` with [`DECIMAL_EPS`] slack.
#[inline]
pub fn le_eps(a: f64, b: f64) -> bool {
    a <= b + DECIMAL_EPS
}

/// Milliseconds from a config value to a `Duration`.
#[inline]
pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Duration in fractional seconds for logging.
#[inline]
pub fn secs_f64(d: Duration) -> f64 {
    d.as_secs_f64()
}
