//! Frame decoding for the scale's serial output.
//!
//! The scale emits one of several ASCII layouts depending on its mode,
//! usually wrapped in STX/ETX or CR/LF:
//!
//! | format           | example                          |
//! |------------------|----------------------------------|
//! | full             | `P0001W+001.234U0850.00T1049.90` |
//! | product + weight | `P0001W+001.234`                 |
//! | weight only      | `W+001.234`                      |
//! | bare kilograms   | `1.234 kg`                       |
//!
//! Matchers run in that order and the first hit wins. Matching is a
//! substring search, so leading/trailing control bytes are harmless.

use crate::pricing::PriceTable;
use crate::util::round_money;
use regex::Regex;
use std::sync::LazyLock;

/// Product code reported when the frame carries none.
pub const UNKNOWN_PRODUCT: &str = "0000";

/// Which layout produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Full,
    ProductWeight,
    WeightOnly,
    BareKg,
}

/// One decoded message. Only `weight_kg` is always meaningful; prices of
/// `0.0` mean "not provided by the device".
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub product_code: String,
    pub weight_kg: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub format: FrameFormat,
}

impl RawFrame {
    fn weight_only(weight_kg: f64, format: FrameFormat) -> Self {
        Self {
            product_code: UNKNOWN_PRODUCT.to_string(),
            weight_kg,
            unit_price: 0.0,
            total_price: 0.0,
            format,
        }
    }
}

// The patterns are literals; a failure here is a programming error caught by
// the first test run.
#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("frame pattern must compile")
}

static FULL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"P(\d{4,6})W([+-]?\d+\.?\d*)U(\d+\.?\d*)T(\d+\.?\d*)"));
static PRODUCT_WEIGHT: LazyLock<Regex> = LazyLock::new(|| pattern(r"P(\d{4,6})W([+-]?\d+\.?\d*)"));
static WEIGHT_ONLY: LazyLock<Regex> = LazyLock::new(|| pattern(r"W([+-]?\d+\.?\d*)"));
static BARE_KG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(\d+\.?\d*)\s*[kK][gG]"));

/// Lenient byte → text conversion: anything outside 7-bit ASCII is dropped.
fn ascii_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}

fn num(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decode one raw chunk. Never fails: unrecognised input is `None`.
///
/// Product+weight frames come back with zero prices; use [`decode_priced`]
/// to fill them from a price table.
pub fn decode(bytes: &[u8]) -> Option<RawFrame> {
    let owned = ascii_text(bytes);
    let text = owned.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(c) = FULL.captures(text) {
        return Some(RawFrame {
            product_code: c[1].to_string(),
            weight_kg: num(&c[2])?,
            unit_price: num(&c[3])?,
            total_price: num(&c[4])?,
            format: FrameFormat::Full,
        });
    }

    if let Some(c) = PRODUCT_WEIGHT.captures(text) {
        return Some(RawFrame {
            product_code: c[1].to_string(),
            weight_kg: num(&c[2])?,
            unit_price: 0.0,
            total_price: 0.0,
            format: FrameFormat::ProductWeight,
        });
    }

    if let Some(c) = WEIGHT_ONLY.captures(text) {
        return Some(RawFrame::weight_only(num(&c[1])?, FrameFormat::WeightOnly));
    }

    if let Some(c) = BARE_KG.captures(text) {
        return Some(RawFrame::weight_only(num(&c[1])?, FrameFormat::BareKg));
    }

    tracing::trace!(text = ?text, "no frame pattern matched");
    None
}

/// [`decode`], then price product+weight frames from `prices`:
/// `total = round(weight * unit, 2)`.
pub fn decode_priced(bytes: &[u8], prices: &PriceTable) -> Option<RawFrame> {
    let mut frame = decode(bytes)?;
    if frame.format == FrameFormat::ProductWeight {
        frame.unit_price = prices.unit_price(&frame.product_code);
        frame.total_price = round_money(frame.weight_kg * frame.unit_price);
    }
    Some(frame)
}
