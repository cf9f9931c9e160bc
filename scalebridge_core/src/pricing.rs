//! Product code → unit price lookup.

use std::collections::BTreeMap;

/// Read-only price list keyed by product (PLU) code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: BTreeMap<String, f64>,
}

impl PriceTable {
    pub fn new(prices: BTreeMap<String, f64>) -> Self {
        Self { prices }
    }

    /// Unit price for `code`, or `0.0` when the code is not listed.
    pub fn unit_price(&self, code: &str) -> f64 {
        self.prices.get(code).copied().unwrap_or(0.0)
    }

    /// Device-supplied price wins when non-zero; otherwise fall back to the table.
    pub fn resolve(&self, code: &str, device_price: f64) -> f64 {
        if device_price != 0.0 {
            device_price
        } else {
            self.unit_price(code)
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}
