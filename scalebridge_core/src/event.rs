//! The settled, billable output of the pipeline.

use crate::util::{round_kg, round_money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One final weighing. Immutable once built; sinks receive it by reference.
///
/// Wire shape (broadcast and audit log):
/// `{"product_id":"0002","weight":2.5,"unit_price":1200.0,"total_price":3000.0,"timestamp":"..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighEvent {
    #[serde(rename = "product_id")]
    product_code: String,
    #[serde(rename = "weight")]
    weight_kg: f64,
    unit_price: f64,
    total_price: f64,
    timestamp: DateTime<Utc>,
}

impl WeighEvent {
    /// Build an event; weight is rounded to 3 decimals and the total
    /// (`weight * unit_price`) to 2.
    pub fn new(
        product_code: impl Into<String>,
        weight_kg: f64,
        unit_price: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let weight_kg = round_kg(weight_kg);
        Self {
            product_code: product_code.into(),
            weight_kg,
            unit_price,
            total_price: round_money(weight_kg * unit_price),
            timestamp,
        }
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_uses_wire_field_names() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let ev = WeighEvent::new("0002", 2.5, 1200.0, ts);
        let v: serde_json::Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
        assert_eq!(v["product_id"], "0002");
        assert_eq!(v["weight"], 2.5);
        assert_eq!(v["unit_price"], 1200.0);
        assert_eq!(v["total_price"], 3000.0);
        assert!(v["timestamp"].as_str().unwrap().starts_with("2026-03-01T09:30:00"));
    }

    #[test]
    fn rounds_weight_then_total() {
        let ev = WeighEvent::new("0001", 1.23456, 850.0, Utc::now());
        assert_eq!(ev.weight_kg(), 1.235);
        assert_eq!(ev.total_price(), 1049.75);
    }
}
