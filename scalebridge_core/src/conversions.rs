//! `From` implementations bridging `scalebridge_config` types to core types.

use crate::config::{BackoffCfg, PipelineCfg, StabilityCfg};
use crate::pricing::PriceTable;

// ── StabilityCfg ─────────────────────────────────────────────────────────────

impl From<&scalebridge_config::ScaleCfg> for StabilityCfg {
    fn from(c: &scalebridge_config::ScaleCfg) -> Self {
        Self {
            threshold_kg: c.stability_threshold_kg,
            required_readings: c.stability_readings,
            duplicate_timeout_ms: c.duplicate_timeout_ms,
        }
    }
}

// ── BackoffCfg ───────────────────────────────────────────────────────────────

impl From<&scalebridge_config::LinkCfg> for BackoffCfg {
    fn from(c: &scalebridge_config::LinkCfg) -> Self {
        Self {
            initial_ms: c.backoff_initial_ms,
            max_ms: c.backoff_max_ms,
            ..Self::default()
        }
    }
}

// ── PipelineCfg ──────────────────────────────────────────────────────────────

impl From<&scalebridge_config::LinkCfg> for PipelineCfg {
    fn from(c: &scalebridge_config::LinkCfg) -> Self {
        Self {
            idle_ms: c.idle_ms,
            channel_depth: c.channel_depth,
        }
    }
}

// ── PriceTable ───────────────────────────────────────────────────────────────

impl From<&scalebridge_config::Config> for PriceTable {
    fn from(c: &scalebridge_config::Config) -> Self {
        PriceTable::new(c.plu_prices.clone())
    }
}
