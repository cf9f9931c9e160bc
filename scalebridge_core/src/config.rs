//! Configuration types for the reading pipeline.
//!
//! These are the runtime structs used by the core components. They are
//! separate from the TOML-deserialized config in `scalebridge_config`; see
//! `conversions` for the mapping.

/// Stability window and duplicate suppression.
#[derive(Debug, Clone)]
pub struct StabilityCfg {
    /// Max spread (kg) across the last `required_readings` samples.
    pub threshold_kg: f64,
    /// Number of most recent samples that must agree. Range 1..=10.
    pub required_readings: usize,
    /// An equal weight within this many ms of the last emission is a duplicate.
    pub duplicate_timeout_ms: u64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            threshold_kg: 0.01,
            required_readings: 3,
            duplicate_timeout_ms: 2000,
        }
    }
}

/// Reconnect backoff for the link supervisor.
#[derive(Debug, Clone)]
pub struct BackoffCfg {
    /// Delay after the first failed connect; also the value restored on success.
    pub initial_ms: u64,
    /// Ceiling for the doubling delay.
    pub max_ms: u64,
    /// Sleep granularity while backing off, so a stop request is seen promptly.
    pub slice_ms: u64,
}

impl Default for BackoffCfg {
    fn default() -> Self {
        Self {
            initial_ms: 1000,
            max_ms: 30_000,
            slice_ms: 100,
        }
    }
}

/// Orchestration knobs.
#[derive(Debug, Clone)]
pub struct PipelineCfg {
    /// Pause after a cycle that yielded no chunk.
    pub idle_ms: u64,
    /// Capacity of the reader → pipeline chunk channel.
    pub channel_depth: usize,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            idle_ms: 100,
            channel_depth: 256,
        }
    }
}
