//! Stability and duplicate filtering for the raw weight stream.
//!
//! A weighing produces a burst of jittery samples while the load settles.
//! `StabilityTracker` turns that burst into at most one settled weight:
//!
//! 1. every sample is appended to a bounded window (10, oldest evicted);
//! 2. non-positive samples are rejected (empty pan, tare, negative drift);
//! 3. the last `required_readings` samples must lie within `threshold_kg`;
//! 4. the reported weight is the mean of the last 3 samples, rounded to
//!    3 decimals, independent of `required_readings`, and must itself be
//!    positive. With fewer than 3 samples in the window (only reachable
//!    when `required_readings < 3`) the divisor is the number of samples
//!    present, not a fixed 3, so a lone 1.5 kg sample settles at 1.5;
//! 5. a settlement within 0.01 kg of the previous emission and inside the
//!    duplicate window is suppressed.
//!
//! The last emission survives window turnover; it is the only record of
//! "already billed".
//!
//! One tracker per link, driven by one caller: `ingest` takes `&mut self`.

use crate::config::StabilityCfg;
use crate::util::{le_eps, round_kg};
use scalebridge_traits::clock::{Clock, MonotonicClock};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples retained for the stability test.
pub const WINDOW_CAPACITY: usize = 10;
/// Samples averaged into the reported weight.
pub const SETTLE_AVERAGE_LEN: usize = 3;
/// Two settlements closer than this are the same weight.
pub const DUPLICATE_TOLERANCE_KG: f64 = 0.01;

/// A weight the tracker has confirmed as steady and not yet reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settled {
    pub weight_kg: f64,
}

#[derive(Debug)]
pub struct StabilityTracker<C: Clock = MonotonicClock> {
    cfg: StabilityCfg,
    window: VecDeque<f64>,
    last_emitted: Option<(f64, Instant)>,
    clock: C,
}

impl StabilityTracker<MonotonicClock> {
    pub fn new(cfg: StabilityCfg) -> Self {
        Self::with_clock(cfg, MonotonicClock::new())
    }
}

impl<C: Clock> StabilityTracker<C> {
    pub fn with_clock(cfg: StabilityCfg, clock: C) -> Self {
        Self {
            cfg,
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            last_emitted: None,
            clock,
        }
    }

    /// Feed one sample in arrival order.
    ///
    /// Returns `Some` exactly when this sample completes a stable, non-duplicate
    /// reading; the emission is recorded before returning.
    pub fn ingest(&mut self, weight_kg: f64) -> Option<Settled> {
        if !weight_kg.is_finite() {
            tracing::trace!(weight_kg, "non-finite sample dropped");
            return None;
        }

        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(weight_kg);

        if weight_kg <= 0.0 {
            return None;
        }
        if !self.is_stable() {
            return None;
        }

        let settled = self.settled_weight()?;
        if settled <= 0.0 {
            // stable run straddling zero
            return None;
        }
        if self.is_duplicate(settled) {
            tracing::trace!(weight_kg = settled, "duplicate settlement suppressed");
            return None;
        }

        self.last_emitted = Some((settled, self.clock.now()));
        Some(Settled { weight_kg: settled })
    }

    fn required(&self) -> usize {
        self.cfg.required_readings.clamp(1, WINDOW_CAPACITY)
    }

    /// True when the most recent `required_readings` samples agree within the threshold.
    pub fn is_stable(&self) -> bool {
        let n = self.required();
        if self.window.len() < n {
            return false;
        }
        let (lo, hi) = self
            .window
            .iter()
            .rev()
            .take(n)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
                (lo.min(w), hi.max(w))
            });
        le_eps(hi - lo, self.cfg.threshold_kg)
    }

    /// Mean of the last three samples, rounded to grams.
    ///
    /// A shorter window is averaged over its own length rather than divided
    /// by three.
    pub fn settled_weight(&self) -> Option<f64> {
        let take = self.window.len().min(SETTLE_AVERAGE_LEN);
        if take == 0 {
            return None;
        }
        let sum: f64 = self.window.iter().rev().take(take).sum();
        Some(round_kg(sum / take as f64))
    }

    /// True if `weight_kg` repeats the last emission inside the duplicate window.
    pub fn is_duplicate(&self, weight_kg: f64) -> bool {
        let Some((last, at)) = self.last_emitted else {
            return false;
        };
        if !le_eps((weight_kg - last).abs(), DUPLICATE_TOLERANCE_KG) {
            return false;
        }
        let elapsed = self.clock.now().saturating_duration_since(at);
        elapsed < Duration::from_millis(self.cfg.duplicate_timeout_ms)
    }

    /// Last emitted weight, if any.
    pub fn last_emitted(&self) -> Option<f64> {
        self.last_emitted.map(|(w, _)| w)
    }

    /// Samples currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn cfg(&self) -> &StabilityCfg {
        &self.cfg
    }
}
