//! Simulated scale: replays placements of goods on the pan as line frames.
//!
//! Each placement ramps up, holds steady with a little jitter, then the pan
//! is emptied. Frame formats rotate so every decoder path gets traffic.
//! The script repeats forever.

use scalebridge_traits::clock::{Clock, MonotonicClock};
use scalebridge_traits::{LinkOpener, ScaleLink};
use std::time::Duration;

/// One placement on the simulated pan.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub product_code: String,
    pub weight_kg: f64,
    /// Price the device prints itself; 0 leaves pricing to the host.
    pub device_price: f64,
}

impl Placement {
    pub fn new(product_code: impl Into<String>, weight_kg: f64) -> Self {
        Self {
            product_code: product_code.into(),
            weight_kg,
            device_price: 0.0,
        }
    }
}

pub fn demo_placements() -> Vec<Placement> {
    vec![
        Placement {
            device_price: 900.0,
            ..Placement::new("0001", 1.234)
        },
        Placement::new("0002", 0.750),
        Placement::new("0003", 2.500),
        Placement::new("0004", 0.480),
        Placement::new("0005", 1.000),
    ]
}

const JITTER: [f64; 4] = [0.002, -0.001, 0.0, 0.001];
const RAMP: [f64; 2] = [0.4, 0.9];
const EMPTY_FRAMES: usize = 3;

/// Frames for one placement, in the format chosen by `style`.
pub fn placement_frames(p: &Placement, style: usize) -> Vec<String> {
    let samples = RAMP
        .iter()
        .map(|f| p.weight_kg * f)
        .chain(JITTER.iter().map(|j| p.weight_kg + j))
        .chain(std::iter::repeat_n(0.0, EMPTY_FRAMES));
    samples
        .map(|w| match style % 4 {
            0 => format!(
                "P{}W{w:.3}U{:.2}T{:.2}\r\n",
                p.product_code,
                p.device_price,
                w * p.device_price
            ),
            1 => format!("ST,GS,P{}W{w:.3}\r\n", p.product_code),
            2 => format!("W{w:+.3}\r\n"),
            _ => format!("ST,GS,{w:8.3} kg\r\n"),
        })
        .collect()
}

/// Opener for [`SimulatedLink`]s. Optionally fails the first few opens so
/// reconnect handling can be watched without a device.
#[derive(Debug, Clone)]
pub struct SimulatedScale<C: Clock = MonotonicClock> {
    placements: Vec<Placement>,
    interval: Duration,
    fail_opens: u32,
    clock: C,
}

impl SimulatedScale<MonotonicClock> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, MonotonicClock::new())
    }
}

impl<C: Clock + Clone> SimulatedScale<C> {
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        Self {
            placements: demo_placements(),
            interval,
            fail_opens: 0,
            clock,
        }
    }

    pub fn with_placements(mut self, placements: Vec<Placement>) -> Self {
        self.placements = placements;
        self
    }

    pub fn fail_first_opens(mut self, n: u32) -> Self {
        self.fail_opens = n;
        self
    }
}

impl<C: Clock + Clone> LinkOpener for SimulatedScale<C> {
    type Link = SimulatedLink<C>;

    fn open(&mut self) -> Result<SimulatedLink<C>, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_opens > 0 {
            self.fail_opens -= 1;
            return Err(Box::new(crate::error::HwError::Open(
                "simulated device not ready".into(),
            )));
        }
        tracing::debug!(placements = self.placements.len(), "simulated scale opened");
        Ok(SimulatedLink {
            placements: self.placements.clone(),
            interval: self.interval,
            clock: self.clock.clone(),
            next_placement: 0,
            queued: Vec::new(),
        })
    }

    fn endpoint(&self) -> String {
        String::from("simulated")
    }
}

pub struct SimulatedLink<C: Clock = MonotonicClock> {
    placements: Vec<Placement>,
    interval: Duration,
    clock: C,
    next_placement: usize,
    // reversed, popped from the back
    queued: Vec<String>,
}

impl<C: Clock> ScaleLink for SimulatedLink<C> {
    fn read(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
        self.clock.sleep(self.interval);
        if self.queued.is_empty() {
            let Some(p) = self.placements.get(self.next_placement % self.placements.len().max(1))
            else {
                return Ok(None);
            };
            self.queued = placement_frames(p, self.next_placement);
            self.queued.reverse();
            self.next_placement += 1;
        }
        Ok(self.queued.pop().map(String::into_bytes))
    }
}
