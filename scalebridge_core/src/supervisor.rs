//! Connection supervision for the scale link.
//!
//! `LinkSupervisor` owns the opener and the current link and turns them into
//! an endless sequence of poll outcomes. State transitions:
//!
//! ```text
//! Disconnected --open ok-----> Connected
//! Disconnected --open err----> Failed --backoff--> Disconnected
//! Connected    --read err----> Disconnected   (link dropped = closed)
//! Connected    --read timeout> Connected      (no chunk)
//! ```
//!
//! Backoff doubles from `initial_ms` up to `max_ms` and resets on the next
//! successful open. The supervisor never gives up; only the stop flag ends it.

use crate::config::BackoffCfg;
use crate::hw_error::map_link_error;
use crate::util::{ms, secs_f64};
use scalebridge_traits::clock::{Clock, MonotonicClock};
use scalebridge_traits::{LinkOpener, ScaleLink};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Exponential reconnect delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(cfg: &BackoffCfg) -> Self {
        let initial = ms(cfg.initial_ms.max(1));
        let max = ms(cfg.max_ms).max(initial);
        Self {
            initial,
            max,
            next: initial,
        }
    }

    /// Delay to apply for the current failure; doubles the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let d = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        d
    }

    /// Delay the next failure would get, without consuming it.
    pub fn peek(&self) -> Duration {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Result of one supervisor cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// Bytes read from the device.
    Chunk(Vec<u8>),
    /// Connected, but the read timed out empty.
    NoData,
    /// Open failed; the supervisor already waited `retry_in`.
    ConnectFailed { retry_in: Duration },
    /// Read failed; the link was closed and will be reopened next cycle.
    ReadFailed,
}

pub struct LinkSupervisor<O: LinkOpener, C: Clock = MonotonicClock> {
    opener: O,
    link: Option<O::Link>,
    state: LinkState,
    backoff: Backoff,
    slice: Duration,
    clock: C,
    shutdown: Arc<AtomicBool>,
    consecutive_failures: u32,
}

impl<O: LinkOpener> LinkSupervisor<O, MonotonicClock> {
    pub fn new(opener: O, cfg: &BackoffCfg, shutdown: Arc<AtomicBool>) -> Self {
        Self::with_clock(opener, cfg, MonotonicClock::new(), shutdown)
    }
}

impl<O: LinkOpener, C: Clock> LinkSupervisor<O, C> {
    pub fn with_clock(opener: O, cfg: &BackoffCfg, clock: C, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            opener,
            link: None,
            state: LinkState::Disconnected,
            backoff: Backoff::new(cfg),
            slice: ms(cfg.slice_ms.max(1)),
            clock,
            shutdown,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Shared stop flag; raising it ends the poll sequence.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    fn stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Cooperative pause between cycles, cut short by the stop flag.
    pub fn pause(&self, d: Duration) {
        self.wait(d);
    }

    /// Run one cycle: connect if needed, then read once.
    ///
    /// Blocks for at most one read timeout, or one backoff delay when the
    /// open fails (cut short by the stop flag).
    pub fn poll(&mut self) -> Poll {
        if self.link.is_none() {
            self.state = LinkState::Connecting;
            match self.opener.open() {
                Ok(link) => {
                    self.link = Some(link);
                    self.state = LinkState::Connected;
                    self.backoff.reset();
                    self.consecutive_failures = 0;
                    tracing::info!(endpoint = %self.opener.endpoint(), "scale link connected");
                }
                Err(e) => {
                    self.state = LinkState::Failed;
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    let retry_in = self.backoff.next_delay();
                    tracing::warn!(
                        endpoint = %self.opener.endpoint(),
                        error = %map_link_error(&*e),
                        failures = self.consecutive_failures,
                        retry_in_s = secs_f64(retry_in),
                        "failed to open scale link"
                    );
                    self.wait(retry_in);
                    self.state = LinkState::Disconnected;
                    return Poll::ConnectFailed { retry_in };
                }
            }
        }

        let Some(link) = self.link.as_mut() else {
            return Poll::NoData;
        };
        match link.read() {
            Ok(Some(bytes)) if !bytes.is_empty() => Poll::Chunk(bytes),
            Ok(_) => Poll::NoData,
            Err(e) => {
                tracing::error!(
                    endpoint = %self.opener.endpoint(),
                    error = %map_link_error(&*e),
                    "scale read failed; closing link"
                );
                self.link = None;
                self.state = LinkState::Disconnected;
                Poll::ReadFailed
            }
        }
    }

    /// Sleep `d` in slices, returning early once the stop flag is raised.
    fn wait(&self, d: Duration) {
        let mut remaining = d;
        while !remaining.is_zero() && !self.stopped() {
            let step = remaining.min(self.slice);
            self.clock.sleep(step);
            remaining = remaining.saturating_sub(step);
        }
    }

    /// Drop the current link, if any.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            tracing::info!(endpoint = %self.opener.endpoint(), "scale link closed");
        }
        self.state = LinkState::Disconnected;
    }
}

/// Endless poll sequence; ends only when the stop flag is raised.
impl<O: LinkOpener, C: Clock> Iterator for LinkSupervisor<O, C> {
    type Item = Poll;

    fn next(&mut self) -> Option<Poll> {
        if self.stopped() {
            return None;
        }
        Some(self.poll())
    }
}
