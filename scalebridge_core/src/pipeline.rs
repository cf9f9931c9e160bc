//! Reading pipeline: link → decode → stability → pricing → sinks.
use crate::config::{PipelineCfg, StabilityCfg};
use crate::event::WeighEvent;
use crate::frame::{RawFrame, decode_priced};
use crate::pricing::PriceTable;
use crate::reader::LinkReader;
use crate::sink::EventSink;
use crate::stability::StabilityTracker;
use crate::supervisor::{LinkSupervisor, Poll};
use crate::util::ms;
use scalebridge_traits::LinkOpener;
use scalebridge_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How reading should be orchestrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Read inside the pipeline loop
    Direct,
    /// Read on a dedicated thread, chunks delivered FIFO over a channel
    #[default]
    Threaded,
}

/// Counters for one `run`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: u64,
    pub frames: u64,
    pub events: u64,
}

pub struct ReadingPipeline<C: Clock = MonotonicClock> {
    cfg: PipelineCfg,
    tracker: StabilityTracker<C>,
    prices: PriceTable,
    sinks: Vec<Box<dyn EventSink>>,
    summary: RunSummary,
}

impl ReadingPipeline<MonotonicClock> {
    pub fn new(cfg: PipelineCfg, stability: StabilityCfg, prices: PriceTable) -> Self {
        Self::with_tracker(cfg, StabilityTracker::new(stability), prices)
    }
}

impl<C: Clock> ReadingPipeline<C> {
    /// Build around an existing tracker (one tracker per link).
    pub fn with_tracker(cfg: PipelineCfg, tracker: StabilityTracker<C>, prices: PriceTable) -> Self {
        Self {
            cfg,
            tracker,
            prices,
            sinks: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn tracker(&self) -> &StabilityTracker<C> {
        &self.tracker
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Decode one chunk and push it through the tracker.
    pub fn process_chunk(&mut self, bytes: &[u8]) -> Option<WeighEvent> {
        self.summary.chunks += 1;
        let frame = decode_priced(bytes, &self.prices)?;
        self.process_frame(&frame)
    }

    /// Feed one decoded frame; returns the event if this frame settled a weighing.
    pub fn process_frame(&mut self, frame: &RawFrame) -> Option<WeighEvent> {
        self.summary.frames += 1;
        let settled = self.tracker.ingest(frame.weight_kg)?;

        let unit_price = self.prices.resolve(&frame.product_code, frame.unit_price);
        let event = WeighEvent::new(
            frame.product_code.clone(),
            settled.weight_kg,
            unit_price,
            chrono::Utc::now(),
        );
        tracing::info!(
            product = event.product_code(),
            weight_kg = event.weight_kg(),
            unit_price = event.unit_price(),
            total_price = event.total_price(),
            "weighing settled"
        );

        self.dispatch(&event);
        self.summary.events += 1;
        Some(event)
    }

    fn dispatch(&self, event: &WeighEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(event) {
                tracing::warn!(sink = sink.name(), error = %e, "sink delivery failed");
            }
        }
    }

    /// Run until `shutdown` is raised or `max_events` events were emitted.
    ///
    /// Never fails: link problems are retried by the supervisor and sink
    /// problems are logged. Shutdown takes effect within one read timeout.
    pub fn run<O, K>(
        &mut self,
        supervisor: LinkSupervisor<O, K>,
        mode: ReadMode,
        shutdown: Arc<AtomicBool>,
        max_events: Option<u64>,
    ) -> RunSummary
    where
        O: LinkOpener + Send + 'static,
        O::Link: Send + 'static,
        K: Clock + Send + 'static,
    {
        let start = self.summary;
        tracing::info!(?mode, "reading pipeline start");
        match mode {
            ReadMode::Direct => self.run_direct(supervisor, &shutdown, max_events),
            ReadMode::Threaded => self.run_threaded(supervisor, &shutdown, max_events),
        }
        let done = RunSummary {
            chunks: self.summary.chunks - start.chunks,
            frames: self.summary.frames - start.frames,
            events: self.summary.events - start.events,
        };
        tracing::info!(
            chunks = done.chunks,
            frames = done.frames,
            events = done.events,
            "reading pipeline stopped"
        );
        done
    }

    fn limit_reached(&self, start_events: u64, max_events: Option<u64>) -> bool {
        max_events.is_some_and(|max| self.summary.events - start_events >= max)
    }

    fn run_direct<O: LinkOpener, K: Clock>(
        &mut self,
        mut supervisor: LinkSupervisor<O, K>,
        shutdown: &AtomicBool,
        max_events: Option<u64>,
    ) {
        let idle = ms(self.cfg.idle_ms);
        let start_events = self.summary.events;
        while !shutdown.load(Ordering::Relaxed) && !self.limit_reached(start_events, max_events) {
            match supervisor.poll() {
                Poll::Chunk(bytes) => {
                    let _ = self.process_chunk(&bytes);
                }
                Poll::NoData | Poll::ReadFailed => supervisor.pause(idle),
                Poll::ConnectFailed { .. } => {}
            }
        }
        supervisor.close();
    }

    fn run_threaded<O, K>(
        &mut self,
        supervisor: LinkSupervisor<O, K>,
        shutdown: &AtomicBool,
        max_events: Option<u64>,
    ) where
        O: LinkOpener + Send + 'static,
        O::Link: Send + 'static,
        K: Clock + Send + 'static,
    {
        let idle = ms(self.cfg.idle_ms.max(1));
        let start_events = self.summary.events;
        let reader = LinkReader::spawn(supervisor, self.cfg.channel_depth, idle);
        while !shutdown.load(Ordering::Relaxed) && !self.limit_reached(start_events, max_events) {
            match reader.recv_timeout(idle) {
                Some(bytes) => {
                    let _ = self.process_chunk(&bytes);
                }
                None if reader.is_exhausted() => break,
                None => {}
            }
        }
        // joins the reader thread
        drop(reader);
    }
}
