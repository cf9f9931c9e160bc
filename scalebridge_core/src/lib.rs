#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core scale-reading pipeline (hardware-agnostic).
//!
//! All device access goes through `scalebridge_traits::LinkOpener` and
//! `scalebridge_traits::ScaleLink`; all timing through `Clock`.
//!
//! ## Architecture
//!
//! - **Decoding**: multi-format frame matcher (`frame`)
//! - **Filtering**: stability window and duplicate cooldown (`stability`)
//! - **Link**: reconnect-with-backoff state machine (`supervisor`) and its
//!   background thread (`reader`)
//! - **Orchestration**: pricing and dispatch to sinks (`pipeline`)
//! - **Sinks**: JSON-lines audit log (`audit`), listener fan-out (`broadcast`)
//!
//! Data flows one way: supervisor → decoder → tracker → pipeline → sinks.

pub mod audit;
pub mod broadcast;
pub mod config;
pub mod control;
pub mod conversions;
pub mod error;
pub mod event;
pub mod frame;
pub mod hw_error;
pub mod mocks;
pub mod pipeline;
pub mod pricing;
pub mod reader;
pub mod sink;
pub mod stability;
pub mod supervisor;
pub mod util;

pub use audit::AuditLog;
pub use broadcast::{BroadcastHub, Delivery, Subscription};
pub use config::{BackoffCfg, PipelineCfg, StabilityCfg};
pub use error::{BridgeError, Result};
pub use event::WeighEvent;
pub use frame::{FrameFormat, RawFrame, UNKNOWN_PRODUCT, decode, decode_priced};
pub use pipeline::{ReadMode, ReadingPipeline, RunSummary};
pub use pricing::PriceTable;
pub use sink::EventSink;
pub use stability::{Settled, StabilityTracker};
pub use supervisor::{Backoff, LinkState, LinkSupervisor, Poll};
