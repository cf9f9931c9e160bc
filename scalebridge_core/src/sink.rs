//! Destinations for settled events.
//!
//! The pipeline hands every `WeighEvent` to each sink in turn. A failing sink
//! is logged and skipped; it never stops the pipeline or the other sinks.

use crate::audit::AuditLog;
use crate::broadcast::BroadcastHub;
use crate::error::BridgeError;
use crate::event::WeighEvent;
use std::sync::Arc;

pub trait EventSink: Send {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn deliver(&self, event: &WeighEvent) -> Result<(), BridgeError>;
}

impl EventSink for AuditLog {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn deliver(&self, event: &WeighEvent) -> Result<(), BridgeError> {
        self.append(event)
    }
}

impl EventSink for BroadcastHub {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn deliver(&self, event: &WeighEvent) -> Result<(), BridgeError> {
        let d = self.publish(event)?;
        tracing::debug!(
            delivered = d.delivered,
            dropped = d.dropped,
            removed = d.removed,
            "event broadcast"
        );
        Ok(())
    }
}

impl<T: EventSink + Sync + ?Sized> EventSink for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn deliver(&self, event: &WeighEvent) -> Result<(), BridgeError> {
        (**self).deliver(event)
    }
}
