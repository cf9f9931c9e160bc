//! Publish/subscribe fan-out of settled events to live listeners.
//!
//! Each listener owns a bounded queue. Publishing never blocks: a full queue
//! loses that one message for that one listener, a closed queue (receiver
//! dropped) unsubscribes the listener. Events are serialized once and shared
//! as `Arc<str>`.

use crate::error::BridgeError;
use crate::event::WeighEvent;
use crossbeam_channel as xch;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Receiving end handed to one listener.
pub struct Subscription {
    id: u64,
    rx: xch::Receiver<Arc<str>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next queued message, if any, without blocking.
    pub fn try_next(&self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    pub fn next_timeout(&self, timeout: Duration) -> Option<Arc<str>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&self) -> Vec<Arc<str>> {
        self.rx.try_iter().collect()
    }
}

/// Per-publish delivery counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Listeners whose queue was full.
    pub dropped: usize,
    /// Listeners found disconnected and removed.
    pub removed: usize,
}

pub struct BroadcastHub {
    queue_depth: usize,
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, xch::Sender<Arc<str>>>>,
}

impl BroadcastHub {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            queue_depth: queue_depth.max(1),
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<u64, xch::Sender<Arc<str>>>> {
        match self.listeners.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = xch::bounded(self.queue_depth);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let total = {
            let mut map = self.guard();
            map.insert(id, tx);
            map.len()
        };
        tracing::info!(listener = id, total, "listener subscribed");
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        let (removed, remaining) = {
            let mut map = self.guard();
            (map.remove(&id).is_some(), map.len())
        };
        if removed {
            tracing::info!(listener = id, remaining, "listener unsubscribed");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.guard().len()
    }

    /// Serialize once and offer to every listener.
    pub fn publish(&self, event: &WeighEvent) -> Result<Delivery, BridgeError> {
        let msg: Arc<str> = Arc::from(event.to_json()?);
        Ok(self.publish_raw(msg))
    }

    /// Offer a pre-serialized message to every listener.
    pub fn publish_raw(&self, msg: Arc<str>) -> Delivery {
        let mut out = Delivery::default();
        let mut map = self.guard();
        map.retain(|id, tx| match tx.try_send(msg.clone()) {
            Ok(()) => {
                out.delivered += 1;
                true
            }
            Err(xch::TrySendError::Full(_)) => {
                out.dropped += 1;
                tracing::warn!(listener = *id, "listener queue full; message dropped");
                true
            }
            Err(xch::TrySendError::Disconnected(_)) => {
                out.removed += 1;
                false
            }
        });
        if out.removed > 0 {
            tracing::debug!(removed = out.removed, "removed disconnected listeners");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let hub = BroadcastHub::new(4);
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_ne!(a.id(), b.id());
        assert_eq!(hub.listener_count(), 2);
        hub.unsubscribe(a.id());
        assert_eq!(hub.listener_count(), 1);
    }

    #[test]
    fn publish_with_no_listeners_is_a_no_op() {
        let hub = BroadcastHub::new(4);
        assert_eq!(hub.publish_raw(Arc::from("x")), Delivery::default());
    }
}
