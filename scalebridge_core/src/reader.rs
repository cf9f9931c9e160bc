//! Background link reading.
//!
//! Spawns a thread that owns the `LinkSupervisor` and forwards every chunk,
//! in arrival order, over a bounded channel. The thread blocks (in slices)
//! when the channel is full rather than dropping chunks: losing or
//! reordering samples would corrupt the stability window.
//!
//! Safety: Each `LinkReader` spawns exactly one thread that is shut down
//! when the `LinkReader` is dropped. Dropping raises the supervisor's stop
//! flag; the thread exits after its current bounded read.
use crate::supervisor::{LinkSupervisor, Poll};
use crossbeam_channel as xch;
use scalebridge_traits::LinkOpener;
use scalebridge_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const SEND_SLICE: Duration = Duration::from_millis(100);

pub struct LinkReader {
    rx: xch::Receiver<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl LinkReader {
    /// Move `supervisor` onto a reader thread.
    ///
    /// `idle` is the pause after a read cycle that returned nothing.
    pub fn spawn<O, C>(mut supervisor: LinkSupervisor<O, C>, depth: usize, idle: Duration) -> Self
    where
        O: LinkOpener + Send + 'static,
        O::Link: Send + 'static,
        C: Clock + Send + 'static,
    {
        let (tx, rx) = xch::bounded(depth.max(1));
        let shutdown = supervisor.stop_handle();
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            'outer: while let Some(poll) = supervisor.next() {
                match poll {
                    Poll::Chunk(bytes) => {
                        let mut item = bytes;
                        loop {
                            match tx.send_timeout(item, SEND_SLICE) {
                                Ok(()) => break,
                                Err(xch::SendTimeoutError::Timeout(back)) => {
                                    if shutdown_clone.load(Ordering::Relaxed) {
                                        break 'outer;
                                    }
                                    item = back;
                                }
                                Err(xch::SendTimeoutError::Disconnected(_)) => {
                                    tracing::debug!("reader consumer disconnected, exiting thread");
                                    break 'outer;
                                }
                            }
                        }
                    }
                    Poll::NoData | Poll::ReadFailed => supervisor.pause(idle),
                    Poll::ConnectFailed { .. } => {}
                }
            }
            supervisor.close();
            tracing::trace!("reader thread exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Next chunk in arrival order, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// True once the reader thread has exited and every chunk was consumed.
    pub fn is_exhausted(&self) -> bool {
        let finished = self
            .join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished);
        finished && self.rx.is_empty()
    }
}

impl Drop for LinkReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits:
        // 1. immediately if it is between polls or backing off (sliced sleep)
        // 2. after the current read returns (bounded by the link timeout)
        // 3. within one send slice if it is blocked on a full channel
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("reader thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "reader thread panicked during shutdown");
                }
            }
        }
    }
}
