//! Append-only transaction log: one JSON `WeighEvent` per line.

use crate::error::BridgeError;
use crate::event::WeighEvent;
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single line; the file is created on first use.
    pub fn append(&self, event: &WeighEvent) -> Result<(), BridgeError> {
        let mut line = event.to_json()?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // single write per record; readers skip torn lines
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// The last `count` events, oldest first. A missing file is an empty log.
    pub fn recent(&self, count: usize) -> Result<Vec<WeighEvent>, BridgeError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut buf = Vec::with_capacity(256);
        let mut tail: VecDeque<WeighEvent> = VecDeque::with_capacity(count.min(1024));
        let mut idx = 0usize;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            idx += 1;
            let trimmed = buf.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            // invalid UTF-8 lands in the skip arm like any torn record
            match serde_json::from_slice::<WeighEvent>(trimmed) {
                Ok(ev) => {
                    if tail.len() == count {
                        tail.pop_front();
                    }
                    tail.push_back(ev);
                }
                Err(e) => {
                    tracing::warn!(line = idx, error = %e, "skipping unreadable audit record");
                }
            }
        }
        Ok(tail.into())
    }
}
