use std::io::{BufRead, ErrorKind};
use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Longest line kept before it is handed on unterminated.
pub const MAX_LINE: usize = 256;

/// Read one `\n`-terminated line from a reader with a read timeout.
///
/// Bytes received before a timeout stay in `pending`, so a frame split
/// across two timeouts is still delivered whole. Returns `Ok(None)` when the
/// timeout elapsed without completing a line, or when `budget` ran out while
/// bytes kept trickling in; the call as a whole never outlives `budget` by
/// more than one underlying read. A line longer than `max_len` is returned
/// as-is so a device that never sends a newline cannot grow the buffer
/// forever.
pub fn read_line_with_timeout(
    reader: &mut impl BufRead,
    pending: &mut Vec<u8>,
    max_len: usize,
    budget: Duration,
) -> Result<Option<Vec<u8>>> {
    let deadline = Instant::now() + budget;
    loop {
        let (done, used) = {
            let buf = match reader.fill_buf() {
                Ok(b) => b,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(None);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HwError::Io(e)),
            };
            if buf.is_empty() {
                return if pending.is_empty() {
                    Err(HwError::Closed)
                } else {
                    Ok(Some(std::mem::take(pending)))
                };
            }
            let room = max_len.saturating_sub(pending.len()).max(1);
            match buf.iter().take(room).position(|&b| b == b'\n') {
                Some(i) => {
                    pending.extend_from_slice(&buf[..=i]);
                    (true, i + 1)
                }
                None => {
                    let n = buf.len().min(room);
                    pending.extend_from_slice(&buf[..n]);
                    (pending.len() >= max_len, n)
                }
            }
        };
        reader.consume(used);
        if done {
            return Ok(Some(std::mem::take(pending)));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
    }
}
