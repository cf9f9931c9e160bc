pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// An open byte-stream connection to a scale.
///
/// Dropping the link closes it.
pub trait ScaleLink {
    /// Read the next chunk the device produced.
    ///
    /// Blocks at most for the timeout the link was opened with.
    /// `Ok(None)` means the timeout elapsed without data.
    fn read(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Factory for [`ScaleLink`]s; called again after every link failure.
pub trait LinkOpener {
    type Link: ScaleLink;

    fn open(&mut self) -> Result<Self::Link, Box<dyn std::error::Error + Send + Sync>>;

    /// Human-readable endpoint name for logs (port path, "simulated", ...).
    fn endpoint(&self) -> String {
        String::from("scale")
    }
}
