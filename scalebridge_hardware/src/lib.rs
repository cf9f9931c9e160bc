//! Scale links: a serial-port device (feature `hardware`) and a simulator.
pub mod error;
pub mod serial;
pub mod sim;
pub mod util;

pub use serial::{SerialParity, SerialSettings};
#[cfg(feature = "hardware")]
pub use serial::{SerialLink, SerialOpener, available_ports};
pub use sim::{Placement, SimulatedLink, SimulatedScale};

#[cfg(test)]
mod tests {
    use super::*;
    use scalebridge_traits::{LinkOpener, ManualClock, ScaleLink};
    use std::time::Duration;

    #[test]
    fn simulated_scale_paces_frames() {
        let clock = ManualClock::new();
        let mut opener = SimulatedScale::with_clock(Duration::from_millis(50), clock.clone());
        let mut link = opener.open().unwrap();
        for _ in 0..4 {
            assert!(link.read().unwrap().is_some());
        }
        assert_eq!(clock.slept(), Duration::from_millis(200));
    }

    #[test]
    fn empty_script_only_times_out() {
        let mut opener = SimulatedScale::with_clock(Duration::ZERO, ManualClock::new())
            .with_placements(Vec::new());
        let mut link = opener.open().unwrap();
        assert_eq!(link.read().unwrap(), None);
    }
}
