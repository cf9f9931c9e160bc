//! Serial-port scale link.
//!
//! The device prints one frame per line. Lines are assembled across read
//! timeouts (see [`crate::util::read_line_with_timeout`]) and handed on with
//! their terminator; the decoder ignores surrounding bytes.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialParity {
    #[default]
    None,
    Even,
    Odd,
}

/// Line settings for [`SerialOpener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: SerialParity,
    pub stop_bits: u8,
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyUSB0"),
            baud_rate: 9600,
            data_bits: 8,
            parity: SerialParity::None,
            stop_bits: 1,
            timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(feature = "hardware")]
pub use device::{SerialLink, SerialOpener, available_ports};

#[cfg(feature = "hardware")]
mod device {
    use super::{SerialParity, SerialSettings};
    use crate::error::HwError;
    use crate::util::{MAX_LINE, read_line_with_timeout};
    use scalebridge_traits::{LinkOpener, ScaleLink};
    use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::BufReader;

    fn data_bits(n: u8) -> Result<DataBits, HwError> {
        match n {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(HwError::Open(format!("unsupported data bits {other}"))),
        }
    }

    fn stop_bits(n: u8) -> Result<StopBits, HwError> {
        match n {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(HwError::Open(format!("unsupported stop bits {other}"))),
        }
    }

    fn parity(p: SerialParity) -> Parity {
        match p {
            SerialParity::None => Parity::None,
            SerialParity::Even => Parity::Even,
            SerialParity::Odd => Parity::Odd,
        }
    }

    pub struct SerialOpener {
        settings: SerialSettings,
    }

    impl SerialOpener {
        pub fn new(settings: SerialSettings) -> Self {
            Self { settings }
        }

        fn open_port(&self) -> Result<Box<dyn SerialPort>, HwError> {
            let s = &self.settings;
            serialport::new(&s.port, s.baud_rate)
                .data_bits(data_bits(s.data_bits)?)
                .parity(parity(s.parity))
                .stop_bits(stop_bits(s.stop_bits)?)
                .flow_control(FlowControl::None)
                .timeout(s.timeout)
                .open()
                .map_err(|e| HwError::Open(format!("{}: {e}", s.port)))
        }
    }

    impl LinkOpener for SerialOpener {
        type Link = SerialLink;

        fn open(&mut self) -> Result<SerialLink, Box<dyn std::error::Error + Send + Sync>> {
            let port = self.open_port()?;
            tracing::debug!(
                port = %self.settings.port,
                baud = self.settings.baud_rate,
                "serial port opened"
            );
            Ok(SerialLink {
                reader: BufReader::new(port),
                pending: Vec::with_capacity(64),
                timeout: self.settings.timeout,
            })
        }

        fn endpoint(&self) -> String {
            self.settings.port.clone()
        }
    }

    pub struct SerialLink {
        reader: BufReader<Box<dyn SerialPort>>,
        pending: Vec<u8>,
        timeout: std::time::Duration,
    }

    impl ScaleLink for SerialLink {
        fn read(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(read_line_with_timeout(
                &mut self.reader,
                &mut self.pending,
                MAX_LINE,
                self.timeout,
            )?)
        }
    }

    /// Names of the serial ports the OS reports.
    pub fn available_ports() -> Result<Vec<String>, HwError> {
        let ports = serialport::available_ports()
            .map_err(|e| HwError::Io(std::io::Error::other(e.to_string())))?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}
