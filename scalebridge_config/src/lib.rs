#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the scale bridge.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; missing sections and keys take the
//!   built-in defaults, so a partial file overlays the defaults.
//! - `[plu_prices]` entries are merged over the default price list rather
//!   than replacing it.
use serde::Deserialize;
use serde::de::Deserializer;
use std::collections::BTreeMap;
use std::path::Path;

/// Serial line parity. Written as "N", "E" or "O" in TOML.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    #[serde(rename = "N", alias = "none", alias = "n")]
    None,
    #[serde(rename = "E", alias = "even", alias = "e")]
    Even,
    #[serde(rename = "O", alias = "odd", alias = "o")]
    Odd,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Serial {
    /// Device path, e.g. "/dev/ttyUSB0" or "COM3".
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Upper bound for a single blocking read.
    pub timeout_ms: u64,
}

impl Default for Serial {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyUSB0"),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Websocket {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Messages buffered per listener before that listener starts losing events.
    pub queue_depth: usize,
}

impl Default for Websocket {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::from("127.0.0.1"),
            port: 8765,
            queue_depth: 64,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScaleCfg {
    /// Max spread (kg) across the stability window.
    pub stability_threshold_kg: f64,
    /// Consecutive readings that must agree before a weight is final.
    pub stability_readings: usize,
    /// Window during which an equal weight is treated as the same placement.
    pub duplicate_timeout_ms: u64,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            stability_threshold_kg: 0.01,
            stability_readings: 3,
            duplicate_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LinkCfg {
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    /// Pause after a read cycle that produced nothing.
    pub idle_ms: u64,
    /// Chunks buffered between the reader thread and the pipeline.
    pub channel_depth: usize,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            backoff_initial_ms: 1000,
            backoff_max_ms: 30_000,
            idle_ms: 100,
            channel_depth: 256,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Audit {
    /// JSON-lines transaction log.
    pub file: String,
}

impl Default for Audit {
    fn default() -> Self {
        Self {
            file: String::from("transactions.log"),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub serial: Serial,
    pub websocket: Websocket,
    pub scale: ScaleCfg,
    pub link: LinkCfg,
    pub audit: Audit,
    pub logging: Logging,
    /// Product code -> unit price.
    #[serde(deserialize_with = "de_prices_over_defaults")]
    pub plu_prices: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: Serial::default(),
            websocket: Websocket::default(),
            scale: ScaleCfg::default(),
            link: LinkCfg::default(),
            audit: Audit::default(),
            logging: Logging::default(),
            plu_prices: default_prices(),
        }
    }
}

/// Price list shipped with the bridge; entries in `[plu_prices]` override
/// or extend it.
pub fn default_prices() -> BTreeMap<String, f64> {
    [
        ("0001", 850.00),
        ("0002", 1200.00),
        ("0003", 650.00),
        ("0004", 480.00),
        ("0005", 950.00),
    ]
    .into_iter()
    .map(|(code, price)| (code.to_string(), price))
    .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceToml {
    Float(f64),
    Int(i64),
}

fn de_prices_over_defaults<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let given: BTreeMap<String, PriceToml> = BTreeMap::deserialize(deserializer)?;
    let mut out = default_prices();
    for (code, price) in given {
        let v = match price {
            PriceToml::Float(f) => f,
            PriceToml::Int(i) => i as f64,
        };
        out.insert(code, v);
    }
    Ok(out)
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.port.trim().is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.serial.baud_rate == 0 {
            eyre::bail!("serial.baud_rate must be > 0");
        }
        if !(5..=8).contains(&self.serial.data_bits) {
            eyre::bail!("serial.data_bits must be in 5..=8");
        }
        if !(1..=2).contains(&self.serial.stop_bits) {
            eyre::bail!("serial.stop_bits must be 1 or 2");
        }
        if self.serial.timeout_ms == 0 {
            eyre::bail!("serial.timeout_ms must be >= 1");
        }

        // Websocket
        if self.websocket.host.trim().is_empty() {
            eyre::bail!("websocket.host must not be empty");
        }
        if self.websocket.queue_depth == 0 {
            eyre::bail!("websocket.queue_depth must be >= 1");
        }

        // Scale
        let thr = self.scale.stability_threshold_kg;
        if !thr.is_finite() || thr < 0.0 {
            eyre::bail!("scale.stability_threshold_kg must be a finite value >= 0.0");
        }
        if !(1..=10).contains(&self.scale.stability_readings) {
            eyre::bail!("scale.stability_readings must be in 1..=10");
        }
        if self.scale.duplicate_timeout_ms > 60 * 60 * 1000 {
            eyre::bail!("scale.duplicate_timeout_ms is unreasonably large (>1h)");
        }

        // Link
        if self.link.backoff_initial_ms == 0 {
            eyre::bail!("link.backoff_initial_ms must be >= 1");
        }
        if self.link.backoff_initial_ms > self.link.backoff_max_ms {
            eyre::bail!("link.backoff_initial_ms must be <= link.backoff_max_ms");
        }
        if self.link.channel_depth == 0 {
            eyre::bail!("link.channel_depth must be >= 1");
        }

        // Audit
        if self.audit.file.trim().is_empty() {
            eyre::bail!("audit.file must not be empty");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Prices
        for (code, price) in &self.plu_prices {
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                eyre::bail!("plu_prices key {code:?} must be a numeric product code");
            }
            if !price.is_finite() || *price < 0.0 {
                eyre::bail!("plu_prices.{code} must be a finite value >= 0.0");
            }
        }

        Ok(())
    }
}
