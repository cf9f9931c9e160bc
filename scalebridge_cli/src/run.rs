//! `run`: assemble link, pipeline, sinks and transport from the config.

use crate::ws::WsServer;
use scalebridge_config::{Config, Parity};
use scalebridge_core::{
    AuditLog, BackoffCfg, BroadcastHub, LinkSupervisor, PipelineCfg, PriceTable,
    ReadMode, ReadingPipeline, RunSummary, StabilityCfg,
};
use scalebridge_hardware::{SerialParity, SerialSettings, SimulatedScale};
use scalebridge_traits::LinkOpener;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

pub struct RunOptions {
    pub simulate: bool,
    pub direct: bool,
    pub max_events: Option<u64>,
    pub websocket: bool,
    pub sim_interval: Duration,
}

#[cfg_attr(not(feature = "hardware"), allow(dead_code))]
pub fn serial_settings(cfg: &scalebridge_config::Serial) -> SerialSettings {
    SerialSettings {
        port: cfg.port.clone(),
        baud_rate: cfg.baud_rate,
        data_bits: cfg.data_bits,
        parity: match cfg.parity {
            Parity::None => SerialParity::None,
            Parity::Even => SerialParity::Even,
            Parity::Odd => SerialParity::Odd,
        },
        stop_bits: cfg.stop_bits,
        timeout: Duration::from_millis(cfg.timeout_ms),
    }
}

fn banner(cfg: &Config, opts: &RunOptions, ws: Option<&WsServer>, prices: &PriceTable) {
    let source = if opts.simulate {
        String::from("simulated")
    } else {
        cfg.serial.port.clone()
    };
    tracing::info!(
        source = %source,
        baud = cfg.serial.baud_rate,
        websocket = %ws.map_or_else(|| String::from("disabled"), |s| format!("ws://{}", s.local_addr())),
        prices = prices.len(),
        audit = %cfg.audit.file,
        "scale bridge starting"
    );
    #[cfg(feature = "hardware")]
    if !opts.simulate {
        match scalebridge_hardware::available_ports() {
            Ok(ports) => tracing::info!(?ports, "available serial ports"),
            Err(e) => tracing::warn!(error = %e, "cannot list serial ports"),
        }
    }
}

fn drive<O>(
    pipeline: &mut ReadingPipeline,
    opener: O,
    cfg: &Config,
    opts: &RunOptions,
    shutdown: Arc<AtomicBool>,
) -> RunSummary
where
    O: LinkOpener + Send + 'static,
    O::Link: Send + 'static,
{
    let backoff: BackoffCfg = (&cfg.link).into();
    let supervisor = LinkSupervisor::new(opener, &backoff, shutdown.clone());
    let mode = if opts.direct {
        ReadMode::Direct
    } else {
        ReadMode::Threaded
    };
    pipeline.run(supervisor, mode, shutdown, opts.max_events)
}

pub fn run(cfg: &Config, opts: &RunOptions, shutdown: Arc<AtomicBool>) -> eyre::Result<RunSummary> {
    let prices = PriceTable::from(cfg);
    let hub = Arc::new(BroadcastHub::new(cfg.websocket.queue_depth));
    let audit = Arc::new(AuditLog::new(&cfg.audit.file));

    let ws = if opts.websocket && cfg.websocket.enabled {
        let bind = format!("{}:{}", cfg.websocket.host, cfg.websocket.port);
        Some(WsServer::start(&bind, hub.clone(), shutdown.clone())?)
    } else {
        None
    };
    banner(cfg, opts, ws.as_ref(), &prices);

    let pipeline_cfg: PipelineCfg = (&cfg.link).into();
    let stability: StabilityCfg = (&cfg.scale).into();
    let mut pipeline = ReadingPipeline::new(pipeline_cfg, stability, prices)
        .with_sink(audit)
        .with_sink(hub);

    let summary = if opts.simulate {
        drive(
            &mut pipeline,
            SimulatedScale::new(opts.sim_interval),
            cfg,
            opts,
            shutdown,
        )
    } else {
        open_serial(&mut pipeline, cfg, opts, shutdown)?
    };

    // joins every listener thread
    drop(ws);
    tracing::info!(events = summary.events, "scale bridge stopped");
    Ok(summary)
}

#[cfg(feature = "hardware")]
fn open_serial(
    pipeline: &mut ReadingPipeline,
    cfg: &Config,
    opts: &RunOptions,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let opener = scalebridge_hardware::SerialOpener::new(serial_settings(&cfg.serial));
    Ok(drive(pipeline, opener, cfg, opts, shutdown))
}

#[cfg(not(feature = "hardware"))]
fn open_serial(
    _pipeline: &mut ReadingPipeline,
    _cfg: &Config,
    _opts: &RunOptions,
    _shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    Err(scalebridge_core::BridgeError::Config(
        "serial support not built in; rebuild with --features hardware or pass --simulate".into(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_settings_follow_config() {
        let mut cfg = scalebridge_config::Serial::default();
        cfg.port = "COM3".into();
        cfg.parity = Parity::Even;
        cfg.timeout_ms = 250;
        let s = serial_settings(&cfg);
        assert_eq!(s.port, "COM3");
        assert_eq!(s.parity, SerialParity::Even);
        assert_eq!(s.timeout, Duration::from_millis(250));
        assert_eq!(s.baud_rate, 9600);
    }
}
