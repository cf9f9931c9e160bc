mod cli;
mod error_fmt;
mod logging;
mod run;
mod ws;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use scalebridge_config::Config;
use scalebridge_core::{AuditLog, BridgeError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn strict_config(cli: &Cli) -> eyre::Result<Config> {
    scalebridge_config::load_file(&cli.config)
        .map_err(|e| BridgeError::Config(format!("{e:#}")).into())
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // self-check must see config problems; everything else degrades to defaults
    let loaded = strict_config(&cli);
    let cfg_for_logging = loaded.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    logging::init(cli.json, cli.log_level.as_deref(), &cfg_for_logging);

    match cli.cmd {
        Commands::SelfCheck => self_check(&loaded?, cli.json),
        Commands::Recent { count } => {
            let cfg = loaded.unwrap_or_else(|e| fallback(&e));
            recent(&cfg, count)
        }
        Commands::Ports => ports(),
        Commands::Run {
            simulate,
            direct,
            max_events,
            no_websocket,
            sim_interval_ms,
        } => {
            let cfg = loaded.unwrap_or_else(|e| fallback(&e));
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || {
                    flag.store(true, Ordering::Relaxed);
                })
                .wrap_err("install signal handler")?;
            }
            let opts = run::RunOptions {
                simulate,
                direct,
                max_events,
                websocket: !no_websocket,
                sim_interval: Duration::from_millis(sim_interval_ms),
            };
            let summary = run::run(&cfg, &opts, shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "chunks": summary.chunks,
                        "frames": summary.frames,
                        "events": summary.events,
                    })
                );
            } else {
                println!(
                    "Stopped after {} weighings ({} frames decoded).",
                    summary.events, summary.frames
                );
            }
            Ok(())
        }
    }
}

fn fallback(e: &eyre::Report) -> Config {
    tracing::warn!(error = %e, "config unavailable; using built-in defaults");
    Config::default()
}

fn recent(cfg: &Config, count: usize) -> eyre::Result<()> {
    let log = AuditLog::new(&cfg.audit.file);
    for ev in log.recent(count)? {
        println!("{}", ev.to_json().map_err(BridgeError::from)?);
    }
    Ok(())
}

fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let s = &cfg.serial;
    let ws = &cfg.websocket;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "serial": {
                    "port": s.port,
                    "baud_rate": s.baud_rate,
                    "data_bits": s.data_bits,
                    "parity": format!("{:?}", s.parity),
                    "stop_bits": s.stop_bits,
                    "timeout_ms": s.timeout_ms,
                },
                "websocket": {
                    "enabled": ws.enabled,
                    "address": format!("{}:{}", ws.host, ws.port),
                },
                "scale": {
                    "stability_threshold_kg": cfg.scale.stability_threshold_kg,
                    "stability_readings": cfg.scale.stability_readings,
                    "duplicate_timeout_ms": cfg.scale.duplicate_timeout_ms,
                },
                "audit_file": cfg.audit.file,
                "plu_prices": cfg.plu_prices,
            })
        );
    } else {
        println!("config ok");
        println!(
            "serial: {} @ {} baud, {} data bits, parity {:?}, {} stop bits, timeout {} ms",
            s.port, s.baud_rate, s.data_bits, s.parity, s.stop_bits, s.timeout_ms
        );
        if ws.enabled {
            println!("websocket: ws://{}:{}", ws.host, ws.port);
        } else {
            println!("websocket: disabled");
        }
        println!(
            "stability: {} readings within {} kg, duplicates suppressed for {} ms",
            cfg.scale.stability_readings,
            cfg.scale.stability_threshold_kg,
            cfg.scale.duplicate_timeout_ms
        );
        println!("audit: {}", cfg.audit.file);
        println!("prices: {} products", cfg.plu_prices.len());
    }
    Ok(())
}

#[cfg(feature = "hardware")]
fn ports() -> eyre::Result<()> {
    let ports = scalebridge_hardware::available_ports()
        .map_err(|e| BridgeError::Link(e.to_string()))?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for p in ports {
        println!("{p}");
    }
    Ok(())
}

#[cfg(not(feature = "hardware"))]
fn ports() -> eyre::Result<()> {
    Err(BridgeError::Config(
        "serial support not built in; rebuild with --features hardware".into(),
    )
    .into())
}
