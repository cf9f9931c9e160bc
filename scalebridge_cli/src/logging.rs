//! Subscriber setup: console (pretty or JSON) on stderr, optional rolling file.
//!
//! Level precedence: `RUST_LOG`, then `--log-level`, then `[logging].level`,
//! then `info`. stdout is left to command output.

use crate::cli::FILE_GUARD;
use scalebridge_config::Logging;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn rotation(name: Option<&str>) -> Rotation {
    match name {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

fn file_appender(file: &str, rot: Option<&str>) -> RollingFileAppender {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map_or_else(|| "scalebridge.log".into(), std::ffi::OsStr::to_os_string);
    RollingFileAppender::new(rotation(rot), dir, name)
}

pub fn init(json: bool, cli_level: Option<&str>, cfg: &Logging) {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (pretty, structured) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (
            Some(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    };

    let file_layer = cfg.file.as_deref().map(|file| {
        let (writer, guard) =
            tracing_appender::non_blocking(file_appender(file, cfg.rotation.as_deref()));
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_ansi(false).with_writer(writer)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(structured)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rotation_never_rolls() {
        assert_eq!(rotation(Some("weekly")), Rotation::NEVER);
        assert_eq!(rotation(None), Rotation::NEVER);
        assert_eq!(rotation(Some("hourly")), Rotation::HOURLY);
    }
}
