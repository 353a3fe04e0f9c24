//! Logging setup for processes embedding the pickers.
//!
//! Pickers only emit `tracing` events; installing a subscriber is up to the
//! host. `init_logging` is a ready-made one.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{
    fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DEFAULT_LOG_TARGET: &str = "sgl_picker";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub json_format: bool,
    pub log_dir: Option<String>,
    pub colorize: bool,
    pub log_file_name: String,
    pub log_targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_dir: None,
            colorize: true,
            log_file_name: "sgl-picker".to_string(),
            log_targets: vec![DEFAULT_LOG_TARGET.to_string()],
        }
    }
}

/// Keeps the non-blocking file writer alive; drop it to flush.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// `target=level` directives for every target, defaulting to this crate
fn filter_directives(targets: &[String], level: Level) -> String {
    let level = level.as_str().to_lowercase();
    if targets.is_empty() {
        return format!("{}={}", DEFAULT_LOG_TARGET, level);
    }
    targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn init_logging(config: LoggingConfig) -> LogGuard {
    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.log_targets, config.level)));

    let mut layers = Vec::with_capacity(2);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.colorize)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::new(TIME_FORMAT.to_string()));

    layers.push(if config.json_format {
        stdout_layer.json().flatten_event(true).boxed()
    } else {
        stdout_layer.boxed()
    });

    let mut file_guard = None;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = PathBuf::from(log_dir);

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create log directory {}: {}", log_dir.display(), e);
        } else {
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, log_dir, &config.log_file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guard = Some(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::new(TIME_FORMAT.to_string()))
                .with_writer(non_blocking);

            layers.push(if config.json_format {
                file_layer.json().flatten_event(true).boxed()
            } else {
                file_layer.boxed()
            });
        }
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
