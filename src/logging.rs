//! 日志：按天滚动写入应用日志目录
//!
//! 过滤规则取 `RUST_LOG`，缺省为 `grepnav=info`。日志目录不可用时退到临时目录。

use grepnav::kernel::services::adapters::ensure_log_dir;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "grepnav.log";
const DEFAULT_FILTER: &str = "grepnav=info";

/// Keeps the background writer alive; dropping it flushes pending records.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

fn resolve_log_dir() -> Option<PathBuf> {
    match ensure_log_dir() {
        Ok(dir) => Some(dir),
        Err(e) => {
            let fallback = std::env::temp_dir().join("grepnav").join("logs");
            std::fs::create_dir_all(&fallback).ok()?;
            eprintln!(
                "grepnav: log dir unavailable ({e}), using {}",
                fallback.display()
            );
            Some(fallback)
        }
    }
}

/// Returns `None` when no directory is writable or a subscriber is already set.
pub fn init() -> Option<LoggingGuard> {
    let log_dir = resolve_log_dir()?;
    let (writer, worker) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok()?;

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
    tracing::info!(log_dir = %log_dir.display(), "logging initialized");

    Some(LoggingGuard {
        _worker: worker,
        log_dir,
    })
}
