//! File logging through `tracing`.
//!
//! The terminal belongs to the TUI, so every record goes to a daily
//! rotating file under the local data directory:
//! - Linux: `~/.local/share/lazyredmine/logs/`
//! - macOS: `~/Library/Application Support/lazyredmine/logs/`
//! - Windows: `%LOCALAPPDATA%\lazyredmine\logs\`

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const LOG_FILE_PREFIX: &str = "lazyredmine.log";

/// Directives used when `RUST_LOG` is unset.
fn default_directives(debug_flag: bool) -> &'static str {
    if debug_flag {
        "lazyredmine=debug,warn"
    } else {
        "lazyredmine=info,warn"
    }
}

/// Where log files are written, if the platform has a local data dir.
pub fn log_directory() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join("lazyredmine").join("logs"))
}

/// Install the global subscriber. `RUST_LOG` overrides `debug_flag`.
pub fn init(debug_flag: bool) -> anyhow::Result<()> {
    let dir = log_directory().context("could not determine the local data directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug_flag)));
    let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .context("tracing subscriber already installed")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %dir.display(),
        debug_enabled = debug_flag,
        "lazyredmine starting"
    );
    Ok(())
}

pub fn shutdown() {
    tracing::info!("lazyredmine shutting down");
}
