//! Logging setup.
//!
//! Logs always go to stderr. When a log directory is configured they are also
//! written to a daily rolling file there.

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Log level can be controlled via the `HIC_LOG` environment variable
/// (`HIC_LOG=debug`, `HIC_LOG=hic=trace,tower_http=debug`, ...). Without it
/// the level is `info`, or `debug` when `debug` is set.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_env("HIC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "hic.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop, so it has to live as long as the process
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    match log_dir {
        Some(dir) => tracing::info!("Logging initialized, also writing to {:?}", dir),
        None => tracing::debug!("Logging initialized"),
    }
    Ok(())
}
