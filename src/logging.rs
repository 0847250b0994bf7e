//! Tracing subscriber setup for the binary.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::DispatchResult;

/// Builds the level filter: `RUST_LOG` when set and valid, else `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a stderr subscriber, mirrored to `log_file` without colours
/// when given.
///
/// A second call keeps the first subscriber.
///
/// # Errors
///
/// Returns an I/O error if the log file cannot be created.
pub fn init_logging(default_level: &str, log_file: Option<&Path>) -> DispatchResult<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    let initialised = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .is_ok();
    debug!(initialised, "logging configured");
    Ok(())
}
