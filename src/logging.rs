/*!
 * Logging for the presence daemon
 *
 * `run` prints the status and payload stream on stdout, so diagnostics go to
 * stderr there. With a log file configured they are appended as JSON lines,
 * one object per event, carrying the `session` span of the presence task.
 */

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::PresenceConfig;
use crate::error::{PresenceError, Result};

/// Crate target used in the default filter
const LOG_TARGET: &str = "cosmos_presence";

/// Resolve the effective level: `verbose` wins over the configured level
pub fn effective_level(config: &PresenceConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(config: &PresenceConfig) -> String {
    format!("{}={}", LOG_TARGET, effective_level(config))
}

/// Initialize structured logging based on configuration
pub fn init_logging(config: &PresenceConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(config)))
        .map_err(|e| PresenceError::Config(format!("Failed to create log filter: {}", e)))?;

    match config.log_file {
        Some(ref log_path) => {
            let file = open_log_file(log_path)?;
            let json_layer = fmt::layer()
                .json()
                .with_writer(file)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .init();
        }
        None => {
            let stderr_layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
        }
    }

    Ok(())
}

/// Append to the log so restarts of the daemon keep earlier history
fn open_log_file(log_path: &Path) -> Result<File> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| PresenceError::Config(format!("Failed to open log file: {}", e)))
}

/// Test subscriber writing through the test harness
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}=debug", LOG_TARGET)));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}
