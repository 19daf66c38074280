//! Debug log sink for the `tracing` events emitted across the crate.
//!
//! The crate itself only emits events. A subscriber is installed here when the `debug-log`
//! feature is enabled and `CONSOLE_VT_DEBUG_LOG` names a file; terminal output is never
//! used for logs since it would corrupt the screen.

use crate::config::EnvConfig;
use crate::error::Result;

#[cfg(feature = "debug-log")]
const DEFAULT_FILTER: &str = "debug";

/// Installs a file-backed subscriber. Returns whether one was installed.
///
/// A subscriber that is already set globally wins; this then returns `Ok(false)`.
#[cfg(feature = "debug-log")]
pub fn init_debug_log(config: &EnvConfig) -> Result<bool> {
    use std::fs::OpenOptions;
    use std::sync::Mutex;

    use tracing_subscriber::EnvFilter;

    let Some(path) = config.debug_log.as_ref() else {
        return Ok(false);
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = config
        .log_filter
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(path = %path.display(), "debug log installed");
    }
    Ok(installed)
}

#[cfg(not(feature = "debug-log"))]
pub fn init_debug_log(config: &EnvConfig) -> Result<bool> {
    let _ = config;
    Ok(false)
}
