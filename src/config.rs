//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_RESIZE_DELAY_MS: u64 = 35;
const DEFAULT_RESIZE_POLL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Treat the live terminal as dumb even when it is a TTY.
    pub force_dumb: bool,
    /// Every live write is also appended here.
    pub write_log: Option<PathBuf>,
    pub debug_log: Option<PathBuf>,
    pub log_filter: Option<String>,
    /// Settle time after an emitted resize request.
    pub resize_delay: Duration,
    pub resize_poll: Duration,
    pub term: Option<String>,
    /// Running inside a tmux session, whose status bars take window rows.
    pub in_tmux: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            force_dumb: false,
            write_log: None,
            debug_log: None,
            log_filter: None,
            resize_delay: Duration::from_millis(DEFAULT_RESIZE_DELAY_MS),
            resize_poll: Duration::from_millis(DEFAULT_RESIZE_POLL_MS),
            term: None,
            in_tmux: false,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            force_dumb: env_flag("CONSOLE_VT_FORCE_DUMB"),
            write_log: env_string_opt("CONSOLE_VT_WRITE_LOG").map(PathBuf::from),
            debug_log: env_string_opt("CONSOLE_VT_DEBUG_LOG").map(PathBuf::from),
            log_filter: env_string_opt("CONSOLE_VT_LOG"),
            resize_delay: env_millis("CONSOLE_VT_RESIZE_DELAY_MS", DEFAULT_RESIZE_DELAY_MS),
            resize_poll: env_millis("CONSOLE_VT_RESIZE_POLL_MS", DEFAULT_RESIZE_POLL_MS),
            term: env_string_opt("TERM"),
            in_tmux: env_string_opt("TMUX").is_some(),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Unparseable values fall back to the default.
fn env_millis(key: &str, default: u64) -> Duration {
    let millis = env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_millis(millis)
}
