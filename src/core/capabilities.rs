//! Read-only runtime facts about the attached console.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

use crate::config::EnvConfig;

static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);
static DETECTED: OnceCell<DeviceCapabilities> = OnceCell::new();

const DUMB_TERMS: [&str; 2] = ["dumb", "unknown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Output is non-interactive: redirected, forced dumb, or a dumb `TERM`.
    pub is_dumb: bool,
    pub stdin_is_tty: bool,
    pub stdout_is_tty: bool,
}

impl DeviceCapabilities {
    pub fn detect(config: &EnvConfig) -> Self {
        let stdin_is_tty = std::io::stdin().is_terminal();
        let stdout_is_tty = std::io::stdout().is_terminal();
        Self::from_parts(config, stdin_is_tty, stdout_is_tty)
    }

    /// Detection result of the first call; later calls reuse it.
    pub fn cached(config: &EnvConfig) -> Self {
        *DETECTED.get_or_init(|| {
            let detected = Self::detect(config);
            tracing::debug!(
                is_dumb = detected.is_dumb,
                stdin_is_tty = detected.stdin_is_tty,
                stdout_is_tty = detected.stdout_is_tty,
                "console capabilities detected"
            );
            detected
        })
    }

    pub(crate) fn from_parts(config: &EnvConfig, stdin_is_tty: bool, stdout_is_tty: bool) -> Self {
        let dumb_term = match config.term.as_deref() {
            None => true,
            Some(term) => DUMB_TERMS.contains(&term.trim().to_ascii_lowercase().as_str()),
        };
        Self {
            is_dumb: config.force_dumb || dumb_term || !stdout_is_tty,
            stdin_is_tty,
            stdout_is_tty,
        }
    }
}

/// Whether some port currently holds the terminal in raw mode.
pub fn is_raw_mode() -> bool {
    RAW_MODE_ACTIVE.load(Ordering::SeqCst)
}

pub(crate) fn set_raw_mode(active: bool) {
    RAW_MODE_ACTIVE.store(active, Ordering::SeqCst);
}
