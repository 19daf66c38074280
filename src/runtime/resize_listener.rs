//! Background watcher posting "dimensions changed" notifications.
//!
//! On Unix the watcher wakes on `SIGWINCH`; elsewhere, or when the signal cannot be
//! registered, it polls. The render loop picks up the latest change with
//! [`ResizeListener::take_change`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::EnvConfig;
use crate::core::cursor::Size;
#[cfg(unix)]
use crate::error::Result;
use crate::platform::live_terminal::stdout_window_size;
use crate::runtime::refresher::wait_interval;

#[cfg(unix)]
use signal_hook::iterator::Signals;

type Latest = Arc<Mutex<Option<Size>>>;

pub struct ResizeListener {
    latest: Latest,
    stop_flag: Arc<AtomicBool>,
    #[cfg(unix)]
    signal_handle: Option<signal_hook::iterator::Handle>,
    thread: Option<JoinHandle<()>>,
}

/// Remembers the last size seen and records only real changes.
struct ChangeTracker<F> {
    read_size: F,
    last: Option<Size>,
    latest: Latest,
}

impl<F> ChangeTracker<F>
where
    F: FnMut() -> Option<Size>,
{
    fn new(mut read_size: F, latest: Latest) -> Self {
        let last = read_size();
        Self {
            read_size,
            last,
            latest,
        }
    }

    fn check(&mut self) {
        let Some(size) = (self.read_size)() else {
            return;
        };
        if self.last == Some(size) {
            return;
        }
        tracing::debug!(%size, "console resized");
        self.last = Some(size);
        *self.latest.lock().expect("resize state lock poisoned") = Some(size);
    }
}

impl ResizeListener {
    /// Watches the terminal on stdout.
    pub fn for_stdout(config: &EnvConfig) -> Self {
        Self::start(stdout_window_size, config.resize_poll)
    }

    /// Signal-driven where available, otherwise polling every `poll_interval`.
    pub fn start<F>(read_size: F, poll_interval: Duration) -> Self
    where
        F: FnMut() -> Option<Size> + Send + 'static,
    {
        #[cfg(unix)]
        match Signals::new([libc::SIGWINCH]) {
            Ok(signals) => return Self::with_signals(signals, read_size),
            Err(err) => tracing::warn!(error = %err, "SIGWINCH unavailable, polling for resizes"),
        }
        Self::start_polling(read_size, poll_interval)
    }

    #[cfg(unix)]
    pub fn start_signal<F>(read_size: F) -> Result<Self>
    where
        F: FnMut() -> Option<Size> + Send + 'static,
    {
        let signals = Signals::new([libc::SIGWINCH])?;
        Ok(Self::with_signals(signals, read_size))
    }

    #[cfg(unix)]
    fn with_signals<F>(mut signals: Signals, read_size: F) -> Self
    where
        F: FnMut() -> Option<Size> + Send + 'static,
    {
        let handle = signals.handle();
        let latest: Latest = Arc::new(Mutex::new(None));
        let mut tracker = ChangeTracker::new(read_size, Arc::clone(&latest));

        let thread = thread::spawn(move || {
            for _ in signals.forever() {
                tracker.check();
            }
        });

        Self {
            latest,
            stop_flag: Arc::new(AtomicBool::new(false)),
            signal_handle: Some(handle),
            thread: Some(thread),
        }
    }

    pub fn start_polling<F>(read_size: F, interval: Duration) -> Self
    where
        F: FnMut() -> Option<Size> + Send + 'static,
    {
        let latest: Latest = Arc::new(Mutex::new(None));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let mut tracker = ChangeTracker::new(read_size, Arc::clone(&latest));
        let thread_stop = Arc::clone(&stop_flag);

        let thread = thread::spawn(move || {
            while wait_interval(&thread_stop, interval) {
                tracker.check();
            }
        });

        Self {
            latest,
            stop_flag,
            #[cfg(unix)]
            signal_handle: None,
            thread: Some(thread),
        }
    }

    /// The newest size since the last call, if the console was resized.
    pub fn take_change(&self) -> Option<Size> {
        self.latest
            .lock()
            .expect("resize state lock poisoned")
            .take()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        #[cfg(unix)]
        if let Some(handle) = self.signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        self.stop();
    }
}
