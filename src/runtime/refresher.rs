//! Timer thread that redraws mutable content, such as a progress indicator, on a fixed
//! cadence.
//!
//! The callback runs on the refresher thread. Output it produces goes through a port,
//! and every port write takes the global write lock, so a tick never splits a sequence
//! the foreground is emitting.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub struct CyclicRefresher {
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
    ticks: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

impl CyclicRefresher {
    /// Starts calling `refresh` every `interval` with the tick number, starting at 1.
    pub fn start<F>(interval: Duration, mut refresh: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicUsize::new(0));
        let thread_stop = Arc::clone(&stop_flag);
        let thread_ticks = Arc::clone(&ticks);

        let thread = thread::spawn(move || {
            while wait_interval(&thread_stop, interval) {
                let tick = thread_ticks.fetch_add(1, Ordering::SeqCst) + 1;
                refresh(tick);
            }
        });
        tracing::trace!(interval_ms = interval.as_millis() as u64, "refresher started");

        Self {
            interval,
            stop_flag,
            ticks,
            thread: Some(thread),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stops the thread and waits for it. A tick already in progress completes.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
            tracing::trace!(ticks = self.ticks(), "refresher stopped");
        }
    }
}

/// Parks for `interval`. Returns false as soon as a stop is requested.
pub(crate) fn wait_interval(stop_flag: &AtomicBool, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop_flag.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

impl Drop for CyclicRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}
