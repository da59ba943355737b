//! Cooperative cancellation shared by every loop.
//!
//! The scheduler, the render driver, the link thread and the backend all
//! sleep through [`Shutdown::sleep`], so triggering shutdown wakes them
//! immediately instead of waiting out the current period.
//!
//! External signals reach the token through [`Shutdown::trigger_on`]: a
//! watcher thread drives a single-threaded tokio runtime until the signal
//! future resolves, then triggers shutdown.

use std::future::Future;
use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::ports::Clock;
use crate::task::spawn_named;

#[derive(Default)]
struct Inner {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable cancellation token.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every loop holding a clone of this token to stop.
    pub fn trigger(&self) {
        let mut stopped = self
            .inner
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        self.inner.wake.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self
            .inner
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` or until shutdown is triggered.  Returns `true`
    /// if the full duration elapsed, `false` if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let guard = self
            .inner
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *guard {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        let (guard, _) = self
            .inner
            .wake
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        !*guard
    }

    /// Trigger shutdown once `signal` resolves with `Ok`.  An `Err` is
    /// logged and leaves the token untouched.  The watcher thread is not
    /// tied to the token and ends only when `signal` does.
    pub fn trigger_on<F>(&self, name: &'static str, signal: F) -> io::Result<JoinHandle<()>>
    where
        F: Future<Output = io::Result<()>> + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let token = self.clone();

        spawn_named(name, 16, move || match runtime.block_on(signal) {
            Ok(()) => {
                info!("Shutdown: {} received", name);
                token.trigger();
            }
            Err(e) => warn!("Shutdown: {} watcher failed: {}", name, e),
        })
    }

    /// Trigger shutdown on Ctrl-C (SIGINT).
    pub fn trigger_on_interrupt(&self) -> io::Result<JoinHandle<()>> {
        self.trigger_on("interrupt", tokio::signal::ctrl_c())
    }
}

/// Wall-clock [`Clock`] whose sleep is cancelled by a [`Shutdown`].
#[derive(Clone)]
pub struct SystemClock {
    shutdown: Shutdown,
}

impl SystemClock {
    pub fn new(shutdown: Shutdown) -> Self {
        Self { shutdown }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> bool {
        self.shutdown.sleep(duration)
    }
}
