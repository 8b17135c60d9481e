//! Cancellable deferred work
//!
//! A [`DeferredTask`] holds at most one armed timer. Arming it again aborts the
//! previous timer, so bursts of calls collapse into a single firing.
//!
//! Only the waiting phase is cancellable: once the delay elapses the work is
//! spawned on its own task and runs to completion even if the timer is
//! re-armed or cancelled afterwards.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct DeferredTask {
    name: &'static str,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeferredTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    /// Run `task` after `delay`, replacing any armed timer
    pub fn schedule<F, Fut>(&self, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = self.name;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("{} timer fired", name);
            tokio::spawn(task());
        });

        if let Some(previous) = self.slot().replace(handle) {
            previous.abort();
        }
    }

    /// Disarm the timer. Returns true if a timer was still waiting.
    pub fn cancel(&self) -> bool {
        match self.slot().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                if waiting {
                    tracing::debug!("{} timer cancelled", self.name);
                }
                waiting
            }
            None => false,
        }
    }

    /// A timer is armed and has not fired yet
    pub fn is_armed(&self) -> bool {
        self.slot()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        if let Some(handle) = self.slot().take() {
            handle.abort();
        }
    }
}
