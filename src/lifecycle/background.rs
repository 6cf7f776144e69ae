//! Tracked background work.
//!
//! Store writes are detached from the response that triggered them but must
//! still finish before the process exits. Every spawned task holds a guard
//! on a shared counter; shutdown waits for the counter to reach zero.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::Instrument;

use crate::observability::metrics;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    idle: Notify,
}

/// A set of detached tasks that can be awaited as a whole.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` onto the runtime and track it until it completes.
    ///
    /// The task is not tied to the caller: dropping the request that spawned
    /// it (client disconnect included) does not cancel it.
    pub fn spawn<F>(&self, task: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = TaskGuard::new(self.inner.clone());
        tokio::spawn(
            async move {
                let _guard = guard;
                fut.await;
            }
            .instrument(tracing::debug_span!("background", task)),
        );
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Wait until no tracked task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait for pending tasks, giving up after `timeout`.
    ///
    /// Returns false when tasks were still running at the deadline.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let pending = self.pending();
        if pending > 0 {
            tracing::info!(pending, "Waiting for background store writes");
        }
        match tokio::time::timeout(timeout, self.wait_idle()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(pending = self.pending(), "Background writes still running at drain deadline");
                false
            }
        }
    }
}

/// Keeps a task counted while alive, also across panics.
struct TaskGuard {
    inner: Arc<Inner>,
}

impl TaskGuard {
    fn new(inner: Arc<Inner>) -> Self {
        let pending = inner.pending.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_background_tasks(pending);
        Self { inner }
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let pending = self.inner.pending.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_background_tasks(pending);
        if pending == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}
