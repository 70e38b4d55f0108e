//! Overlap and panic handling shared by every scheduled job.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

/// Per-job guard: at most one run at a time, and a pause after a panic.
#[derive(Debug, Clone)]
pub(super) struct JobGuard {
    name: &'static str,
    running: Arc<Mutex<()>>,
    error_backoff: Duration,
}

impl JobGuard {
    pub(super) fn new(name: &'static str, error_backoff: Duration) -> Self {
        Self {
            name,
            running: Arc::new(Mutex::new(())),
            error_backoff,
        }
    }

    /// Run `job` unless a previous run of the same job is still going.
    ///
    /// The body runs on its own task so a panic is contained; it is logged
    /// and followed by the error back-off before control returns to the
    /// scheduler.
    pub(super) async fn run<F, Fut>(&self, job: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!(job = self.name, "scheduler: previous run still active; skipping");
            return;
        };

        if let Err(e) = tokio::spawn(job()).await {
            tracing::error!(
                job = self.name,
                error = %e,
                backoff_secs = self.error_backoff.as_secs(),
                "scheduler: job failed unexpectedly; backing off"
            );
            tokio::time::sleep(self.error_backoff).await;
        }
    }
}
