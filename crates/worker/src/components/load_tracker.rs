use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use metrics::gauge;
use pdfgen_domain::LoadSample;

use crate::metrics::JOBS_IN_FLIGHT;

/// Shared in-flight job counter, read by the heartbeat and written by the
/// job handler.
#[derive(Debug, Default)]
pub struct LoadTracker {
    current: AtomicU32,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_jobs(&self) -> u32 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn sample(&self) -> LoadSample {
        LoadSample::synthetic(self.current_jobs())
    }

    /// Increments the counter; the returned guard decrements it when dropped,
    /// including when the owning task is aborted mid-job.
    pub fn begin_job(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        gauge!(JOBS_IN_FLIGHT).set(f64::from(now));
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    fn end_job(&self) {
        // Floored at zero.
        let previous = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        gauge!(JOBS_IN_FLIGHT).set(f64::from(previous.saturating_sub(1)));
    }
}

#[must_use = "dropping the guard ends the job immediately"]
pub struct InFlightGuard {
    tracker: Arc<LoadTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.end_job();
    }
}
