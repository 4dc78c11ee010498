use async_trait::async_trait;
use pdfgen_errors::{WorkerError, WorkerResult};
use tokio::sync::{mpsc, Mutex};

use crate::entities::WorkerDescriptor;
use crate::job::JobDescriptor;

/// Source of work for the acquisition loop.
///
/// Returning `Ok(None)` means "nothing right now": the loop sleeps for the
/// poll interval and asks again. An `Err` ends the acquisition loop.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch_next(&self, worker: &WorkerDescriptor) -> WorkerResult<Option<JobDescriptor>>;
}

/// Never yields a job.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJobFetcher;

#[async_trait]
impl JobFetcher for NoopJobFetcher {
    async fn fetch_next(&self, _worker: &WorkerDescriptor) -> WorkerResult<Option<JobDescriptor>> {
        Ok(None)
    }
}

/// In-memory job source fed through a [`JobSender`].
///
/// `fetch_next` never waits for a job to arrive.
pub struct ChannelJobFetcher {
    receiver: Mutex<mpsc::UnboundedReceiver<JobDescriptor>>,
}

impl ChannelJobFetcher {
    pub fn new() -> (Self, JobSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                receiver: Mutex::new(rx),
            },
            JobSender { sender: tx },
        )
    }
}

#[async_trait]
impl JobFetcher for ChannelJobFetcher {
    async fn fetch_next(&self, _worker: &WorkerDescriptor) -> WorkerResult<Option<JobDescriptor>> {
        let mut receiver = self.receiver.lock().await;
        match receiver.try_recv() {
            Ok(job) => Ok(Some(job)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobSender {
    sender: mpsc::UnboundedSender<JobDescriptor>,
}

impl JobSender {
    pub fn send(&self, job: JobDescriptor) -> WorkerResult<()> {
        self.sender
            .send(job)
            .map_err(|_| WorkerError::job_source("job channel closed"))
    }
}
