use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use pdfgen_domain::{ExecutionResult, JobDescriptor, JobStatus, ResultSubmission};
use pdfgen_errors::WorkerError;
use tracing::{debug, error, info};

use super::{CoordinatorClient, JobExecutionEngine, LoadTracker};
use crate::metrics::{JOBS_TOTAL, JOB_DURATION_MS};

/// Runs one job end to end: load bookkeeping, execution and exactly one
/// result submission. Never fails; every problem is reported to the
/// coordinator as a `Failed` result or logged.
pub struct JobHandler {
    worker_id: String,
    engine: Arc<JobExecutionEngine>,
    coordinator_client: Arc<CoordinatorClient>,
    load_tracker: Arc<LoadTracker>,
}

impl JobHandler {
    pub fn new(
        worker_id: String,
        engine: Arc<JobExecutionEngine>,
        coordinator_client: Arc<CoordinatorClient>,
        load_tracker: Arc<LoadTracker>,
    ) -> Self {
        Self {
            worker_id,
            engine,
            coordinator_client,
            load_tracker,
        }
    }

    pub async fn handle_job(&self, job: JobDescriptor) -> JobStatus {
        let job_id = job.resolve_id();
        let started = Instant::now();

        let in_flight = self.load_tracker.begin_job();
        self.push_load().await;

        info!(job_id = %job_id, worker_id = %self.worker_id, "开始处理任务");

        let submission = match self.engine.execute_job(&job).await {
            Ok(response) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let result = ExecutionResult {
                    worker_id: self.worker_id.clone(),
                    web_api_response: response,
                };
                match ResultSubmission::completed(&job_id, &result, elapsed_ms) {
                    Ok(submission) => submission,
                    Err(e) => ResultSubmission::failed(&job_id, WorkerError::from(e).to_string()),
                }
            }
            Err(e) => {
                error!(job_id = %job_id, "Job failed: {}", e);
                ResultSubmission::failed(&job_id, e.to_string())
            }
        };
        let status = submission.status;

        counter!(JOBS_TOTAL, "status" => status.as_str()).increment(1);
        histogram!(JOB_DURATION_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        // Already logged by the client; the job is finished either way.
        let _ = self.coordinator_client.submit_result(&submission).await;

        drop(in_flight);
        self.push_load().await;

        status
    }

    async fn push_load(&self) {
        let sample = self.load_tracker.sample();
        if let Err(e) = self.coordinator_client.update_load(&sample).await {
            debug!("Load update around job failed: {}", e);
        }
    }
}
