use std::sync::Arc;

use metrics::counter;
use pdfgen_domain::{LoadSample, ResultSubmission, WorkerDescriptor};
use pdfgen_errors::{WorkerError, WorkerResult};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::SessionManager;
use crate::metrics::{HEARTBEATS_TOTAL, REGISTRATIONS_TOTAL, RESULT_SUBMISSIONS_TOTAL};

/// Talks to the coordinator's worker and job endpoints. A call succeeds only
/// on HTTP 200; anything else is logged and returned as an error.
pub struct CoordinatorClient {
    base_url: String,
    worker_id: String,
    sessions: Arc<SessionManager>,
}

impl CoordinatorClient {
    pub fn new(
        base_url: impl Into<String>,
        worker_id: impl Into<String>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            worker_id: worker_id.into(),
            sessions,
        }
    }

    pub async fn register(&self, descriptor: &WorkerDescriptor) -> WorkerResult<()> {
        let url = format!("{}/workers", self.base_url);

        let outcome = match self.post(&url, descriptor).await {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("Registered worker {} with coordinator", self.worker_id);
                Ok(())
            }
            Ok(response) => {
                let err = rejected(response).await;
                error!("Worker registration failed: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("Worker registration error: {}", e);
                Err(e)
            }
        };

        counter!(REGISTRATIONS_TOTAL, "outcome" => outcome_label(&outcome)).increment(1);
        outcome
    }

    /// Pushes a load report. Failures here are routine, so they are logged
    /// quietly; the caller decides whether to keep going.
    pub async fn update_load(&self, sample: &LoadSample) -> WorkerResult<()> {
        let url = format!("{}/workers/{}", self.base_url, self.worker_id);

        let outcome = match self.post(&url, sample).await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!(
                    current_jobs = sample.current_jobs,
                    "Load update accepted for worker {}", self.worker_id
                );
                Ok(())
            }
            Ok(response) => {
                let err = rejected(response).await;
                debug!("Load update rejected: {}", err);
                Err(err)
            }
            Err(e) => {
                warn!("Failed to push load update: {}", e);
                Err(e)
            }
        };

        counter!(HEARTBEATS_TOTAL, "outcome" => outcome_label(&outcome)).increment(1);
        outcome
    }

    pub async fn submit_result(&self, submission: &ResultSubmission) -> WorkerResult<()> {
        let url = format!("{}/jobs/{}/result", self.base_url, submission.job_id);

        let outcome = match self.post(&url, submission).await {
            Ok(response) if response.status() == StatusCode::OK => {
                info!(
                    job_id = %submission.job_id,
                    status = submission.status.as_str(),
                    "Job result submitted"
                );
                Ok(())
            }
            Ok(response) => {
                let err = rejected(response).await;
                error!(job_id = %submission.job_id, "Result submission failed: {}", err);
                Err(err)
            }
            Err(e) => {
                error!(job_id = %submission.job_id, "Result submission error: {}", e);
                Err(e)
            }
        };

        counter!(RESULT_SUBMISSIONS_TOTAL, "outcome" => outcome_label(&outcome)).increment(1);
        outcome
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> WorkerResult<Response> {
        let client = self.sessions.coordinator().await?;
        Ok(client.post(url).json(payload).send().await?)
    }
}

async fn rejected(response: Response) -> WorkerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    WorkerError::CoordinatorRejected { status, body }
}

fn outcome_label(outcome: &WorkerResult<()>) -> &'static str {
    match outcome {
        Ok(()) => "success",
        Err(WorkerError::CoordinatorRejected { .. }) => "rejected",
        Err(_) => "error",
    }
}
