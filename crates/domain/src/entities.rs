use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::job::{WebApiJob, WebApiTemplate};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerType {
    WebApi,
}

/// Capability descriptor advertised at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SupportedJobType {
    WebApiJob(WebApiJob),
}

/// Registration payload for `POST {coordinator}/workers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerDescriptor {
    pub id: String,
    pub worker_type: WorkerType,
    pub max_concurrent_jobs: u32,
    pub supported_job_types: Vec<SupportedJobType>,
}

impl WorkerDescriptor {
    pub fn new(
        id: impl Into<String>,
        max_concurrent_jobs: u32,
        template: Option<&WebApiTemplate>,
    ) -> Self {
        Self {
            id: id.into(),
            worker_type: WorkerType::WebApi,
            max_concurrent_jobs,
            supported_job_types: template
                .map(|t| SupportedJobType::WebApiJob(WebApiJob::from(t)))
                .into_iter()
                .collect(),
        }
    }
}

/// Load report for `POST {coordinator}/workers/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoadSample {
    pub current_jobs: u32,
    pub cpu_usage: f64,
    pub memory_usage: f64,
}

impl LoadSample {
    /// Placeholder figures derived from the in-flight count only; nothing is
    /// measured on the host.
    pub fn synthetic(current_jobs: u32) -> Self {
        let n = f64::from(current_jobs);
        Self {
            current_jobs,
            cpu_usage: 10.0 + 5.0 * n,
            memory_usage: 20.0 + 8.0 * n,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Normalized response of the job target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON when the body parses, otherwise the raw text.
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub worker_id: String,
    pub web_api_response: WebApiResponse,
}

/// Outcome report for `POST {coordinator}/jobs/{id}/result`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSubmission {
    pub job_id: String,
    pub status: JobStatus,
    /// The execution result, JSON-encoded into a string.
    pub result: Option<String>,
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ResultSubmission {
    pub fn completed(
        job_id: impl Into<String>,
        result: &ExecutionResult,
        execution_time_ms: u64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            job_id: job_id.into(),
            status: JobStatus::Completed,
            result: Some(serde_json::to_string(result)?),
            error: None,
            completed_at: Utc::now(),
            execution_time_ms: Some(execution_time_ms),
        })
    }

    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Failed,
            result: None,
            error: Some(error.into()),
            completed_at: Utc::now(),
            execution_time_ms: None,
        }
    }
}
