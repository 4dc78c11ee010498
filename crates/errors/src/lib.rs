use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("coordinator rejected request: HTTP {status} - {body}")]
    CoordinatorRejected { status: u16, body: String },
    #[error("Unsupported job type in payload: {0}")]
    UnsupportedJobType(String),
    #[error("invalid job payload: {0}")]
    InvalidJobPayload(String),
    #[error("{0} session not initialised")]
    SessionUnavailable(&'static str),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("job source error: {0}")]
    JobSource(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl WorkerError {
    pub fn unsupported_job_type<S: Into<String>>(job_type: S) -> Self {
        Self::UnsupportedJobType(job_type.into())
    }
    pub fn invalid_payload<S: Into<String>>(msg: S) -> Self {
        Self::InvalidJobPayload(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn job_source<S: Into<String>>(msg: S) -> Self {
        Self::JobSource(msg.into())
    }
    /// Transient failures: the heartbeat loop keeps going after these.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerError::Network(_)
                | WorkerError::Timeout(_)
                | WorkerError::CoordinatorRejected { .. }
        )
    }
    /// Errors produced while turning a job payload into a request. No
    /// outbound call has been issued when one of these is returned.
    pub fn is_job_rejection(&self) -> bool {
        matches!(
            self,
            WorkerError::UnsupportedJobType(_) | WorkerError::InvalidJobPayload(_)
        )
    }
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WorkerError::Timeout(err.to_string())
        } else if err.is_builder() {
            WorkerError::InvalidJobPayload(err.to_string())
        } else {
            WorkerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Serialization(err.to_string())
    }
}
