use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pdfgen_config::{AppConfig, ConfigValidator};
use pdfgen_domain::{
    JobDescriptor, JobFetcher, JobStatus, NoopJobFetcher, WebApiResponse, WebApiTemplate,
    WorkerDescriptor,
};
use pdfgen_errors::{WorkerError, WorkerResult};
use uuid::Uuid;

use crate::components::{
    CoordinatorClient, HeartbeatManager, JobExecutionEngine, JobHandler, LifecycleState,
    LoadTracker, SessionManager, WorkerLifecycle,
};

/// `pdf-worker-` followed by eight hex characters.
pub fn generate_worker_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("pdf-worker-{}", &hex[..8])
}

/// Resolved settings for [`WorkerService`].
#[derive(Debug, Clone)]
pub struct WorkerServiceConfig {
    pub worker_id: String,
    pub coordinator_url: String,
    pub coordinator_headers: BTreeMap<String, String>,
    pub coordinator_timeout: Duration,
    pub outbound_timeout: Duration,
    pub max_concurrent_jobs: u32,
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    pub web_api: Option<WebApiTemplate>,
}

impl WorkerServiceConfig {
    pub fn builder(coordinator_url: impl Into<String>) -> WorkerServiceBuilder {
        WorkerServiceBuilder::new(coordinator_url)
    }
}

pub struct WorkerServiceBuilder {
    worker_id: Option<String>,
    coordinator_url: String,
    coordinator_headers: BTreeMap<String, String>,
    coordinator_timeout: Duration,
    outbound_timeout: Duration,
    max_concurrent_jobs: u32,
    heartbeat_interval: Duration,
    poll_interval: Duration,
    web_api: Option<WebApiTemplate>,
    job_fetcher: Option<Arc<dyn JobFetcher>>,
}

impl WorkerServiceBuilder {
    pub fn new(coordinator_url: impl Into<String>) -> Self {
        Self {
            worker_id: None,
            coordinator_url: coordinator_url.into(),
            coordinator_headers: BTreeMap::new(),
            coordinator_timeout: Duration::from_secs(60),
            outbound_timeout: Duration::from_secs(300),
            max_concurrent_jobs: 2,
            heartbeat_interval: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            web_api: None,
            job_fetcher: None,
        }
    }

    /// Seeds the builder from validated configuration. `coordinator_headers`
    /// is the already merged header set (profile, static, overrides).
    pub fn from_config(
        config: &AppConfig,
        coordinator_headers: BTreeMap<String, String>,
    ) -> WorkerResult<Self> {
        config.validate()?;

        let worker = &config.worker;
        let mut builder = Self::new(config.coordinator.base_url())
            .coordinator_headers(coordinator_headers)
            .coordinator_timeout(Duration::from_secs(config.coordinator.timeout_seconds))
            .outbound_timeout(Duration::from_secs(worker.outbound_timeout_seconds))
            .max_concurrent_jobs(worker.max_concurrent_jobs)
            .heartbeat_interval(Duration::from_secs(worker.heartbeat_interval_seconds))
            .poll_interval(Duration::from_secs_f64(worker.poll_interval_seconds));

        if let Some(ref worker_id) = worker.worker_id {
            builder = builder.worker_id(worker_id.clone());
        }
        if let Some(ref web_api) = config.web_api {
            builder = builder.web_api_template(web_api.to_template());
        }
        Ok(builder)
    }

    pub fn worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    pub fn coordinator_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.coordinator_headers = headers;
        self
    }

    pub fn coordinator_timeout(mut self, timeout: Duration) -> Self {
        self.coordinator_timeout = timeout;
        self
    }

    pub fn outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout = timeout;
        self
    }

    pub fn max_concurrent_jobs(mut self, max_concurrent_jobs: u32) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn web_api_template(mut self, template: WebApiTemplate) -> Self {
        self.web_api = Some(template);
        self
    }

    pub fn job_fetcher(mut self, fetcher: Arc<dyn JobFetcher>) -> Self {
        self.job_fetcher = Some(fetcher);
        self
    }

    pub fn build(self) -> WorkerResult<WorkerService> {
        if self.coordinator_url.trim().is_empty() {
            return Err(WorkerError::config_error("coordinator url must not be empty"));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(WorkerError::config_error(
                "max_concurrent_jobs must be greater than 0",
            ));
        }

        let config = WorkerServiceConfig {
            worker_id: self
                .worker_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_worker_id),
            coordinator_url: self.coordinator_url,
            coordinator_headers: self.coordinator_headers,
            coordinator_timeout: self.coordinator_timeout,
            outbound_timeout: self.outbound_timeout,
            max_concurrent_jobs: self.max_concurrent_jobs,
            heartbeat_interval: self.heartbeat_interval,
            poll_interval: self.poll_interval,
            web_api: self.web_api,
        };
        let fetcher = self
            .job_fetcher
            .unwrap_or_else(|| Arc::new(NoopJobFetcher) as Arc<dyn JobFetcher>);

        WorkerService::new(config, fetcher)
    }
}

/// Composes the worker components around shared sessions and a shared
/// load counter.
pub struct WorkerService {
    config: WorkerServiceConfig,
    sessions: Arc<SessionManager>,
    load_tracker: Arc<LoadTracker>,
    engine: Arc<JobExecutionEngine>,
    job_handler: Arc<JobHandler>,
    lifecycle: Arc<WorkerLifecycle>,
}

impl WorkerService {
    pub fn new(config: WorkerServiceConfig, job_fetcher: Arc<dyn JobFetcher>) -> WorkerResult<Self> {
        let sessions = Arc::new(SessionManager::new(
            &config.coordinator_headers,
            config.coordinator_timeout,
            config.outbound_timeout,
        )?);
        let load_tracker = Arc::new(LoadTracker::new());

        let coordinator_client = Arc::new(CoordinatorClient::new(
            config.coordinator_url.clone(),
            config.worker_id.clone(),
            Arc::clone(&sessions),
        ));

        let engine = Arc::new(JobExecutionEngine::new(
            Arc::clone(&sessions),
            config.web_api.clone(),
        ));

        let job_handler = Arc::new(JobHandler::new(
            config.worker_id.clone(),
            Arc::clone(&engine),
            Arc::clone(&coordinator_client),
            Arc::clone(&load_tracker),
        ));

        let heartbeat_manager = Arc::new(HeartbeatManager::new(
            config.worker_id.clone(),
            config.heartbeat_interval,
            Arc::clone(&coordinator_client),
            Arc::clone(&load_tracker),
        ));

        let descriptor = WorkerDescriptor::new(
            config.worker_id.clone(),
            config.max_concurrent_jobs,
            config.web_api.as_ref(),
        );

        let lifecycle = Arc::new(WorkerLifecycle::new(
            descriptor,
            config.poll_interval,
            Arc::clone(&sessions),
            coordinator_client,
            heartbeat_manager,
            Arc::clone(&job_handler),
            job_fetcher,
        ));

        Ok(Self {
            config,
            sessions,
            load_tracker,
            engine,
            job_handler,
            lifecycle,
        })
    }

    pub fn builder(coordinator_url: impl Into<String>) -> WorkerServiceBuilder {
        WorkerServiceBuilder::new(coordinator_url)
    }

    pub async fn start(&self) -> WorkerResult<()> {
        self.lifecycle.start().await
    }

    pub async fn stop(&self) -> WorkerResult<()> {
        self.lifecycle.stop().await
    }

    /// Runs a single job through the engine without any coordinator
    /// bookkeeping. Sessions must be open.
    pub async fn execute_job(&self, job: &JobDescriptor) -> WorkerResult<WebApiResponse> {
        self.engine.execute_job(job).await
    }

    /// Full per-job flow, including load pushes and result submission.
    pub async fn handle_job(&self, job: JobDescriptor) -> JobStatus {
        self.job_handler.handle_job(job).await
    }

    /// Opens the HTTP sessions without starting the worker.
    pub async fn ensure_sessions(&self) -> WorkerResult<()> {
        self.sessions.ensure_sessions().await
    }

    pub async fn sessions_closed(&self) -> bool {
        self.sessions.is_closed().await
    }

    pub fn worker_id(&self) -> &str {
        &self.config.worker_id
    }

    pub fn config(&self) -> &WorkerServiceConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &WorkerDescriptor {
        self.lifecycle.descriptor()
    }

    pub fn current_jobs(&self) -> u32 {
        self.load_tracker.current_jobs()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn is_registered(&self) -> bool {
        self.lifecycle.is_registered()
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    pub async fn is_heartbeat_alive(&self) -> bool {
        self.lifecycle.is_heartbeat_alive().await
    }

    pub async fn is_job_loop_alive(&self) -> bool {
        self.lifecycle.is_job_loop_alive().await
    }
}
