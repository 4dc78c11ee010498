use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pdfgen_domain::{JobFetcher, WorkerDescriptor};
use pdfgen_errors::WorkerResult;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{CoordinatorClient, HeartbeatManager, JobHandler, SessionManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct BackgroundTasks {
    heartbeat: JoinHandle<WorkerResult<()>>,
    job_loop: JoinHandle<WorkerResult<()>>,
}

/// Start/stop orchestration: sessions, registration and the two
/// background loops.
pub struct WorkerLifecycle {
    descriptor: WorkerDescriptor,
    poll_interval: Duration,
    sessions: Arc<SessionManager>,
    coordinator_client: Arc<CoordinatorClient>,
    heartbeat_manager: Arc<HeartbeatManager>,
    job_handler: Arc<JobHandler>,
    job_fetcher: Arc<dyn JobFetcher>,
    running: Arc<AtomicBool>,
    registered: AtomicBool,
    state: RwLock<LifecycleState>,
    // Held for the whole of start/stop, which serializes them.
    tasks: Mutex<Option<BackgroundTasks>>,
}

impl WorkerLifecycle {
    pub fn new(
        descriptor: WorkerDescriptor,
        poll_interval: Duration,
        sessions: Arc<SessionManager>,
        coordinator_client: Arc<CoordinatorClient>,
        heartbeat_manager: Arc<HeartbeatManager>,
        job_handler: Arc<JobHandler>,
        job_fetcher: Arc<dyn JobFetcher>,
    ) -> Self {
        Self {
            descriptor,
            poll_interval,
            sessions,
            coordinator_client,
            heartbeat_manager,
            job_handler,
            job_fetcher,
            running: Arc::new(AtomicBool::new(false)),
            registered: AtomicBool::new(false),
            state: RwLock::new(LifecycleState::Stopped),
            tasks: Mutex::new(None),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &WorkerDescriptor {
        &self.descriptor
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Outcome of the most recent registration attempt.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub async fn is_heartbeat_alive(&self) -> bool {
        self.tasks
            .lock()
            .await
            .as_ref()
            .is_some_and(|tasks| !tasks.heartbeat.is_finished())
    }

    pub async fn is_job_loop_alive(&self) -> bool {
        self.tasks
            .lock()
            .await
            .as_ref()
            .is_some_and(|tasks| !tasks.job_loop.is_finished())
    }

    /// Idempotent. A failed registration is logged and startup continues.
    pub async fn start(&self) -> WorkerResult<()> {
        let mut tasks = self.tasks.lock().await;
        if self.is_running() {
            debug!("Worker {} already running", self.worker_id());
            return Ok(());
        }

        info!("Starting worker: {}", self.worker_id());
        self.set_state(LifecycleState::Starting).await;

        if let Err(e) = self.sessions.ensure_sessions().await {
            error!("Failed to create HTTP sessions: {}", e);
            self.set_state(LifecycleState::Stopped).await;
            return Err(e);
        }

        // The client logs the failure; startup continues regardless.
        let registered = self.coordinator_client.register(&self.descriptor).await.is_ok();
        self.registered.store(registered, Ordering::SeqCst);

        self.running.store(true, Ordering::SeqCst);
        let heartbeat = self
            .heartbeat_manager
            .start_heartbeat_task(Arc::clone(&self.running));
        let job_loop = self.start_job_loop();
        *tasks = Some(BackgroundTasks {
            heartbeat,
            job_loop,
        });

        self.set_state(LifecycleState::Running).await;
        info!(
            registered,
            "Worker {} started, max_concurrent_jobs={}",
            self.worker_id(),
            self.descriptor.max_concurrent_jobs
        );
        Ok(())
    }

    /// Idempotent and safe before `start`. Background tasks are cancelled,
    /// not drained: an in-flight job is abandoned without a result.
    pub async fn stop(&self) -> WorkerResult<()> {
        let mut tasks = self.tasks.lock().await;
        if !self.is_running() {
            self.sessions.close().await;
            return Ok(());
        }

        info!("停止worker: {}", self.worker_id());
        self.set_state(LifecycleState::Stopping).await;
        self.running.store(false, Ordering::SeqCst);

        if let Some(background) = tasks.take() {
            cancel_task("heartbeat", background.heartbeat).await;
            cancel_task("job loop", background.job_loop).await;
        }

        self.sessions.close().await;
        self.set_state(LifecycleState::Stopped).await;
        info!("Worker {} stopped", self.worker_id());
        Ok(())
    }

    fn start_job_loop(&self) -> JoinHandle<WorkerResult<()>> {
        let fetcher = Arc::clone(&self.job_fetcher);
        let handler = Arc::clone(&self.job_handler);
        let running = Arc::clone(&self.running);
        let descriptor = self.descriptor.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            Self::run_job_loop(fetcher, handler, descriptor, poll_interval, running).await
        })
    }

    /// Jobs are handled one at a time; `max_concurrent_jobs` is advertised
    /// to the coordinator but not enforced here.
    async fn run_job_loop(
        fetcher: Arc<dyn JobFetcher>,
        handler: Arc<JobHandler>,
        descriptor: WorkerDescriptor,
        poll_interval: Duration,
        running: Arc<AtomicBool>,
    ) -> WorkerResult<()> {
        while running.load(Ordering::SeqCst) {
            match fetcher.fetch_next(&descriptor).await {
                Ok(Some(job)) => {
                    handler.handle_job(job).await;
                }
                Ok(None) => tokio::time::sleep(poll_interval).await,
                Err(e) => {
                    error!("Job loop encountered an error: {}", e);
                    return Err(e);
                }
            }
        }
        info!("Job loop shutting down");
        Ok(())
    }

    async fn set_state(&self, state: LifecycleState) {
        *self.state.write().await = state;
    }
}

async fn cancel_task(name: &str, handle: JoinHandle<WorkerResult<()>>) {
    handle.abort();
    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Background {} task ended with error: {}", name, e),
        Err(e) if e.is_cancelled() => {}
        Err(e) => debug!("Background {} task failed during shutdown: {}", name, e),
    }
}
