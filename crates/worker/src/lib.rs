pub mod components;
pub mod metrics;
pub mod service;

pub use components::{
    CoordinatorClient, HeartbeatManager, JobExecutionEngine, JobHandler, LifecycleState,
    LoadTracker, SessionManager, WorkerLifecycle,
};
pub use service::{generate_worker_id, WorkerService, WorkerServiceBuilder, WorkerServiceConfig};
