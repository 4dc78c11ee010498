pub mod coordinator_client;
pub mod heartbeat_manager;
pub mod job_execution;
pub mod job_handler;
pub mod load_tracker;
pub mod session_manager;
pub mod worker_lifecycle;

pub use coordinator_client::CoordinatorClient;
pub use heartbeat_manager::HeartbeatManager;
pub use job_execution::{JobExecutionEngine, PreparedRequest, RequestBody};
pub use job_handler::JobHandler;
pub use load_tracker::{InFlightGuard, LoadTracker};
pub use session_manager::SessionManager;
pub use worker_lifecycle::{LifecycleState, WorkerLifecycle};
