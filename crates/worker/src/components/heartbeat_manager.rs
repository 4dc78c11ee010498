use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pdfgen_errors::WorkerResult;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{CoordinatorClient, LoadTracker};

/// Periodically pushes the current load to the coordinator.
pub struct HeartbeatManager {
    worker_id: String,
    heartbeat_interval: Duration,
    coordinator_client: Arc<CoordinatorClient>,
    load_tracker: Arc<LoadTracker>,
}

impl HeartbeatManager {
    pub fn new(
        worker_id: String,
        heartbeat_interval: Duration,
        coordinator_client: Arc<CoordinatorClient>,
        load_tracker: Arc<LoadTracker>,
    ) -> Self {
        Self {
            worker_id,
            heartbeat_interval,
            coordinator_client,
            load_tracker,
        }
    }

    pub fn start_heartbeat_task(
        self: &Arc<Self>,
        running: Arc<AtomicBool>,
    ) -> JoinHandle<WorkerResult<()>> {
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run(running).await })
    }

    /// Push, then sleep, while `running` holds. Coordinator rejections and
    /// transport failures are tolerated; any other error ends the loop and
    /// no further heartbeats are sent until the worker is restarted.
    pub async fn run(&self, running: Arc<AtomicBool>) -> WorkerResult<()> {
        info!("Heartbeat loop started for worker {}", self.worker_id);

        while running.load(Ordering::SeqCst) {
            let sample = self.load_tracker.sample();
            if let Err(e) = self.coordinator_client.update_load(&sample).await {
                if !e.is_retryable() {
                    error!("Heartbeat loop encountered an unexpected error: {}", e);
                    return Err(e);
                }
                debug!("Heartbeat failed, retrying next tick: {}", e);
            }
            tokio::time::sleep(self.heartbeat_interval).await;
        }

        info!("Heartbeat loop stopped for worker {}", self.worker_id);
        Ok(())
    }
}
