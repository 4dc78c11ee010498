use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use pdfgen_config::AppConfig;
use pdfgen_domain::{ChannelJobFetcher, JobDescriptor, JobSender};
use pdfgen_worker::{WorkerService, WorkerServiceBuilder};
use tokio::sync::broadcast;
use tracing::{error, info};

/// The worker process: one [`WorkerService`], optionally fed from a list of
/// preloaded jobs.
pub struct Application {
    service: WorkerService,
    job_sender: Option<JobSender>,
    pending_jobs: Vec<JobDescriptor>,
}

impl Application {
    pub fn new(
        config: AppConfig,
        coordinator_headers: BTreeMap<String, String>,
        jobs: Option<Vec<JobDescriptor>>,
    ) -> Result<Self> {
        let mut builder = WorkerServiceBuilder::from_config(&config, coordinator_headers)
            .context("Worker配置无效")?;

        let (job_sender, pending_jobs) = match jobs {
            Some(jobs) => {
                let (fetcher, sender) = ChannelJobFetcher::new();
                builder = builder.job_fetcher(Arc::new(fetcher));
                (Some(sender), jobs)
            }
            None => (None, Vec::new()),
        };

        let service = builder.build().context("创建Worker服务失败")?;
        info!("初始化Worker: {}", service.worker_id());

        Ok(Self {
            service,
            job_sender,
            pending_jobs,
        })
    }

    pub fn service(&self) -> &WorkerService {
        &self.service
    }

    /// Starts the worker, queues any preloaded jobs and stops the worker once
    /// a shutdown signal arrives.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.service.start().await.context("启动Worker失败")?;

        if let Some(ref sender) = self.job_sender {
            for job in &self.pending_jobs {
                if let Err(e) = sender.send(job.clone()) {
                    error!("Failed to queue preloaded job: {e}");
                }
            }
            info!("Queued {} preloaded job(s)", self.pending_jobs.len());
        }

        let _ = shutdown_rx.recv().await;
        info!("停止Worker服务");
        self.service.stop().await.context("停止Worker失败")?;
        Ok(())
    }
}
