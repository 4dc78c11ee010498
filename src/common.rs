use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pdfgen_config::{AppConfig, ConfigValidator, HeaderOverrides};
use pdfgen_domain::JobDescriptor;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::Application;
use crate::shutdown::ShutdownManager;

pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Command line values layered over the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub worker_id: Option<String>,
    pub coordinator_url: Option<String>,
    pub max_jobs: Option<u32>,
    pub headers_file: Option<String>,
    pub headers_profile: Option<String>,
    pub header_overrides: HeaderOverrides,
    pub print_headers: bool,
    pub jobs_file: Option<String>,
}

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// Loads configuration and applies command line overrides on top.
pub fn load_config(startup_config: &StartupConfig) -> Result<AppConfig> {
    let mut config = match startup_config.config_path {
        Some(ref path) => {
            AppConfig::load(Some(path)).with_context(|| format!("加载配置文件失败: {path}"))?
        }
        None => AppConfig::load(None).context("加载配置失败")?,
    };

    if let Some(ref worker_id) = startup_config.worker_id {
        config.worker.worker_id = Some(worker_id.clone());
    }
    if let Some(ref url) = startup_config.coordinator_url {
        config.coordinator.base_url = url.clone();
    }
    if let Some(max_jobs) = startup_config.max_jobs {
        config.worker.max_concurrent_jobs = max_jobs;
    }
    if let Some(ref path) = startup_config.headers_file {
        config.coordinator.headers_file = Some(path.clone());
    }
    if let Some(ref profile) = startup_config.headers_profile {
        config.coordinator.headers_profile = profile.clone();
    }
    if let Some(ref level) = startup_config.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(ref format) = startup_config.log_format {
        config.observability.log_format = format.clone();
    }

    config.validate().context("配置校验失败")?;
    Ok(config)
}

/// Effective coordinator headers. A broken headers file is logged and
/// treated as an empty profile.
pub fn resolve_coordinator_headers(
    config: &AppConfig,
    overrides: &HeaderOverrides,
) -> BTreeMap<String, String> {
    let profile = config.coordinator.profile_headers().unwrap_or_else(|e| {
        warn!("Failed to load coordinator headers profile, continuing without it: {e}");
        BTreeMap::new()
    });
    config.coordinator.merged_headers(profile, overrides)
}

/// Reads a JSON array of job payloads.
pub fn load_jobs_file(path: &Path) -> Result<Vec<JobDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取任务文件失败: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("解析任务文件失败: {}", path.display()))
}

pub async fn start_application(startup_config: StartupConfig) -> Result<()> {
    let config = load_config(&startup_config)?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    info!("启动 PDF 生成 Worker");
    if let Some(ref path) = startup_config.config_path {
        info!("配置文件: {path}");
    }
    info!("Coordinator: {}", config.coordinator.base_url());

    if let Some(addr) = config.observability.metrics_socket_addr()? {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("启动Prometheus指标导出失败")?;
        info!("Prometheus metrics listening on {addr}");
    }

    let headers = resolve_coordinator_headers(&config, &startup_config.header_overrides);
    if startup_config.print_headers {
        print_headers(&headers);
    }

    let jobs = match startup_config.jobs_file {
        Some(ref path) => Some(load_jobs_file(Path::new(path))?),
        None => None,
    };

    let app = Arc::new(Application::new(config, headers, jobs)?);
    let shutdown_manager = ShutdownManager::new();

    let app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {e}");
            }
        })
    };

    wait_for_shutdown_signal().await;
    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(Ok(())) => info!("Worker 已优雅关闭"),
        Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
        Err(_) => warn!("Worker 关闭超时，强制退出"),
    }

    Ok(())
}

fn print_headers(headers: &BTreeMap<String, String>) {
    if headers.is_empty() {
        info!("No coordinator headers configured");
        return;
    }
    for (name, value) in headers {
        info!("Coordinator header {name}: {value}");
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到Ctrl+C信号"),
        _ = terminate => info!("收到SIGTERM信号"),
    }
}
