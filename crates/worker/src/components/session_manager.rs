use std::collections::BTreeMap;
use std::time::Duration;

use pdfgen_errors::{WorkerError, WorkerResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

/// Owns the two pooled HTTP sessions: one for coordinator traffic (carries
/// the coordinator headers) and one for outbound job calls (carries none).
pub struct SessionManager {
    coordinator_headers: HeaderMap,
    coordinator_timeout: Duration,
    outbound_timeout: Duration,
    coordinator: RwLock<Option<Client>>,
    outbound: RwLock<Option<Client>>,
}

impl SessionManager {
    pub fn new(
        coordinator_headers: &BTreeMap<String, String>,
        coordinator_timeout: Duration,
        outbound_timeout: Duration,
    ) -> WorkerResult<Self> {
        Ok(Self {
            coordinator_headers: to_header_map(coordinator_headers)?,
            coordinator_timeout,
            outbound_timeout,
            coordinator: RwLock::new(None),
            outbound: RwLock::new(None),
        })
    }

    /// Creates whichever session is missing. Existing sessions are kept.
    pub async fn ensure_sessions(&self) -> WorkerResult<()> {
        {
            let mut coordinator = self.coordinator.write().await;
            if coordinator.is_none() {
                let client = Client::builder()
                    .default_headers(self.coordinator_headers.clone())
                    .timeout(self.coordinator_timeout)
                    .build()
                    .map_err(|e| {
                        WorkerError::Internal(format!("failed to build coordinator session: {e}"))
                    })?;
                *coordinator = Some(client);
                debug!("Coordinator session created");
            }
        }

        let mut outbound = self.outbound.write().await;
        if outbound.is_none() {
            let client = Client::builder()
                .timeout(self.outbound_timeout)
                .build()
                .map_err(|e| {
                    WorkerError::Internal(format!("failed to build outbound session: {e}"))
                })?;
            *outbound = Some(client);
            debug!("Outbound session created");
        }
        Ok(())
    }

    pub async fn coordinator(&self) -> WorkerResult<Client> {
        self.coordinator
            .read()
            .await
            .clone()
            .ok_or(WorkerError::SessionUnavailable("coordinator"))
    }

    pub async fn outbound(&self) -> WorkerResult<Client> {
        self.outbound
            .read()
            .await
            .clone()
            .ok_or(WorkerError::SessionUnavailable("outbound"))
    }

    /// Drops both sessions. Safe to call repeatedly.
    pub async fn close(&self) {
        let coordinator = self.coordinator.write().await.take();
        let outbound = self.outbound.write().await.take();
        if coordinator.is_some() || outbound.is_some() {
            debug!("HTTP sessions closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.coordinator.read().await.is_none() && self.outbound.read().await.is_none()
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> WorkerResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WorkerError::config_error(format!("invalid header name {name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            WorkerError::config_error(format!("invalid value for header {name:?}: {e}"))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
