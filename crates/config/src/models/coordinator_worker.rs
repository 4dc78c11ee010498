use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::headers::{load_header_profile, HeaderOverrides, DEFAULT_HEADERS_PROFILE};
use crate::validation::{ConfigValidator, ValidationUtils};
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// e.g. `https://host/api/v1/jobs`
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Static auth/tenant headers sent on every coordinator request.
    pub headers: BTreeMap<String, String>,
    pub headers_file: Option<String>,
    pub headers_profile: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1/jobs".to_string(),
            timeout_seconds: 60,
            headers: BTreeMap::new(),
            headers_file: None,
            headers_profile: DEFAULT_HEADERS_PROFILE.to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Headers of the configured profile; empty when no file is configured
    /// or the file does not exist.
    pub fn profile_headers(&self) -> ConfigResult<BTreeMap<String, String>> {
        match self.headers_file {
            Some(ref path) => load_header_profile(Path::new(path), &self.headers_profile),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Profile headers, then the static `headers` table, then CLI overrides.
    pub fn merged_headers(
        &self,
        profile: BTreeMap<String, String>,
        overrides: &HeaderOverrides,
    ) -> BTreeMap<String, String> {
        let mut headers = profile;
        headers.extend(self.headers.clone());
        overrides.apply(&mut headers);
        headers
    }
}

impl ConfigValidator for CoordinatorConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_url(&self.base_url, "coordinator.base_url")?;
        ValidationUtils::validate_timeout(self.timeout_seconds, "coordinator.timeout_seconds")?;
        ValidationUtils::validate_not_empty(&self.headers_profile, "coordinator.headers_profile")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Generated at startup when absent or empty.
    pub worker_id: Option<String>,
    /// Advertised to the coordinator; jobs are still executed one at a time.
    pub max_concurrent_jobs: u32,
    pub heartbeat_interval_seconds: u64,
    pub poll_interval_seconds: f64,
    pub outbound_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: None,
            max_concurrent_jobs: 2,
            heartbeat_interval_seconds: 10,
            poll_interval_seconds: 2.0,
            outbound_timeout_seconds: 300,
        }
    }
}

impl ConfigValidator for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref id) = self.worker_id {
            if !id.is_empty() {
                ValidationUtils::validate_not_empty(id, "worker.worker_id")?;
            }
        }

        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::Validation(
                "worker.max_concurrent_jobs must be greater than 0".to_string(),
            ));
        }

        ValidationUtils::validate_timeout(
            self.heartbeat_interval_seconds,
            "worker.heartbeat_interval_seconds",
        )?;
        ValidationUtils::validate_interval(
            self.poll_interval_seconds,
            "worker.poll_interval_seconds",
        )?;
        ValidationUtils::validate_timeout(
            self.outbound_timeout_seconds,
            "worker.outbound_timeout_seconds",
        )?;
        Ok(())
    }
}
