use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};
use crate::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// `pretty` or `json`
    pub log_format: String,
    /// Prometheus scrape listener, disabled when unset.
    pub metrics_bind_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_bind_address: None,
        }
    }
}

impl ObservabilityConfig {
    pub fn metrics_socket_addr(&self) -> ConfigResult<Option<SocketAddr>> {
        match self.metrics_bind_address {
            Some(ref addr) => addr.parse::<SocketAddr>().map(Some).map_err(|e| {
                ConfigError::Validation(format!(
                    "observability.metrics_bind_address is not a socket address: {e}"
                ))
            }),
            None => Ok(None),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.log_level, "observability.log_level")?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log level: {}. Valid levels: {:?}",
                self.log_level, valid_log_levels
            )));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log format: {}. Valid formats: {:?}",
                self.log_format, valid_formats
            )));
        }

        self.metrics_socket_addr()?;
        Ok(())
    }
}
