//! Coordinator header profiles.
//!
//! A headers file maps profile names to header sets:
//!
//! ```json
//! { "platform_admin": { "headers": { "X-Test-User-Id": "1", "X-Tenant-ID": "t1" } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, ConfigResult};

pub const DEFAULT_HEADERS_PROFILE: &str = "platform_admin";

/// Loads the headers of `profile`. A missing file yields an empty map.
pub fn load_header_profile(path: &Path, profile: &str) -> ConfigResult<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content).map_err(|e| {
        ConfigError::Parse(format!("cannot parse headers file {}: {e}", path.display()))
    })?;

    let profile_data = match data.get(profile) {
        Some(profile_data) if !is_empty(profile_data) => profile_data,
        _ => {
            return Err(ConfigError::Configuration(format!(
                "headers file {} has no profile '{profile}'",
                path.display()
            )))
        }
    };

    let headers = profile_data
        .get("headers")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ConfigError::Validation(format!("profile '{profile}' headers field is not an object"))
        })?;

    Ok(headers
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), value)
        })
        .collect())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Identity headers supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct HeaderOverrides {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub roles: Option<String>,
    pub tenant_id: Option<String>,
}

impl HeaderOverrides {
    /// Empty values never override.
    pub fn apply(&self, headers: &mut BTreeMap<String, String>) {
        let mapping = [
            ("X-Test-User-Id", &self.user_id),
            ("X-Test-User-Name", &self.user_name),
            ("X-Test-User-Roles", &self.roles),
            ("X-Tenant-ID", &self.tenant_id),
        ];

        for (header_name, value) in mapping {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                headers.insert(header_name.to_string(), value.to_string());
            }
        }
    }
}
