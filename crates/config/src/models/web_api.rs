use std::collections::BTreeMap;

use pdfgen_domain::WebApiTemplate;
use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};
use crate::ConfigResult;

/// Default WebApiJob template: fills in fields a job payload leaves out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebApiConfig {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

fn default_timeout_seconds() -> u64 {
    120
}

impl WebApiConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: default_headers(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    pub fn to_template(&self) -> WebApiTemplate {
        WebApiTemplate {
            url: self.url.clone(),
            method: self.method.to_uppercase(),
            headers: self.headers.clone(),
            timeout_seconds: self.timeout_seconds as f64,
        }
    }
}

impl ConfigValidator for WebApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        ValidationUtils::validate_url(&self.url, "web_api.url")?;
        ValidationUtils::validate_not_empty(&self.method, "web_api.method")?;
        ValidationUtils::validate_timeout(self.timeout_seconds, "web_api.timeout_seconds")?;
        Ok(())
    }
}
