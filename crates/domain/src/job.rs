use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

pub const WEB_API_JOB_TAG: &str = "WebApiJob";

/// A unit of work handed out by the job source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub job_type: JobType,
}

impl JobDescriptor {
    pub fn web_api(id: impl Into<String>, job: WebApiJob) -> Self {
        Self {
            id: Some(id.into()),
            job_type: JobType::WebApi(job),
        }
    }

    /// The coordinator-assigned id, or a freshly generated one when the
    /// payload carries none (or an empty string).
    pub fn resolve_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Job-type tag. The wire form is an object keyed by the variant name, e.g.
/// `{"WebApiJob": {...}}`. Unknown tags are kept verbatim so that rejecting
/// them happens at execution time, not while decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum JobType {
    WebApi(WebApiJob),
    /// The `WebApiJob` key is present but its value has the wrong shape.
    Invalid { raw: Value, reason: String },
    Unsupported(Value),
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Unsupported(Value::Object(serde_json::Map::new()))
    }
}

impl JobType {
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            JobType::WebApi(_) | JobType::Invalid { .. } => Some(WEB_API_JOB_TAG),
            JobType::Unsupported(_) => None,
        }
    }
}

impl From<Value> for JobType {
    fn from(value: Value) -> Self {
        let inner = match value.as_object().and_then(|map| map.get(WEB_API_JOB_TAG)) {
            Some(inner) => inner.clone(),
            None => return JobType::Unsupported(value),
        };

        match serde_json::from_value::<WebApiJob>(inner) {
            Ok(job) => JobType::WebApi(job),
            Err(e) => JobType::Invalid {
                raw: value,
                reason: e.to_string(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for JobType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(JobType::from)
    }
}

impl Serialize for JobType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JobType::WebApi(job) => {
                let mut map = BTreeMap::new();
                map.insert(WEB_API_JOB_TAG, job);
                map.serialize(serializer)
            }
            JobType::Invalid { raw, .. } => raw.serialize(serializer),
            JobType::Unsupported(raw) => raw.serialize(serializer),
        }
    }
}

/// "Issue one HTTP call" work item. Every field is optional on the wire;
/// a missing url or timeout falls back to the worker's template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebApiJob {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Seconds, fractions allowed.
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl WebApiJob {
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: Some(url.into()),
            method: Some("POST".to_string()),
            body: Some(body),
            ..Self::default()
        }
    }
}

/// Worker-level default for WebApiJob fields, advertised at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebApiTemplate {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_seconds: f64,
}

impl WebApiTemplate {
    pub fn new(url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            url: url.into(),
            method: "POST".to_string(),
            headers,
            timeout_seconds: 120.0,
        }
    }
}

impl From<&WebApiTemplate> for WebApiJob {
    fn from(template: &WebApiTemplate) -> Self {
        Self {
            url: Some(template.url.clone()),
            method: Some(template.method.clone()),
            headers: Some(template.headers.clone()),
            body: None,
            timeout: Some(template.timeout_seconds),
        }
    }
}
