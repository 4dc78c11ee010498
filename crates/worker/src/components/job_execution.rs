use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pdfgen_domain::{JobDescriptor, JobType, WebApiJob, WebApiResponse, WebApiTemplate};
use pdfgen_errors::{WorkerError, WorkerResult};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use super::SessionManager;

pub const DEFAULT_JOB_TIMEOUT_SECONDS: f64 = 120.0;

/// Response body keys copied to the top level of [`WebApiResponse`].
pub const PROMOTED_KEYS: [&str; 3] = ["pdf_url", "download_url", "file_url"];

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// String bodies are sent verbatim, not JSON-encoded.
    Raw(String),
    Empty,
}

/// A WebApiJob with every field resolved against the worker template.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    pub timeout: Duration,
}

/// Executes job payloads on the outbound session.
pub struct JobExecutionEngine {
    sessions: Arc<SessionManager>,
    template: Option<WebApiTemplate>,
}

impl JobExecutionEngine {
    pub fn new(sessions: Arc<SessionManager>, template: Option<WebApiTemplate>) -> Self {
        Self { sessions, template }
    }

    pub async fn execute_job(&self, job: &JobDescriptor) -> WorkerResult<WebApiResponse> {
        match &job.job_type {
            JobType::WebApi(web_api_job) => self.execute_web_api_job(web_api_job).await,
            JobType::Invalid { reason, .. } => {
                Err(WorkerError::invalid_payload(format!("WebApiJob: {reason}")))
            }
            JobType::Unsupported(raw) => Err(WorkerError::unsupported_job_type(raw.to_string())),
        }
    }

    /// Resolves url, method, headers, body and timeout; nothing is sent.
    /// Only url and timeout fall back to the worker template. Method and
    /// headers come from the job or the built-in defaults.
    pub fn prepare(&self, job: &WebApiJob) -> WorkerResult<PreparedRequest> {
        let template = self.template.as_ref();

        let url = job
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| template.map(|t| t.url.as_str()).filter(|url| !url.is_empty()))
            .ok_or_else(|| WorkerError::invalid_payload("WebApiJob url is not provided"))?
            .to_string();

        let method_name = job
            .method
            .as_deref()
            .unwrap_or("POST")
            .to_uppercase();
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| {
            WorkerError::invalid_payload(format!("invalid HTTP method: {method_name}"))
        })?;

        let headers = match &job.headers {
            Some(headers) => headers.clone(),
            None => {
                let mut headers = BTreeMap::new();
                headers.insert("Content-Type".to_string(), "application/json".to_string());
                headers
            }
        };

        let body = match &job.body {
            None | Some(Value::Null) => RequestBody::Empty,
            Some(Value::String(raw)) => RequestBody::Raw(raw.clone()),
            Some(other) => RequestBody::Json(other.clone()),
        };

        let timeout_seconds = job
            .timeout
            .or_else(|| template.map(|t| t.timeout_seconds))
            .unwrap_or(DEFAULT_JOB_TIMEOUT_SECONDS);
        let timeout = Duration::try_from_secs_f64(timeout_seconds).map_err(|_| {
            WorkerError::invalid_payload(format!("invalid timeout: {timeout_seconds}"))
        })?;

        Ok(PreparedRequest {
            url,
            method,
            headers,
            body,
            timeout,
        })
    }

    async fn execute_web_api_job(&self, job: &WebApiJob) -> WorkerResult<WebApiResponse> {
        let prepared = self.prepare(job)?;
        let client = self.sessions.outbound().await?;

        info!("执行WebApi任务: method={}, url={}", prepared.method, prepared.url);

        let mut request = client
            .request(prepared.method.clone(), &prepared.url)
            .timeout(prepared.timeout);
        // Headers go first so a caller-supplied Content-Type survives `.json()`.
        for (name, value) in &prepared.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match prepared.body {
            RequestBody::Json(ref value) => request.json(value),
            RequestBody::Raw(ref raw) => request.body(raw.clone()),
            RequestBody::Empty => request,
        };

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let headers = header_map_to_btree(response.headers());
        let text = response.text().await?;

        debug!(
            "WebApi任务完成: url={}, status={}, bytes={}",
            prepared.url,
            status_code,
            text.len()
        );

        Ok(normalize_response(status_code, headers, text))
    }
}

/// Decodes the body as JSON when possible (raw text otherwise) and promotes
/// the well-known link keys of a JSON object body.
pub fn normalize_response(
    status_code: u16,
    headers: BTreeMap<String, String>,
    text: String,
) -> WebApiResponse {
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

    let promoted = |key: &str| body.as_object().and_then(|map| map.get(key)).cloned();
    let [pdf_url, download_url, file_url] = PROMOTED_KEYS.map(promoted);

    WebApiResponse {
        status_code,
        headers,
        body,
        pdf_url,
        download_url,
        file_url,
    }
}

fn header_map_to_btree(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
