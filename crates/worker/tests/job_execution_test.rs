mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{MockResponse, MockServer};
use pdfgen_domain::{JobDescriptor, JobType, WebApiJob, WebApiTemplate, WorkerError};
use pdfgen_worker::components::{JobExecutionEngine, SessionManager};
use serde_json::json;

async fn engine(template: Option<WebApiTemplate>) -> JobExecutionEngine {
    let mut coordinator_headers = BTreeMap::new();
    coordinator_headers.insert("Authorization".to_string(), "Bearer secret".to_string());
    let sessions = Arc::new(
        SessionManager::new(
            &coordinator_headers,
            Duration::from_secs(5),
            Duration::from_secs(30),
        )
        .unwrap(),
    );
    sessions.ensure_sessions().await.unwrap();
    JobExecutionEngine::new(sessions, template)
}

#[tokio::test]
async fn test_web_api_job_json_body_and_pdf_url_promotion() {
    let target = MockServer::start(|_| {
        MockResponse::json(
            StatusCode::OK,
            json!({"pdf_url": "http://files/r1.pdf", "pages": 3}),
        )
    })
    .await;

    let job = JobDescriptor::web_api(
        "job-1",
        WebApiJob::post(format!("{}/generate", target.url), json!({"report_id": "r1"})),
    );
    let response = engine(None).await.execute_job(&job).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.pdf_url, Some(json!("http://files/r1.pdf")));
    assert_eq!(response.body["pages"], 3);
    assert!(response.download_url.is_none());
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );

    let requests = target.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/generate");
    assert_eq!(requests[0].json(), json!({"report_id": "r1"}));
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_outbound_calls_do_not_carry_coordinator_headers() {
    let target = MockServer::ok().await;
    let job = JobDescriptor::web_api("job-1", WebApiJob::post(target.url.clone(), json!({})));

    engine(None).await.execute_job(&job).await.unwrap();

    assert_eq!(target.requests()[0].header("authorization"), None);
}

#[tokio::test]
async fn test_string_body_is_sent_verbatim() {
    let target = MockServer::ok().await;
    let job = JobDescriptor::web_api(
        "job-raw",
        WebApiJob {
            url: Some(target.url.clone()),
            method: Some("put".to_string()),
            headers: Some(BTreeMap::from([(
                "Content-Type".to_string(),
                "text/plain".to_string(),
            )])),
            body: Some(json!("<html>report</html>")),
            timeout: Some(10.0),
        },
    );

    engine(None).await.execute_job(&job).await.unwrap();

    let request = &target.requests()[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.body, "<html>report</html>");
    assert_eq!(request.header("content-type"), Some("text/plain"));
}

#[tokio::test]
async fn test_non_json_response_is_kept_as_text() {
    let target =
        MockServer::start(|_| MockResponse::text(StatusCode::INTERNAL_SERVER_ERROR, "boom")).await;
    let job = JobDescriptor::web_api("job-1", WebApiJob::post(target.url.clone(), json!({})));

    // A non-2xx answer from the target is still a normalized response.
    let response = engine(None).await.execute_job(&job).await.unwrap();
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, json!("boom"));
    assert!(response.pdf_url.is_none());
}

#[tokio::test]
async fn test_download_and_file_url_promotion() {
    let target = MockServer::start(|_| {
        MockResponse::json(
            StatusCode::OK,
            json!({"download_url": "http://d", "file_url": "http://f"}),
        )
    })
    .await;
    let job = JobDescriptor::web_api("job-1", WebApiJob::post(target.url.clone(), json!({})));

    let response = engine(None).await.execute_job(&job).await.unwrap();
    assert_eq!(response.download_url, Some(json!("http://d")));
    assert_eq!(response.file_url, Some(json!("http://f")));
    assert!(response.pdf_url.is_none());
}

#[tokio::test]
async fn test_template_supplies_url_but_not_method_or_headers() {
    let target = MockServer::ok().await;
    let mut template = WebApiTemplate::new(format!("{}/template", target.url));
    template.method = "PUT".to_string();
    template
        .headers
        .insert("X-Api-Key".to_string(), "key-1".to_string());

    let job = JobDescriptor::web_api(
        "job-1",
        WebApiJob {
            body: Some(json!({"a": 1})),
            ..WebApiJob::default()
        },
    );
    engine(Some(template)).await.execute_job(&job).await.unwrap();

    let request = &target.requests()[0];
    assert_eq!(request.path, "/template");
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("x-api-key"), None);
    assert_eq!(request.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_fractional_job_timeout_decodes_and_applies() {
    let target =
        MockServer::start(|_| MockResponse::ok().delayed(Duration::from_secs(3))).await;
    let job: JobDescriptor = serde_json::from_value(json!({
        "id": "job-frac",
        "job_type": {"WebApiJob": {"url": target.url.clone(), "timeout": 0.5}}
    }))
    .unwrap();

    let started = std::time::Instant::now();
    let err = engine(None).await.execute_job(&job).await.unwrap_err();
    assert!(matches!(err, WorkerError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_missing_url_sends_nothing() {
    let err = engine(None)
        .await
        .execute_job(&JobDescriptor::web_api("job-1", WebApiJob::default()))
        .await
        .unwrap_err();
    assert!(err.is_job_rejection());
    assert!(err.to_string().contains("WebApiJob url is not provided"));
}

#[tokio::test]
async fn test_invalid_and_unsupported_payloads() {
    let engine = engine(None).await;

    let invalid: JobDescriptor =
        serde_json::from_value(json!({"id": "j", "job_type": {"WebApiJob": "nope"}})).unwrap();
    assert!(matches!(
        engine.execute_job(&invalid).await,
        Err(WorkerError::InvalidJobPayload(_))
    ));

    let unsupported = JobDescriptor {
        id: Some("j".to_string()),
        job_type: JobType::Unsupported(json!({"ShellJob": {"command": "ls"}})),
    };
    let err = engine.execute_job(&unsupported).await.unwrap_err();
    assert!(matches!(err, WorkerError::UnsupportedJobType(_)));
    assert!(err.to_string().contains("ShellJob"));
}

#[tokio::test]
async fn test_job_timeout_is_applied() {
    let target =
        MockServer::start(|_| MockResponse::ok().delayed(Duration::from_secs(3))).await;
    let job = JobDescriptor::web_api(
        "job-slow",
        WebApiJob {
            url: Some(target.url.clone()),
            timeout: Some(1.0),
            ..WebApiJob::default()
        },
    );

    let err = engine(None).await.execute_job(&job).await.unwrap_err();
    assert!(matches!(err, WorkerError::Timeout(_)));
}
