mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{unreachable_url, MockResponse, MockServer};
use pdfgen_domain::{
    LoadSample, ResultSubmission, WebApiTemplate, WorkerDescriptor, WorkerError,
};
use pdfgen_worker::components::{CoordinatorClient, SessionManager};
use serde_json::json;

async fn client_for(base_url: &str) -> CoordinatorClient {
    let mut headers = BTreeMap::new();
    headers.insert("Authorization".to_string(), "Bearer coordinator-token".to_string());
    headers.insert("X-Tenant-ID".to_string(), "tenant-a".to_string());
    let sessions = Arc::new(
        SessionManager::new(&headers, Duration::from_secs(5), Duration::from_secs(5)).unwrap(),
    );
    sessions.ensure_sessions().await.unwrap();
    CoordinatorClient::new(base_url, "pdf-worker-test", sessions)
}

#[tokio::test]
async fn test_register_posts_descriptor_with_coordinator_headers() {
    let coordinator = MockServer::ok().await;
    let client = client_for(&format!("{}/api/v1/jobs/", coordinator.url)).await;

    let template = WebApiTemplate::new("http://pdf/generate");
    let descriptor = WorkerDescriptor::new("pdf-worker-test", 2, Some(&template));
    client.register(&descriptor).await.unwrap();

    let requests = coordinator.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/v1/jobs/workers");
    assert_eq!(request.header("authorization"), Some("Bearer coordinator-token"));
    assert_eq!(request.header("x-tenant-id"), Some("tenant-a"));

    let body = request.json();
    assert_eq!(body["id"], "pdf-worker-test");
    assert_eq!(body["worker_type"], "WebApi");
    assert_eq!(body["max_concurrent_jobs"], 2);
    assert_eq!(
        body["supported_job_types"][0]["WebApiJob"]["url"],
        "http://pdf/generate"
    );
}

#[tokio::test]
async fn test_register_non_200_is_rejection() {
    // 201 is still not the expected status.
    let coordinator = MockServer::start(|_| {
        MockResponse::json(StatusCode::CREATED, json!({"id": "pdf-worker-test"}))
    })
    .await;
    let client = client_for(&coordinator.url).await;

    let err = client
        .register(&WorkerDescriptor::new("pdf-worker-test", 2, None))
        .await
        .unwrap_err();
    match err {
        WorkerError::CoordinatorRejected { status, .. } => assert_eq!(status, 201),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_register_unreachable_is_network_error() {
    let client = client_for(&unreachable_url()).await;
    let err = client
        .register(&WorkerDescriptor::new("pdf-worker-test", 2, None))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_update_load_payload() {
    let coordinator = MockServer::ok().await;
    let client = client_for(&coordinator.url).await;

    client.update_load(&LoadSample::synthetic(1)).await.unwrap();

    let requests = coordinator.requests_to("/workers/pdf-worker-test");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].json(),
        json!({"current_jobs": 1, "cpu_usage": 15.0, "memory_usage": 28.0})
    );
}

#[tokio::test]
async fn test_update_load_rejected_body_is_kept() {
    let coordinator =
        MockServer::start(|_| MockResponse::text(StatusCode::SERVICE_UNAVAILABLE, "busy")).await;
    let client = client_for(&coordinator.url).await;

    match client.update_load(&LoadSample::synthetic(0)).await {
        Err(WorkerError::CoordinatorRejected { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_result_path_and_payload() {
    let coordinator = MockServer::ok().await;
    let client = client_for(&coordinator.url).await;

    client
        .submit_result(&ResultSubmission::failed("job-9", "boom"))
        .await
        .unwrap();

    let requests = coordinator.requests_to("/jobs/job-9/result");
    assert_eq!(requests.len(), 1);
    let body = requests[0].json();
    assert_eq!(body["job_id"], "job-9");
    assert_eq!(body["status"], "Failed");
    assert_eq!(body["error"], "boom");
    assert!(body["result"].is_null());
    assert!(body.get("execution_time_ms").is_none());
}

#[tokio::test]
async fn test_calls_fail_once_sessions_closed() {
    let coordinator = MockServer::ok().await;
    let sessions = Arc::new(
        SessionManager::new(
            &BTreeMap::new(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    sessions.ensure_sessions().await.unwrap();
    let client = CoordinatorClient::new(coordinator.url.clone(), "w", Arc::clone(&sessions));
    sessions.close().await;

    let err = client.update_load(&LoadSample::synthetic(0)).await.unwrap_err();
    assert!(matches!(err, WorkerError::SessionUnavailable("coordinator")));
    assert!(coordinator.requests().is_empty());
}
