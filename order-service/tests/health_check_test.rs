//! Health, readiness, and metrics endpoint tests.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "order-service");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total") || body.contains("# "));

    app.cleanup().await;
}

#[tokio::test]
async fn requests_without_actor_headers_are_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/orders", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    app.cleanup().await;
}
