//! Checkout and reconciliation flow tests. The gateway and order-service
//! are wiremock servers; the payments ledger is real.

mod common;

use common::{TEST_CUSTOMER_ID, TEST_TAILOR_ID, TestApp, sign_webhook};
use payment_service::models::CreatePayment;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn stub_order(server: &MockServer, order_id: Uuid, total: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/orders/{}", order_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "order_id": order_id,
            "customer_id": TEST_CUSTOMER_ID,
            "tailor_id": TEST_TAILOR_ID,
            "status": "pending_payment",
            "total_price": total,
        })))
        .mount(server)
        .await;
}

async fn stub_session_create(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": session_id,
            "url": format!("https://pay.example.com/c/{}", session_id),
            "status": "open",
            "paid": false,
            "amount": 100000,
            "currency": "usd",
            "reference": null,
        })))
        .mount(server)
        .await;
}

async fn stub_session_fetch(server: &MockServer, session_id: &str, paid: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/checkout/sessions/{}", session_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": session_id,
            "url": format!("https://pay.example.com/c/{}", session_id),
            "status": if paid { "complete" } else { "open" },
            "paid": paid,
            "amount": 100000,
            "currency": "usd",
            "reference": null,
        })))
        .mount(server)
        .await;
}

/// Seed a pending payment row tied to a gateway session.
async fn seed_pending_payment(app: &TestApp, order_id: Uuid, session_id: &str) {
    app.db
        .create_payment(&CreatePayment {
            order_id,
            customer_id: app.customer_id(),
            tailor_id: app.tailor_id(),
            amount: Decimal::new(100000, 2),
            payment_type: "card".to_string(),
            provider_session_id: Some(session_id.to_string()),
        })
        .await
        .expect("Failed to seed payment");
}

fn completed_event(session_id: &str) -> String {
    json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "type": "checkout.completed",
        "data": { "session_id": session_id }
    })
    .to_string()
}

#[tokio::test]
async fn process_creates_pending_payment_and_session() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    stub_order(&orders, order_id, "1000.00").await;
    stub_session_create(&gateway, "cs_proc_1").await;

    let response = app
        .get(
            &format!("/payments/process?orderId={}", order_id),
            TEST_CUSTOMER_ID,
            "customer",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["order_id"], order_id.to_string());
    assert_eq!(body["session_id"], "cs_proc_1");
    assert_eq!(body["redirect_url"], "https://pay.example.com/c/cs_proc_1");
    assert_eq!(body["amount"], "1000.00");

    // The row exists and is still pending.
    let payment = app
        .db
        .get_payment_by_session("cs_proc_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "pending");
    assert_eq!(payment.order_id, order_id);

    app.cleanup().await;
}

#[tokio::test]
async fn process_is_customer_only() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let response = app
        .get(
            &format!("/payments/process?orderId={}", Uuid::new_v4()),
            TEST_TAILOR_ID,
            "tailor",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn process_rejects_an_already_paid_order() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    stub_order(&orders, order_id, "1000.00").await;

    seed_pending_payment(&app, order_id, "cs_paid_1").await;
    let body = completed_event("cs_paid_1");
    app.post_webhook(&body, &sign_webhook(&body)).await;

    let response = app
        .get(
            &format!("/payments/process?orderId={}", order_id),
            TEST_CUSTOMER_ID,
            "customer",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn unreachable_gateway_is_a_gateway_error() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    stub_order(&orders, order_id, "1000.00").await;
    // No session stub mounted: the gateway answers 404.

    let response = app
        .get(
            &format!("/payments/process?orderId={}", order_id),
            TEST_CUSTOMER_ID,
            "customer",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Payment could not be processed. Please try again."
    );

    app.cleanup().await;
}

#[tokio::test]
async fn completed_webhook_marks_the_order_paid() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_hook_1").await;

    let body = completed_event("cs_hook_1");
    let response = app.post_webhook(&body, &sign_webhook(&body)).await;
    assert_eq!(response.status().as_u16(), 200);

    let status: serde_json::Value = app
        .client
        .get(format!(
            "{}/payments/orders/{}/status",
            app.address, order_id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["paid"], true);

    app.cleanup().await;
}

#[tokio::test]
async fn replayed_completion_webhook_is_idempotent() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_replay_1").await;

    let body = completed_event("cs_replay_1");
    let signature = sign_webhook(&body);
    assert_eq!(app.post_webhook(&body, &signature).await.status().as_u16(), 200);
    assert_eq!(app.post_webhook(&body, &signature).await.status().as_u16(), 200);

    let payment = app
        .db
        .get_payment_by_session("cs_replay_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "completed");
    assert!(app.db.order_is_paid(order_id).await.unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn webhook_with_a_bad_signature_is_rejected() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_forged_1").await;

    let body = completed_event("cs_forged_1");
    let response = app.post_webhook(&body, "deadbeef").await;
    assert_eq!(response.status().as_u16(), 401);

    // The forged delivery changed nothing.
    let payment = app
        .db
        .get_payment_by_session("cs_forged_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "pending");
    assert!(!app.db.order_is_paid(order_id).await.unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_webhook_events_are_acknowledged() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_noise_1").await;

    let body = json!({
        "id": "evt_noise",
        "type": "customer.updated",
        "data": { "session_id": "cs_noise_1" }
    })
    .to_string();
    let response = app.post_webhook(&body, &sign_webhook(&body)).await;
    assert_eq!(response.status().as_u16(), 200);

    let payment = app
        .db
        .get_payment_by_session("cs_noise_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "pending");

    app.cleanup().await;
}

#[tokio::test]
async fn failed_webhook_settles_payment_as_failed() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_fail_1").await;

    let body = json!({
        "id": "evt_fail",
        "type": "checkout.failed",
        "data": { "session_id": "cs_fail_1" }
    })
    .to_string();
    assert_eq!(app.post_webhook(&body, &sign_webhook(&body)).await.status().as_u16(), 200);

    let payment = app
        .db
        .get_payment_by_session("cs_fail_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, "failed");
    assert!(!app.db.order_is_paid(order_id).await.unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn success_redirect_completes_a_paid_session() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_sync_1").await;
    stub_session_fetch(&gateway, "cs_sync_1", true).await;

    let response = app
        .client
        .get(format!(
            "{}/payments/success?session_id=cs_sync_1",
            app.address
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "completed");
    assert!(app.db.order_is_paid(order_id).await.unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn success_redirect_does_not_trust_the_redirect_alone() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let order_id = Uuid::new_v4();
    seed_pending_payment(&app, order_id, "cs_sync_2").await;
    // The gateway still reports the session unpaid.
    stub_session_fetch(&gateway, "cs_sync_2", false).await;

    let response = app
        .client
        .get(format!(
            "{}/payments/success?session_id=cs_sync_2",
            app.address
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert!(!app.db.order_is_paid(order_id).await.unwrap());

    app.cleanup().await;
}

#[tokio::test]
async fn unpaid_order_status_reports_unpaid() {
    let gateway = MockServer::start().await;
    let orders = MockServer::start().await;
    let app = TestApp::spawn(&gateway.uri(), &orders.uri()).await;

    let status: serde_json::Value = app
        .client
        .get(format!(
            "{}/payments/orders/{}/status",
            app.address,
            Uuid::new_v4()
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["paid"], false);

    app.cleanup().await;
}
