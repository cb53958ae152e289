//! Order lifecycle integration tests: creation, the status state machine
//! over HTTP, and the optimistic-concurrency guard.

mod common;

use common::{TEST_ADMIN_ID, TEST_CUSTOMER_ID, TEST_TAILOR_ID, TestApp, sample_order_body};
use order_service::models::OrderStatus;
use uuid::Uuid;

#[tokio::test]
async fn customer_creates_order_in_pending() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["customer_id"], TEST_CUSTOMER_ID);
    assert_eq!(order["tailor_id"], TEST_TAILOR_ID);
    assert_eq!(order["version"], 0);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn tailor_cannot_create_orders() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/orders", TEST_TAILOR_ID, "tailor", &sample_order_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn create_rejects_commission_above_total() {
    let app = TestApp::spawn().await;

    let mut body = sample_order_body();
    body["commission_amount"] = serde_json::json!("1200.00");
    let response = app
        .post_json("/orders", TEST_CUSTOMER_ID, "customer", &body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn tailor_advances_order_to_delivered() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();

    app.advance_order(
        &order_id,
        &["confirmed", "processing", "shipped", "delivered"],
    )
    .await;

    let fetched: serde_json::Value = app
        .get(&format!("/orders/{}", order_id), TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "delivered");
    // TotalPrice=1000, CommissionAmount=100 -> net 900.
    assert_eq!(fetched["net_revenue"], "900.00");

    app.cleanup().await;
}

#[tokio::test]
async fn tailor_cannot_skip_to_delivered() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .post_form(
            &format!("/orders/{}/update-status", order_id),
            TEST_TAILOR_ID,
            "tailor",
            &[("newStatus", "delivered")],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Status must be unchanged.
    let fetched: serde_json::Value = app
        .get(&format!("/orders/{}", order_id), TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "pending");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_status_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .post_form(
            &format!("/orders/{}/update-status", order_id),
            TEST_TAILOR_ID,
            "tailor",
            &[("newStatus", "teleported")],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn customer_cancels_while_processing() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();
    app.advance_order(&order_id, &["confirmed", "processing"]).await;

    let response = app
        .post_form(
            &format!("/orders/{}/cancel", order_id),
            TEST_CUSTOMER_ID,
            "customer",
            &[],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let cancelled: serde_json::Value = response.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    app.cleanup().await;
}

#[tokio::test]
async fn customer_cannot_cancel_after_shipment() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();
    app.advance_order(&order_id, &["confirmed", "processing", "shipped"])
        .await;

    let response = app
        .post_form(
            &format!("/orders/{}/cancel", order_id),
            TEST_CUSTOMER_ID,
            "customer",
            &[],
        )
        .send()
        .await
        .unwrap();
    // Shipped has no Cancelled entry in the transition table.
    assert_eq!(response.status().as_u16(), 400);

    let fetched: serde_json::Value = app
        .get(&format!("/orders/{}", order_id), TEST_CUSTOMER_ID, "customer")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["status"], "shipped");

    app.cleanup().await;
}

#[tokio::test]
async fn customer_cannot_advance_fulfillment() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .post_form(
            &format!("/orders/{}/update-status", order_id),
            TEST_CUSTOMER_ID,
            "customer",
            &[("newStatus", "confirmed")],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn strangers_are_not_parties_to_the_order() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap();

    // A different tailor cannot see or advance the order.
    let other_tailor = Uuid::new_v4().to_string();
    let response = app
        .get(&format!("/orders/{}", order_id), &other_tailor, "tailor")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .post_form(
            &format!("/orders/{}/update-status", order_id),
            &other_tailor,
            "tailor",
            &[("newStatus", "confirmed")],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn admin_may_perform_table_transitions() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = order["order_id"].as_str().unwrap();

    let response = app
        .post_form(
            &format!("/orders/{}/update-status", order_id),
            TEST_ADMIN_ID,
            "admin",
            &[("newStatus", "cancelled")],
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}

#[tokio::test]
async fn missing_order_returns_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .get(
            &format!("/orders/{}", Uuid::new_v4()),
            TEST_CUSTOMER_ID,
            "customer",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn stale_version_write_is_rejected_as_conflict() {
    let app = TestApp::spawn().await;

    let order = app.create_order(sample_order_body()).await;
    let order_id = Uuid::parse_str(order["order_id"].as_str().unwrap()).unwrap();

    // Two callers read version 0; the first one wins.
    let first = app
        .db
        .update_status(order_id, OrderStatus::Confirmed, 0)
        .await
        .unwrap();
    assert!(first.is_some());

    // The second write still carries the stale version and must not apply.
    let second = app
        .db
        .update_status(order_id, OrderStatus::Processing, 0)
        .await
        .unwrap();
    assert!(second.is_none(), "stale write must be rejected");

    let current = app.db.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(current.status, "confirmed");
    assert_eq!(current.version, 1);

    app.cleanup().await;
}
