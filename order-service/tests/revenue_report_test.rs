//! Revenue dashboard and income-statement export tests.

mod common;

use common::{TEST_CUSTOMER_ID, TEST_TAILOR_ID, TestApp, sample_order_body};

async fn deliver_sample_order(app: &TestApp, body: serde_json::Value) -> String {
    let order = app.create_order(body).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();
    app.advance_order(
        &order_id,
        &["confirmed", "processing", "shipped", "delivered"],
    )
    .await;
    order_id
}

#[tokio::test]
async fn revenue_summary_sums_delivered_orders() {
    let app = TestApp::spawn().await;

    deliver_sample_order(&app, sample_order_body()).await;

    let mut second = sample_order_body();
    second["total_price"] = serde_json::json!("500.00");
    second["commission_amount"] = serde_json::json!("50.00");
    deliver_sample_order(&app, second).await;

    // A pending order must not contribute.
    app.create_order(sample_order_body()).await;

    let summary: serde_json::Value = app
        .get("/dashboard/revenue", TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["delivered_orders"], 2);
    // 900.00 + 450.00
    assert_eq!(summary["net_revenue"], "1350.00");

    app.cleanup().await;
}

#[tokio::test]
async fn revenue_summary_rejects_non_positive_window() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/dashboard/revenue?window_days=0", TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn revenue_summary_is_tailor_only() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/dashboard/revenue", TEST_CUSTOMER_ID, "customer")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn income_statement_exports_delivered_line_items() {
    let app = TestApp::spawn().await;

    deliver_sample_order(&app, sample_order_body()).await;

    let response = app
        .get("/reports/income-statement.csv", TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("income-statement.csv")
    );

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Date,Order ID,Customer,Product,Quantity,Unit Price,Total Price,Platform Fee (10%),Net Income"
    );
    let row = lines.next().expect("expected one data row");
    assert!(row.contains("Amina Yusuf"));
    assert!(row.ends_with("100.00,900.00"), "unexpected row: {row}");
    assert!(lines.next().is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn income_statement_is_tailor_only() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/reports/income-statement.csv", TEST_CUSTOMER_ID, "customer")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    app.cleanup().await;
}

#[tokio::test]
async fn income_statement_is_empty_without_delivered_orders() {
    let app = TestApp::spawn().await;

    app.create_order(sample_order_body()).await;

    let body = app
        .get("/reports/income-statement.csv", TEST_TAILOR_ID, "tailor")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body.lines().count(), 1, "header only");

    app.cleanup().await;
}
