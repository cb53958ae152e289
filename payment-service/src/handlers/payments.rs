//! Checkout and reconciliation handlers.
//!
//! A payment is settled by whichever of the two reconciliation paths runs
//! first: the gateway webhook or the synchronous success redirect. The
//! settlement write only touches pending rows, so the second path is a no-op.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use service_core::error::AppError;
use service_core::middleware::{ActorContext, ActorRole};
use uuid::Uuid;

use crate::{
    dtos::{
        OrderPaymentStatusResponse, PaymentResponse, ProcessQuery, ProcessResponse, SuccessQuery,
    },
    models::{CreatePayment, PaymentStatus},
    services::metrics,
    startup::AppState,
};

const CHECKOUT_CURRENCY: &str = "usd";

/// `GET /payments/process?orderId=` — start a checkout for an order.
///
/// Creates a pending payment row tied to a fresh gateway session and hands
/// back the hosted payment page URL.
pub async fn process_payment(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<ProcessQuery>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    if actor.role != ActorRole::Customer {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "only customers may pay for orders"
        )));
    }

    let order = state.orders.get_order(&actor, query.order_id).await?;

    if state.db.order_is_paid(order.order_id).await? {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "order is already paid"
        )));
    }

    let session = state
        .gateway
        .create_checkout_session(order.order_id, order.total_price, CHECKOUT_CURRENCY)
        .await
        .map_err(|e| {
            tracing::error!(order_id = %order.order_id, error = %e, "Checkout session creation failed");
            AppError::GatewayError("checkout session creation failed".to_string())
        })?;

    let payment = state
        .db
        .create_payment(&CreatePayment {
            order_id: order.order_id,
            customer_id: order.customer_id,
            tailor_id: order.tailor_id,
            amount: order.total_price,
            payment_type: "card".to_string(),
            provider_session_id: Some(session.id.clone()),
        })
        .await?;

    metrics::record_session_created(&payment.payment_type);
    tracing::info!(
        payment_id = %payment.payment_id,
        order_id = %payment.order_id,
        session_id = %session.id,
        "Checkout started"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProcessResponse {
            payment_id: payment.payment_id,
            order_id: payment.order_id,
            session_id: session.id,
            redirect_url: session.url,
            amount: payment.amount,
        }),
    ))
}

/// `POST /payments/webhook` — gateway event delivery.
///
/// The signature covers the raw body, so the body is taken as a `String`
/// and only parsed after verification.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get("X-Checkout-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing X-Checkout-Signature header");
            AppError::Unauthorized(anyhow::anyhow!("Missing webhook signature"))
        })?;

    let is_valid = state
        .gateway
        .verify_webhook_signature(&body, signature)
        .map_err(|e| {
            tracing::error!(error = %e, "Webhook signature verification error");
            AppError::InternalError(anyhow::anyhow!("Webhook verification failed"))
        })?;

    if !is_valid {
        tracing::warn!("Invalid webhook signature");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid webhook signature"
        )));
    }

    let event = state.gateway.parse_webhook_event(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse webhook event");
        AppError::BadRequest(anyhow::anyhow!("Invalid webhook payload"))
    })?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        session_id = %event.data.session_id,
        "Processing gateway webhook"
    );

    let settled_status = match event.event_type.as_str() {
        "checkout.completed" => Some(PaymentStatus::Completed),
        "checkout.failed" => Some(PaymentStatus::Failed),
        _ => {
            // Unknown events are acknowledged so the gateway stops retrying.
            tracing::debug!(event_type = %event.event_type, "Unhandled webhook event type");
            metrics::record_webhook_event(&event.event_type, "ignored");
            None
        }
    };

    if let Some(status) = settled_status {
        match state
            .db
            .settle_payment_by_session(&event.data.session_id, status)
            .await?
        {
            Some(payment) => {
                metrics::record_webhook_event(&event.event_type, "applied");
                metrics::record_settlement(&payment.status, "webhook");
            }
            None => {
                tracing::warn!(
                    session_id = %event.data.session_id,
                    "Webhook references an unknown checkout session"
                );
                metrics::record_webhook_event(&event.event_type, "unknown_session");
            }
        }
    }

    Ok(StatusCode::OK)
}

/// `GET /payments/success?session_id=` — synchronous reconciliation on the
/// customer's return from checkout. The gateway is re-queried; the payment
/// completes only if the gateway itself says it was paid.
pub async fn payment_success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state
        .db
        .get_payment_by_session(&query.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;

    let session = state
        .gateway
        .get_session(&query.session_id)
        .await
        .map_err(|e| {
            tracing::error!(session_id = %query.session_id, error = %e, "Session lookup failed");
            AppError::GatewayError("checkout session lookup failed".to_string())
        })?;

    if !session.paid {
        tracing::warn!(
            session_id = %query.session_id,
            session_status = %session.status,
            "Success redirect for an unpaid session"
        );
        return Ok(Json(payment.into()));
    }

    let settled = state
        .db
        .settle_payment_by_session(&query.session_id, PaymentStatus::Completed)
        .await?
        .unwrap_or(payment);

    metrics::record_settlement(&settled.status, "success_redirect");
    tracing::info!(
        payment_id = %settled.payment_id,
        order_id = %settled.order_id,
        "Payment reconciled via success redirect"
    );

    Ok(Json(settled.into()))
}

/// `GET /payments/orders/{order_id}/status` — paid/unpaid summary.
/// Service-to-service endpoint consumed by order-service.
pub async fn order_payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderPaymentStatusResponse>, AppError> {
    let paid = state.db.order_is_paid(order_id).await?;

    Ok(Json(OrderPaymentStatusResponse { order_id, paid }))
}

/// `GET /payments/orders/{order_id}` — an order's payment history.
/// Parties see their own orders; this trusts the BFF's party resolution.
pub async fn list_order_payments(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let payments = state.db.list_payments_for_order(order_id).await?;

    let visible = payments
        .into_iter()
        .filter(|p| match actor.role {
            ActorRole::Admin => true,
            ActorRole::Customer => p.customer_id == actor.user_id,
            ActorRole::Tailor => p.tailor_id == actor.user_id,
        })
        .map(Into::into)
        .collect();

    Ok(Json(visible))
}
