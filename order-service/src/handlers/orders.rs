//! Order lifecycle handlers.
//!
//! Each status mutation runs: load row, resolve the caller's relation to the
//! order, validate against the transition table, then apply the write guarded
//! by the row version. Rejections are expected outcomes and never mutate.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};
use service_core::error::AppError;
use service_core::middleware::{ActorContext, ActorRole};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{OrderActor, TransitionError, validate_transition},
    dtos::{
        AttachImageRequest, CreateOrderRequest, OrderDetailResponse, OrderImageResponse,
        OrderResponse, UpdateStatusForm,
    },
    models::{CreateOrder, CreateOrderItem, Order, OrderStatus},
    services::metrics,
    startup::AppState,
};

/// Resolve the caller's relation to a specific order. This is the single
/// ownership check both mutation endpoints go through.
fn order_relation(actor: &ActorContext, order: &Order) -> Option<OrderActor> {
    match actor.role {
        ActorRole::Admin => Some(OrderActor::Admin),
        ActorRole::Customer if actor.user_id == order.customer_id => Some(OrderActor::Customer),
        ActorRole::Tailor if actor.user_id == order.tailor_id => Some(OrderActor::Tailor),
        _ => None,
    }
}

fn parse_current_status(order: &Order) -> Result<OrderStatus, AppError> {
    order.current_status().ok_or_else(|| {
        tracing::error!(order_id = %order.order_id, status = %order.status, "Corrupt status on order row");
        AppError::InternalError(anyhow::anyhow!("order has an unrecognized status"))
    })
}

/// Create a new order (checkout or custom-order request).
pub async fn create_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetailResponse>), AppError> {
    if actor.role != ActorRole::Customer {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "only customers may place orders"
        )));
    }

    payload.validate()?;
    for item in &payload.items {
        item.validate()?;
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "item quantity must be positive"
            )));
        }
        if item.unit_price.is_sign_negative() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "item unit price cannot be negative"
            )));
        }
    }
    if payload.total_price.is_sign_negative() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "total price cannot be negative"
        )));
    }
    if payload.commission_amount.is_sign_negative() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "commission cannot be negative"
        )));
    }
    if payload.commission_amount > payload.total_price {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "commission cannot exceed total price"
        )));
    }

    let initial_status = if payload.require_payment {
        OrderStatus::PendingPayment
    } else {
        OrderStatus::Pending
    };

    let input = CreateOrder {
        customer_id: actor.user_id,
        customer_name: payload.customer_name,
        tailor_id: payload.tailor_id,
        description: payload.description,
        order_type: payload.order_type,
        total_price: payload.total_price,
        commission_amount: payload.commission_amount,
        due_date: payload.due_date,
        items: payload
            .items
            .into_iter()
            .map(|item| CreateOrderItem {
                product_id: item.product_id,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
    };

    tracing::info!(
        customer_id = %input.customer_id,
        tailor_id = %input.tailor_id,
        order_type = %input.order_type,
        initial_status = %initial_status,
        "Creating order"
    );

    let order = state.db.create_order(&input, initial_status).await?;
    let items = state.db.get_order_items(order.order_id).await?;

    metrics::record_order_created(&order.order_type, initial_status.as_str());

    Ok((
        StatusCode::CREATED,
        Json(OrderDetailResponse {
            order: OrderResponse::from(order),
            items: items.into_iter().map(Into::into).collect(),
        }),
    ))
}

/// Get an order with its line items. Parties to the order and admins only.
pub async fn get_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, AppError> {
    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    if order_relation(&actor, &order).is_none() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "not a party to this order"
        )));
    }

    let items = state.db.get_order_items(order_id).await?;

    Ok(Json(OrderDetailResponse {
        order: OrderResponse::from(order),
        items: items.into_iter().map(Into::into).collect(),
    }))
}

/// List the caller's own orders.
pub async fn list_orders(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = match actor.role {
        ActorRole::Customer => state.db.list_orders_for_customer(actor.user_id).await?,
        ActorRole::Tailor => state.db.list_orders_for_tailor(actor.user_id).await?,
        ActorRole::Admin => state.db.list_recent_orders(100).await?,
    };

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// Shared mutation path for update-status and cancel.
async fn apply_transition(
    state: &AppState,
    actor: &ActorContext,
    order_id: Uuid,
    requested: OrderStatus,
) -> Result<Order, AppError> {
    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    let relation = order_relation(actor, &order).ok_or_else(|| {
        metrics::record_transition_rejection("not_a_party");
        AppError::Forbidden(anyhow::anyhow!("not a party to this order"))
    })?;

    let current = parse_current_status(&order)?;

    validate_transition(current, requested, relation).map_err(|e| match e {
        TransitionError::InvalidTransition { .. } => {
            metrics::record_transition_rejection("invalid_transition");
            AppError::BadRequest(anyhow::anyhow!("{e}"))
        }
        TransitionError::NotPermitted { .. } => {
            metrics::record_transition_rejection("not_permitted");
            AppError::Forbidden(anyhow::anyhow!("{e}"))
        }
    })?;

    // A pending-payment order may only be confirmed once payment-service
    // reports a completed payment.
    if current == OrderStatus::PendingPayment && requested == OrderStatus::Confirmed {
        let payment = state.payments.order_payment_status(order_id).await?;
        if !payment.paid {
            metrics::record_transition_rejection("unpaid");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "order has not been paid"
            )));
        }
    }

    // Version-guarded write: a concurrent mutation since our read leaves no
    // matching row and surfaces as a conflict instead of a lost update.
    let updated = state
        .db
        .update_status(order_id, requested, order.version)
        .await?
        .ok_or_else(|| {
            metrics::record_transition_rejection("stale_version");
            AppError::Conflict(anyhow::anyhow!(
                "order was modified concurrently, retry with fresh state"
            ))
        })?;

    metrics::record_status_transition(current.as_str(), requested.as_str(), relation.as_str());

    Ok(updated)
}

/// `POST /orders/{id}/update-status` — advance the order through fulfillment.
pub async fn update_status(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Form(form): Form<UpdateStatusForm>,
) -> Result<Json<OrderResponse>, AppError> {
    let requested = OrderStatus::parse(&form.new_status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("unknown status '{}'", form.new_status))
    })?;

    tracing::info!(
        order_id = %order_id,
        requested = %requested,
        role = actor.role.as_str(),
        "Status transition requested"
    );

    let order = apply_transition(&state, &actor, order_id, requested).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// `POST /orders/{id}/cancel` — customer-initiated cancellation.
pub async fn cancel_order(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    tracing::info!(order_id = %order_id, role = actor.role.as_str(), "Cancellation requested");

    let order = apply_transition(&state, &actor, order_id, OrderStatus::Cancelled).await?;
    Ok(Json(OrderResponse::from(order)))
}

/// Attach a reference photo to an order.
pub async fn attach_image(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AttachImageRequest>,
) -> Result<(StatusCode, Json<OrderImageResponse>), AppError> {
    payload.validate()?;

    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    if order_relation(&actor, &order).is_none() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "not a party to this order"
        )));
    }

    let image = state.db.attach_image(order_id, &payload.url).await?;

    Ok((StatusCode::CREATED, Json(image.into())))
}

/// List an order's reference photos.
pub async fn list_images(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<OrderImageResponse>>, AppError> {
    let order = state
        .db
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    if order_relation(&actor, &order).is_none() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "not a party to this order"
        )));
    }

    let images = state.db.list_images(order_id).await?;
    Ok(Json(images.into_iter().map(Into::into).collect()))
}
