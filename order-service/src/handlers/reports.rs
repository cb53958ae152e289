//! Revenue dashboard and income-statement export.
//!
//! Both endpoints get their commission math from `domain::revenue`; neither
//! recomputes a split locally.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use service_core::middleware::{ActorContext, ActorRole};

use crate::{
    domain::revenue,
    dtos::{RevenueSummaryResponse, RevenueWindowQuery},
    services::{export, metrics},
    startup::AppState,
};

/// `GET /dashboard/revenue` — a tailor's aggregate net revenue over
/// delivered orders, optionally windowed to the last N days.
pub async fn revenue_summary(
    State(state): State<AppState>,
    actor: ActorContext,
    Query(query): Query<RevenueWindowQuery>,
) -> Result<Json<RevenueSummaryResponse>, AppError> {
    if actor.role != ActorRole::Tailor {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "revenue dashboard is tailor-only"
        )));
    }

    if let Some(days) = query.window_days {
        if days <= 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "window_days must be positive"
            )));
        }
    }

    let since = query.window_days.map(|days| Utc::now() - Duration::days(days));
    let orders = state
        .db
        .delivered_orders_for_tailor(actor.user_id, since)
        .await?;

    let net_revenue: Decimal = orders
        .iter()
        .map(|o| revenue::net_revenue(o.order_id, o.total_price, o.commission_amount))
        .sum();

    Ok(Json(RevenueSummaryResponse {
        tailor_id: actor.user_id,
        window_days: query.window_days,
        delivered_orders: orders.len(),
        net_revenue,
    }))
}

/// `GET /reports/income-statement.csv` — per-line-item income statement for
/// the calling tailor's delivered orders.
pub async fn income_statement(
    State(state): State<AppState>,
    actor: ActorContext,
) -> Result<impl IntoResponse, AppError> {
    if actor.role != ActorRole::Tailor {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "income statement export is tailor-only"
        )));
    }

    let rows = state.db.income_statement_rows(actor.user_id).await?;
    let csv = export::income_statement_csv(&rows);

    metrics::record_export("csv");
    tracing::info!(tailor_id = %actor.user_id, rows = rows.len(), "Income statement exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"income-statement.csv\"",
            ),
        ],
        csv,
    ))
}
