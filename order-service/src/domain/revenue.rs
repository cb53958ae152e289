//! Revenue split calculation.
//!
//! Single home for commission math: the dashboard aggregation and the CSV
//! income-statement export both call into this module, so the two paths
//! cannot drift apart. Two commission figures exist in the business today
//! (order-level `commission_amount` vs the flat per-item platform fee); which
//! one is authoritative is an open business question, but both are computed
//! here and nowhere else.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Flat platform fee applied per line item on the income-statement export.
pub fn platform_fee_rate() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

/// Net tailor revenue for an order: `total - commission`, clamped at zero.
///
/// Commission exceeding the total is corrupt data (the invariant is enforced
/// at create time, but legacy rows may violate it); the net is reported as
/// zero rather than negative, with a data-integrity warning in the logs.
pub fn net_revenue(order_id: Uuid, total_price: Decimal, commission_amount: Decimal) -> Decimal {
    if commission_amount.is_sign_negative() {
        tracing::warn!(
            order_id = %order_id,
            commission = %commission_amount,
            "Data integrity: negative commission, treating as zero"
        );
        return total_price;
    }

    if commission_amount > total_price {
        tracing::warn!(
            order_id = %order_id,
            total = %total_price,
            commission = %commission_amount,
            "Data integrity: commission exceeds total, clamping net revenue to zero"
        );
        return Decimal::ZERO;
    }

    total_price - commission_amount
}

/// Per-line-item platform fee used by the CSV export.
pub fn item_commission(line_total: Decimal) -> Decimal {
    (line_total * platform_fee_rate()).round_dp(2)
}

/// Per-line-item net income used by the CSV export.
pub fn item_net_income(line_total: Decimal) -> Decimal {
    line_total - item_commission(line_total)
}
