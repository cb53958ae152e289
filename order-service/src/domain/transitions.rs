//! Order status state machine.
//!
//! Every status mutation is gated through the fixed transition table and an
//! actor check before anything touches the database. The functions here are
//! pure; the atomic write itself lives in the repository (versioned UPDATE).

use crate::models::OrderStatus;
use thiserror::Error;

/// The caller's relation to the order being mutated, resolved once by the
/// handler layer from the authenticated actor and the loaded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    /// The order's owning customer.
    Customer,
    /// The order's fulfilling tailor.
    Tailor,
    Admin,
}

impl OrderActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderActor::Customer => "customer",
            OrderActor::Tailor => "tailor",
            OrderActor::Admin => "admin",
        }
    }
}

/// Expected rejection outcomes of a transition request. These are values the
/// handler maps to user-facing messages, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("{actor} may not move order from {from} to {to}")]
    NotPermitted {
        actor: OrderActor,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl std::fmt::Display for OrderActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal next states for a given current state.
pub fn allowed_targets(current: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match current {
        Pending => &[Confirmed, Processing, Cancelled],
        PendingPayment => &[Confirmed, Cancelled],
        Confirmed => &[Processing, Cancelled],
        Processing => &[Shipped, ReadyForPickup, Cancelled],
        Shipped => &[Delivered, ReadyForPickup],
        ReadyForPickup => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

/// Statuses from which the owning customer may still cancel unilaterally.
/// Once the order is shipped or ready for pickup, cancellation is off the
/// table for the customer.
const CUSTOMER_CANCELLABLE: [OrderStatus; 3] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
];

/// Validate a requested status transition.
///
/// The table check runs first, so an unreachable target is always an
/// `InvalidTransition` regardless of who asks. The actor check then applies:
/// tailors drive fulfillment progress (any table entry except `Cancelled`),
/// customers may only cancel and only from pending/confirmed/processing,
/// admins may perform any table entry.
pub fn validate_transition(
    current: OrderStatus,
    requested: OrderStatus,
    actor: OrderActor,
) -> Result<(), TransitionError> {
    if !allowed_targets(current).contains(&requested) {
        return Err(TransitionError::InvalidTransition {
            from: current,
            to: requested,
        });
    }

    let permitted = match actor {
        OrderActor::Admin => true,
        OrderActor::Tailor => requested != OrderStatus::Cancelled,
        OrderActor::Customer => {
            requested == OrderStatus::Cancelled && CUSTOMER_CANCELLABLE.contains(&current)
        }
    };

    if permitted {
        Ok(())
    } else {
        Err(TransitionError::NotPermitted {
            actor,
            from: current,
            to: requested,
        })
    }
}
