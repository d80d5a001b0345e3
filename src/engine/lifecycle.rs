//! Order lifecycle transitions. Each transition validates its preconditions,
//! mutates the order under its map entry lock, appends any side-effect
//! records, and pushes one event to live subscribers. Timestamps are written
//! once and never rewritten.

use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::AppError;
use crate::models::ledger::{DeclineReason, DeclineRecord, DeclinedOrderSnapshot, EarningsEntry};
use crate::models::order::{Order, OrderAction, OrderEvent, OrderStatus};
use crate::state::AppState;

/// Pending and unassigned, or the caller lost the race. Last write wins at
/// the store level; this precondition narrows the window, it does not close
/// it across replicas.
pub fn accept(state: &AppState, session: &Session, order_id: Uuid) -> Result<Order, AppError> {
    let order = apply(state, "accept", order_id, |order| {
        if order.status != OrderStatus::Pending {
            return Err(AppError::Conflict(format!(
                "order {} is not pending",
                order_id
            )));
        }
        if order.driver_id.is_some() {
            return Err(AppError::Conflict(format!(
                "order {} is already assigned",
                order_id
            )));
        }

        order.status = OrderStatus::Accepted;
        order.driver_id = Some(session.uid.clone());
        order.accepted_at.get_or_insert(Utc::now());
        Ok(OrderAction::Accepted)
    })?;

    info!(order_id = %order.id, driver_id = %session.uid, "order accepted");
    Ok(order)
}

/// Always permitted for an authenticated caller, whoever holds the order,
/// except once it has been delivered. Reverts the order to the pending pool
/// and records the decline so it is never re-offered to this driver.
pub fn decline(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
    reason: DeclineReason,
    details: Option<String>,
) -> Result<Order, AppError> {
    let now = Utc::now();
    let mut snapshot = None;

    let order = apply(state, "decline", order_id, |order| {
        if order.status == OrderStatus::Completed {
            return Err(AppError::Conflict(format!(
                "order {} is already completed",
                order_id
            )));
        }

        snapshot = Some(DeclinedOrderSnapshot {
            order_code: order.order_code.clone(),
            price: order.price,
            vehicle_type: order.vehicle_type,
            status_before: order.status,
        });

        order.status = OrderStatus::Pending;
        order.driver_id = None;
        order.declined_drivers.insert(session.uid.clone());
        order.decline_count += 1;
        order.last_declined_at = Some(now);
        Ok(OrderAction::Declined)
    })?;

    let record = DeclineRecord {
        id: Uuid::new_v4(),
        order_id: order.id,
        driver_id: session.uid.clone(),
        reason,
        details,
        declined_at: now,
        order_snapshot: snapshot.ok_or_else(|| {
            AppError::Internal("decline applied without capturing a snapshot".to_string())
        })?,
    };
    state.order_declines.insert(record.id, record);

    info!(order_id = %order.id, driver_id = %session.uid, reason = ?reason, "order declined");
    Ok(order)
}

pub fn pickup(state: &AppState, session: &Session, order_id: Uuid) -> Result<Order, AppError> {
    let order = apply(state, "pickup", order_id, |order| {
        require_assigned(order, session)?;
        if order.status != OrderStatus::Accepted {
            return Err(AppError::Conflict(format!(
                "order {} cannot be picked up from its current status",
                order_id
            )));
        }

        order.status = OrderStatus::PickedUp;
        order.picked_up_at.get_or_insert(Utc::now());
        Ok(OrderAction::PickedUp)
    })?;

    info!(order_id = %order.id, driver_id = %session.uid, "package picked up");
    Ok(order)
}

/// Set when the driver starts navigating to the drop-off.
pub fn start_transit(
    state: &AppState,
    session: &Session,
    order_id: Uuid,
) -> Result<Order, AppError> {
    let order = apply(state, "transit", order_id, |order| {
        require_assigned(order, session)?;
        if order.status != OrderStatus::PickedUp {
            return Err(AppError::Conflict(format!(
                "order {} is not picked up",
                order_id
            )));
        }

        order.status = OrderStatus::InTransit;
        Ok(OrderAction::InTransit)
    })?;

    info!(order_id = %order.id, driver_id = %session.uid, "delivery in transit");
    Ok(order)
}

/// Finishes the delivery and logs exactly one earnings entry for it.
pub fn complete(state: &AppState, session: &Session, order_id: Uuid) -> Result<Order, AppError> {
    let order = apply(state, "complete", order_id, |order| {
        require_assigned(order, session)?;
        if !matches!(order.status, OrderStatus::PickedUp | OrderStatus::InTransit) {
            return Err(AppError::Conflict(format!(
                "order {} is not out for delivery",
                order_id
            )));
        }

        order.status = OrderStatus::Completed;
        order.completed_at.get_or_insert(Utc::now());
        Ok(OrderAction::Completed)
    })?;

    let entry = EarningsEntry {
        id: Uuid::new_v4(),
        driver_id: session.uid.clone(),
        order_id: order.id,
        order_code: order.order_code.clone(),
        amount: order.price,
        date: Utc::now(),
        kind: "delivery".to_string(),
    };
    state.metrics.earnings_amount_total.inc_by(entry.amount);
    state.earnings.insert(entry.id, entry);

    info!(order_id = %order.id, driver_id = %session.uid, amount = order.price, "delivery completed");
    Ok(order)
}

fn require_assigned(order: &Order, session: &Session) -> Result<(), AppError> {
    if order.driver_id.as_deref() != Some(session.uid.as_str()) {
        return Err(AppError::Forbidden(format!(
            "order {} is not assigned to this driver",
            order.id
        )));
    }
    Ok(())
}

/// Runs a transition against the order's map entry. The closure either
/// rejects without touching the order or mutates it fully; the entry lock
/// means no reader observes a half-applied transition. The event is sent
/// after the lock is released. Outcome and latency are recorded per action
/// once the order is known to exist; a missing document is not a rejected
/// transition.
fn apply<F>(
    state: &AppState,
    action_name: &str,
    order_id: Uuid,
    transition: F,
) -> Result<Order, AppError>
where
    F: FnOnce(&mut Order) -> Result<OrderAction, AppError>,
{
    let mut entry = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;

    let start = Instant::now();
    let (action, updated) = match transition(entry.value_mut()) {
        Ok(action) => {
            let updated = entry.value().clone();
            drop(entry);
            state
                .metrics
                .observe_transition(action_name, true, start.elapsed().as_secs_f64());
            (action, updated)
        }
        Err(err) => {
            drop(entry);
            state
                .metrics
                .observe_transition(action_name, false, start.elapsed().as_secs_f64());
            return Err(err);
        }
    };

    let _ = state.order_events_tx.send(OrderEvent {
        action,
        order: updated.clone(),
    });

    Ok(updated)
}
