//! Append-only side-effect records: earnings entries written on completion
//! and audit records written on every decline. Neither is ever mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::{OrderStatus, VehicleType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsEntry {
    pub id: Uuid,
    pub driver_id: String,
    pub order_id: Uuid,
    pub order_code: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineReason {
    Distance,
    Payment,
    Area,
    Weather,
    Vehicle,
    Schedule,
    Package,
    Other,
}

/// Order fields frozen at the moment of decline, so the audit trail survives
/// later edits to the order document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclinedOrderSnapshot {
    pub order_code: String,
    pub price: f64,
    pub vehicle_type: VehicleType,
    pub status_before: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclineRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: String,
    pub reason: DeclineReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub declined_at: DateTime<Utc>,
    pub order_snapshot: DeclinedOrderSnapshot,
}
