use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Bicycle,
    Scooter,
    Car,
    Van,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "picked-up")]
    PickedUp,
    #[serde(rename = "in-transit")]
    InTransit,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "declined")]
    Declined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_code: String,
    pub status: OrderStatus,
    pub vehicle_type: VehicleType,
    pub driver_id: Option<String>,
    pub price: f64,
    pub shipping_item: String,
    pub shipping_weight: f64,
    pub duration_minutes: u32,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub decline_count: u32,
    pub declined_drivers: HashSet<String>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_declined_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Store invariant: an order carries a driver exactly while it is
    /// somewhere between accepted and completed.
    pub fn assignment_consistent(&self) -> bool {
        let assigned_status = matches!(
            self.status,
            OrderStatus::Accepted
                | OrderStatus::PickedUp
                | OrderStatus::InTransit
                | OrderStatus::Completed
        );
        self.driver_id.is_some() == assigned_status
    }
}

/// What just happened to an order; pushed to live subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Created,
    Accepted,
    Declined,
    PickedUp,
    InTransit,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub action: OrderAction,
    pub order: Order,
}
