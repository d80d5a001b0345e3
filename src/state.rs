use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::Session;
use crate::models::driver::Driver;
use crate::models::incident::{EmergencyAlert, IncidentReport};
use crate::models::ledger::{DeclineRecord, EarningsEntry};
use crate::models::order::{Order, OrderEvent};
use crate::observability::metrics::Metrics;

/// The document collections plus the live-event fan-out. One `AppState`
/// is shared by every handler and every WebSocket subscriber.
pub struct AppState {
    pub drivers: DashMap<String, Driver>,
    pub orders: DashMap<Uuid, Order>,
    pub earnings: DashMap<Uuid, EarningsEntry>,
    pub order_declines: DashMap<Uuid, DeclineRecord>,
    pub incidents: DashMap<Uuid, IncidentReport>,
    pub emergencies: DashMap<Uuid, EmergencyAlert>,
    pub sessions: DashMap<Uuid, Session>,
    pub order_events_tx: broadcast::Sender<OrderEvent>,
    pub bcrypt_cost: u32,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, bcrypt_cost: u32) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            drivers: DashMap::new(),
            orders: DashMap::new(),
            earnings: DashMap::new(),
            order_declines: DashMap::new(),
            incidents: DashMap::new(),
            emergencies: DashMap::new(),
            sessions: DashMap::new(),
            order_events_tx,
            bcrypt_cost,
            metrics: Metrics::new(),
        }
    }
}
