use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Structured safety report filed from the support screen. Written once with
/// `status: "pending"`; triage happens outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    pub id: Uuid,
    pub driver_id: String,
    pub kind: String,
    pub description: String,
    pub location: String,
    pub reported_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
    pub id: Uuid,
    pub driver_id: String,
    pub driver_name: String,
    pub location: GeoPoint,
    pub triggered_at: DateTime<Utc>,
}
