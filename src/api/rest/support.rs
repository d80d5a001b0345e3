//! Safety write paths, independent of the order lifecycle. Both are
//! fire-and-forget appends: a failure is reported to the caller and never
//! retried by the service.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::auth::Session;
use crate::error::AppError;
use crate::models::incident::{EmergencyAlert, GeoPoint, IncidentReport};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/incidents", post(report_incident))
        .route("/emergencies", post(trigger_emergency))
}

#[derive(Deserialize)]
pub struct IncidentRequest {
    pub kind: String,
    pub description: String,
    pub location: String,
}

#[derive(Deserialize)]
pub struct EmergencyRequest {
    pub location: GeoPoint,
}

async fn report_incident(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<IncidentRequest>,
) -> Result<Json<IncidentReport>, AppError> {
    if payload.kind.trim().is_empty() {
        return Err(AppError::Validation(
            "incident type cannot be empty".to_string(),
        ));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation(
            "incident description cannot be empty".to_string(),
        ));
    }

    let report = IncidentReport {
        id: Uuid::new_v4(),
        driver_id: session.uid.clone(),
        kind: payload.kind.trim().to_string(),
        description: payload.description.trim().to_string(),
        location: payload.location.trim().to_string(),
        reported_at: Utc::now(),
        status: "pending".to_string(),
    };

    state.incidents.insert(report.id, report.clone());
    state
        .metrics
        .safety_reports_total
        .with_label_values(&["incident"])
        .inc();

    Ok(Json(report))
}

async fn trigger_emergency(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<EmergencyRequest>,
) -> Result<Json<EmergencyAlert>, AppError> {
    let driver_name = state
        .drivers
        .get(&session.uid)
        .map(|driver| driver.full_name.clone())
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?;

    let alert = EmergencyAlert {
        id: Uuid::new_v4(),
        driver_id: session.uid.clone(),
        driver_name,
        location: payload.location,
        triggered_at: Utc::now(),
    };

    state.emergencies.insert(alert.id, alert.clone());
    state
        .metrics
        .safety_reports_total
        .with_label_values(&["emergency"])
        .inc();

    warn!(
        driver_id = %alert.driver_id,
        latitude = alert.location.latitude,
        longitude = alert.location.longitude,
        "emergency alert triggered"
    );

    Ok(Json(alert))
}
