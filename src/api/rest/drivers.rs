use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::order::{Address, OrderStatus, VehicleType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/me", get(get_profile).put(update_profile))
        .route("/drivers/me/stats", get(get_stats))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub insurance_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Serialize)]
pub struct DriverStats {
    pub completed_deliveries: usize,
    pub total_earnings: f64,
    pub green_score: u32,
    pub declines: usize,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .drivers
        .get(&session.uid)
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?;

    Ok(Json(driver.value().clone()))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Driver>, AppError> {
    if let Some(name) = &payload.full_name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("full name cannot be empty".to_string()));
        }
    }
    if let Some(phone) = &payload.phone_number {
        if phone.trim().is_empty() {
            return Err(AppError::Validation(
                "phone number cannot be empty".to_string(),
            ));
        }
    }

    let mut driver = state
        .drivers
        .get_mut(&session.uid)
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?;

    if let Some(name) = payload.full_name {
        driver.full_name = name.trim().to_string();
    }
    if let Some(phone) = payload.phone_number {
        driver.phone_number = phone.trim().to_string();
    }
    if let Some(vehicle_type) = payload.vehicle_type {
        driver.vehicle_type = vehicle_type;
    }
    if let Some(address) = payload.address {
        driver.address = Some(address);
    }
    if let Some(url) = payload.license_url {
        driver.license_url = Some(url);
    }
    if let Some(url) = payload.insurance_url {
        driver.insurance_url = Some(url);
    }
    if let Some(url) = payload.photo_url {
        driver.photo_url = Some(url);
    }

    Ok(Json(driver.value().clone()))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<DriverStats>, AppError> {
    let green_score = state
        .drivers
        .get(&session.uid)
        .map(|driver| driver.green_score)
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?;

    let completed_deliveries = state
        .orders
        .iter()
        .filter(|entry| {
            let order = entry.value();
            order.driver_id.as_deref() == Some(session.uid.as_str())
                && order.status == OrderStatus::Completed
        })
        .count();

    let total_earnings = state
        .earnings
        .iter()
        .filter(|entry| entry.value().driver_id == session.uid)
        .map(|entry| entry.value().amount)
        .sum();

    let declines = state
        .order_declines
        .iter()
        .filter(|entry| entry.value().driver_id == session.uid)
        .count();

    Ok(Json(DriverStats {
        completed_deliveries,
        total_earnings,
        green_score,
        declines,
    }))
}
