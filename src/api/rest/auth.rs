use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{create_session, revoke_session, Session};
use crate::error::AppError;
use crate::models::driver::{Driver, DriverStatus};
use crate::models::order::{Address, VehicleType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: Uuid,
    pub driver: Driver,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("full name cannot be empty".to_string()));
    }
    if payload.phone_number.trim().is_empty() {
        return Err(AppError::Validation(
            "phone number cannot be empty".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    let already_registered = state
        .drivers
        .iter()
        .any(|entry| entry.value().email == email);
    if already_registered {
        return Err(AppError::Conflict(format!(
            "a driver with email {email} already exists"
        )));
    }

    let password_hash = bcrypt::hash(&payload.password, state.bcrypt_cost)
        .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))?;

    let now = Utc::now();
    let driver = Driver {
        uid: Uuid::new_v4().to_string(),
        email,
        full_name: payload.full_name.trim().to_string(),
        phone_number: payload.phone_number.trim().to_string(),
        vehicle_type: payload.vehicle_type,
        address: payload.address,
        license_url: None,
        insurance_url: None,
        photo_url: None,
        status: DriverStatus::Offline,
        green_score: 0,
        created_at: now,
        last_logged_in: None,
        last_logged_out: None,
        password_hash,
    };

    state.drivers.insert(driver.uid.clone(), driver.clone());
    let session = create_session(&state, &driver.uid);

    info!(driver_id = %driver.uid, "driver registered");
    Ok(Json(AuthResponse {
        token: session.token,
        driver,
    }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = payload.email.trim().to_lowercase();

    let uid = state
        .drivers
        .iter()
        .find(|entry| entry.value().email == email)
        .map(|entry| entry.key().clone())
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    let driver = {
        let mut entry = state
            .drivers
            .get_mut(&uid)
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

        let verified = bcrypt::verify(&payload.password, &entry.password_hash)
            .map_err(|err| AppError::Internal(format!("password verification failed: {err}")))?;
        if !verified {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }

        entry.status = DriverStatus::Online;
        entry.last_logged_in = Some(Utc::now());
        entry.value().clone()
    };

    let session = create_session(&state, &uid);

    info!(driver_id = %uid, "driver logged in");
    Ok(Json(AuthResponse {
        token: session.token,
        driver,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<StatusCode, AppError> {
    if let Some(mut driver) = state.drivers.get_mut(&session.uid) {
        driver.status = DriverStatus::Offline;
        driver.last_logged_out = Some(Utc::now());
    }

    revoke_session(&state, session.token);
    info!(driver_id = %session.uid, "driver logged out");
    Ok(StatusCode::NO_CONTENT)
}
