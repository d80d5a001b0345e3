use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::engine::lifecycle;
use crate::engine::visibility::classify;
use crate::error::AppError;
use crate::models::ledger::DeclineReason;
use crate::models::order::{Address, Order, OrderAction, OrderEvent, OrderStatus, VehicleType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/available", get(list_available))
        .route("/orders/active", get(list_active))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/decline", post(decline_order))
        .route("/orders/:id/pickup", post(pickup_order))
        .route("/orders/:id/transit", post(transit_order))
        .route("/orders/:id/complete", post(complete_order))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_code: Option<String>,
    pub vehicle_type: VehicleType,
    pub price: f64,
    pub shipping_item: String,
    pub shipping_weight: f64,
    pub duration_minutes: u32,
    pub pickup_address: Address,
    pub delivery_address: Address,
}

/// Required reason, optional free text. Deserialization rejects a missing or
/// unknown reason before the engine is ever invoked.
#[derive(Deserialize)]
pub struct DeclineRequest {
    pub reason: DeclineReason,
    #[serde(default)]
    pub details: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.price < 0.0 {
        return Err(AppError::Validation("price cannot be negative".to_string()));
    }
    if payload.shipping_weight < 0.0 {
        return Err(AppError::Validation(
            "shipping weight cannot be negative".to_string(),
        ));
    }
    if payload.shipping_item.trim().is_empty() {
        return Err(AppError::Validation(
            "shipping item cannot be empty".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let order_code = payload
        .order_code
        .filter(|code| !code.trim().is_empty())
        .unwrap_or_else(|| format!("ORD-{}", &id.simple().to_string()[..8].to_uppercase()));

    let order = Order {
        id,
        order_code,
        status: OrderStatus::Pending,
        vehicle_type: payload.vehicle_type,
        driver_id: None,
        price: payload.price,
        shipping_item: payload.shipping_item.trim().to_string(),
        shipping_weight: payload.shipping_weight,
        duration_minutes: payload.duration_minutes,
        pickup_address: payload.pickup_address,
        delivery_address: payload.delivery_address,
        decline_count: 0,
        declined_drivers: Default::default(),
        created_at: Utc::now(),
        accepted_at: None,
        picked_up_at: None,
        completed_at: None,
        last_declined_at: None,
    };

    state.orders.insert(order.id, order.clone());
    let _ = state.order_events_tx.send(OrderEvent {
        action: OrderAction::Created,
        order: order.clone(),
    });

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.value().clone()))
}

async fn list_available(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Order>>, AppError> {
    let driver = state
        .drivers
        .get(&session.uid)
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?
        .value()
        .clone();

    let orders: Vec<Order> = state.orders.iter().map(|e| e.value().clone()).collect();
    Ok(Json(classify(&driver, orders.iter()).available))
}

async fn list_active(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Order>>, AppError> {
    let driver = state
        .drivers
        .get(&session.uid)
        .ok_or_else(|| AppError::NotFound("driver profile not found".to_string()))?
        .value()
        .clone();

    let orders: Vec<Order> = state.orders.iter().map(|e| e.value().clone()).collect();
    Ok(Json(classify(&driver, orders.iter()).active))
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::accept(&state, &session, id).map(Json)
}

async fn decline_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeclineRequest>,
) -> Result<Json<Order>, AppError> {
    let details = payload
        .details
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    lifecycle::decline(&state, &session, id, payload.reason, details).map(Json)
}

async fn pickup_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::pickup(&state, &session, id).map(Json)
}

async fn transit_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::start_transit(&state, &session, id).map(Json)
}

async fn complete_order(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    lifecycle::complete(&state, &session, id).map(Json)
}
