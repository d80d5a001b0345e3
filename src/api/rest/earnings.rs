use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::auth::Session;
use crate::error::AppError;
use crate::models::ledger::EarningsEntry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/earnings", get(list_earnings))
}

#[derive(Serialize)]
pub struct EarningsResponse {
    pub entries: Vec<EarningsEntry>,
    pub total: f64,
}

async fn list_earnings(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<EarningsResponse>, AppError> {
    let mut entries: Vec<EarningsEntry> = state
        .earnings
        .iter()
        .filter(|entry| entry.value().driver_id == session.uid)
        .map(|entry| entry.value().clone())
        .collect();

    entries.sort_by(|a, b| b.date.cmp(&a.date));
    let total = entries.iter().map(|entry| entry.amount).sum();

    Ok(Json(EarningsResponse { entries, total }))
}
