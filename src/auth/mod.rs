//! Sessions and the bearer-token extractor. A session is created on login or
//! registration, carried by reference into every engine entry point, and
//! removed on logout. The uid inside it is the only authorization token the
//! lifecycle engine ever checks.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub uid: String,
    pub created_at: DateTime<Utc>,
}

pub fn create_session(state: &AppState, uid: &str) -> Session {
    let session = Session {
        token: Uuid::new_v4(),
        uid: uid.to_string(),
        created_at: Utc::now(),
    };
    state.sessions.insert(session.token, session.clone());
    session
}

pub fn revoke_session(state: &AppState, token: Uuid) {
    state.sessions.remove(&token);
}

pub fn session_from_token(state: &AppState, raw: &str) -> Result<Session, AppError> {
    let token = raw
        .parse::<Uuid>()
        .map_err(|_| AppError::Unauthorized("malformed session token".to_string()))?;

    state
        .sessions
        .get(&token)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::Unauthorized("unknown or expired session".to_string()))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))?;

        session_from_token(state, token)
    }
}
