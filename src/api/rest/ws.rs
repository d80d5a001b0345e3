//! Live order subscription. Each connected driver gets the transition events
//! that matter to them: orders they could take and orders they hold. The
//! broadcast receiver is dropped when the socket closes, so a disconnected
//! client leaks nothing.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{session_from_token, Session};
use crate::engine::visibility::is_available_to;
use crate::models::order::OrderEvent;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let session = match session_from_token(&state, &params.token) {
        Ok(session) => session,
        Err(err) => return err.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
        .into_response()
}

fn event_concerns_driver(state: &AppState, session: &Session, event: &OrderEvent) -> bool {
    if event.order.driver_id.as_deref() == Some(session.uid.as_str()) {
        return true;
    }

    state
        .drivers
        .get(&session.uid)
        .map(|driver| is_available_to(&event.order, driver.value()))
        .unwrap_or(false)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: Session) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.order_events_tx.subscribe();

    state.metrics.ws_subscribers.inc();
    info!(driver_id = %session.uid, "live subscription opened");

    let filter_state = state.clone();
    let filter_session = session.clone();
    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if !event_concerns_driver(&filter_state, &filter_session, &event) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize order event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.metrics.ws_subscribers.dec();
    info!(driver_id = %session.uid, "live subscription closed");
}
