use axum::{
    body::Bytes,
    extract::{State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, timeout};
use tracing::{debug, info};

use crate::domain::services::fanout::{SeatEvent, SeatUpdate};
use crate::domain::services::seating::seat_status_map;
use crate::state::AppState;

const HELLO_TIMEOUT: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct HelloFrame {
    role: String,
    token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    // First client frame must be the hello.
    let hello = match timeout(HELLO_TIMEOUT, socket.recv()).await {
        Ok(Some(Ok(Message::Text(text)))) => serde_json::from_str::<HelloFrame>(text.as_str()).ok(),
        _ => None,
    };
    let Some(hello) = hello else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    // Admin role requires a valid session token, otherwise downgrade to student.
    let mut is_admin = false;
    if hello.role == "admin"
        && let Some(token) = &hello.token
        && state.auth_service.authenticate(token).await.is_ok() {
        is_admin = true;
    }
    info!("WebSocket client connected (admin: {})", is_admin);

    // Initial snapshot so the client starts from a consistent picture.
    if let Ok(active) = state.booking_repo.list_active().await {
        let updates: Vec<SeatUpdate> = seat_status_map(&active)
            .into_iter()
            .map(|e| SeatUpdate { seat: e.seat, status: e.status })
            .collect();
        if send_event(&mut socket, &SeatEvent::SeatsChanged { updates }).await.is_err() {
            return;
        }
    }

    let mut public_rx = state.fanout.subscribe_public();
    let mut admin_rx = state.fanout.subscribe_admin();
    let mut ping = interval(PING_INTERVAL);
    // first tick of an interval fires immediately
    ping.tick().await;

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {}
            },
            event = public_rx.recv() => match event {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() { break; }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("WebSocket client lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            event = admin_rx.recv(), if is_admin => match event {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() { break; }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = ping.tick() => {
                if socket.send(Message::Ping(Bytes::new())).await.is_err() { break; }
            }
        }
    }

    debug!("WebSocket client disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &SeatEvent) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).unwrap_or_default();
    socket.send(Message::Text(json.into())).await
}
