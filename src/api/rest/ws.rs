use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::SinkExt;
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::engine::presence;
use crate::state::AppState;

/// Live feed for the dashboard map. A client gets a snapshot of every
/// driver's current presence on connect, then each driver event (pings
/// and status changes) as it happens.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// The opening frame: all driver records with their derived staleness,
/// shaped like the REST driver views so the dashboard can seed its map
/// before the first event arrives.
pub fn presence_snapshot(state: &AppState) -> Value {
    let now = Utc::now();
    let drivers: Vec<Value> = state
        .drivers
        .iter()
        .filter_map(|entry| {
            let record = entry.value();
            let mut view = serde_json::to_value(record).ok()?;
            view["stale"] = Value::Bool(presence::is_stale(record, now));
            Some(view)
        })
        .collect();

    json!({ "type": "presence_snapshot", "drivers": drivers })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.events_tx.subscribe();

    info!("websocket client connected");

    let snapshot = presence_snapshot(&state).to_string();
    if sender.send(Message::Text(snapshot.into())).await.is_err() {
        info!("websocket client disconnected");
        return;
    }

    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
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

    info!("websocket client disconnected");
}
