//! `/ws/progress`: pushes task events to connected clients

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::AppState;
use crate::events::ListenerHub;

pub async fn progress(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
    let hub = state.hub.clone();
    upgrade.on_upgrade(move |socket| forward_events(hub, socket))
}

/// Relay hub events to one socket until either side goes away
async fn forward_events(hub: Arc<ListenerHub>, socket: WebSocket) {
    let (id, mut events) = hub.register();
    debug!(%id, "forward_events: connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(%id, error = %e, "forward_events: failed to encode event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    // clients only listen; anything they send is ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unregister(id);
    debug!(%id, "forward_events: disconnected");
}
