//! Real-time delivery of notification events over WebSockets.
//!
//! Connections authenticate at handshake with a bearer token; a valid token
//! joins the connection to exactly one owner-scoped delivery group. Events
//! for an owner are broadcast to all of that owner's open connections,
//! at-most-once with no acknowledgment. Disconnection drops the handle; no
//! session state survives it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::services::TokenService;
use crate::modules::events::NotificationEvent;
use crate::modules::metrics;

/// Outbound buffer per connection; slow consumers drop events past this.
const CONNECTION_BUFFER: usize = 32;

/// Handle for pushing events to one connected client.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    sender: mpsc::Sender<NotificationEvent>,
}

impl ConnectionHandle {
    fn new(sender: mpsc::Sender<NotificationEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    async fn send(&self, event: NotificationEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }
}

/// Registry of open connections grouped by owner identity.
#[derive(Default)]
pub struct RealtimeHub {
    connections: RwLock<HashMap<i32, Vec<ConnectionHandle>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn join(&self, owner_id: i32, handle: ConnectionHandle) {
        let mut connections = self.connections.write();
        connections.entry(owner_id).or_default().push(handle);

        tracing::debug!(owner_id, "Realtime connection joined");
    }

    fn leave(&self, owner_id: i32, handle: &ConnectionHandle) {
        let mut connections = self.connections.write();
        if let Some(handles) = connections.get_mut(&owner_id) {
            handles.retain(|h| h.id != handle.id);
            if handles.is_empty() {
                connections.remove(&owner_id);
            }
        }

        tracing::debug!(owner_id, "Realtime connection left");
    }

    fn handles_for(&self, owner_id: i32) -> Vec<ConnectionHandle> {
        let connections = self.connections.read();
        connections.get(&owner_id).cloned().unwrap_or_default()
    }

    /// Deliver an event to every open connection of this owner, and only
    /// this owner. Best-effort; send failures are logged and dropped.
    pub async fn broadcast(&self, owner_id: i32, event: NotificationEvent) {
        let handles = self.handles_for(owner_id);

        for handle in handles {
            if !handle.send(event.clone()).await {
                tracing::debug!(
                    owner_id,
                    event_type = event.kind.as_str(),
                    "Failed to push event to realtime connection"
                );
            }
        }
    }

    pub fn connection_count(&self, owner_id: i32) -> usize {
        let connections = self.connections.read();
        connections.get(&owner_id).map(|h| h.len()).unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        let connections = self.connections.read();
        connections.values().map(|h| h.len()).sum()
    }
}

/// Shared state for the WebSocket endpoint.
#[derive(Clone)]
pub struct RealtimeState {
    pub hub: Arc<RealtimeHub>,
    pub tokens: Arc<TokenService>,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// `GET /api/ws?token=...` — authenticate at handshake, then upgrade.
/// Missing or invalid tokens are refused before any group is joined.
pub async fn ws_handler(
    State(state): State<RealtimeState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = query.token else {
        return AppError::Unauthorized("Access token required".to_string()).into_response();
    };

    let user = match state.tokens.verify(&token) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user.id, state.hub))
}

async fn handle_socket(socket: WebSocket, owner_id: i32, hub: Arc<RealtimeHub>) {
    let (tx, mut rx) = mpsc::channel::<NotificationEvent>(CONNECTION_BUFFER);
    let handle = ConnectionHandle::new(tx);

    hub.join(owner_id, handle.clone());
    metrics::increment_socket_connections();

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    let frame = event.to_socket_json().to_string();
                    if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            msg = ws_rx.next() => match msg {
                // Delivery is one-way; inbound frames other than close are ignored
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.leave(owner_id, &handle);
    metrics::decrement_socket_connections();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::events::EventKind;

    fn event(kind: EventKind) -> NotificationEvent {
        NotificationEvent::new(kind, serde_json::json!({ "id": 1 }))
    }

    #[tokio::test]
    async fn broadcast_reaches_only_the_owners_connections() {
        let hub = RealtimeHub::new();

        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        hub.join(7, ConnectionHandle::new(tx_a));
        hub.join(8, ConnectionHandle::new(tx_b));

        hub.broadcast(7, event(EventKind::ItemCreated)).await;

        let received = rx_a.recv().await.unwrap();
        assert_eq!(received.kind, EventKind::ItemCreated);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_fans_out_to_every_owner_connection() {
        let hub = RealtimeHub::new();

        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        hub.join(7, ConnectionHandle::new(tx1));
        hub.join(7, ConnectionHandle::new(tx2));
        assert_eq!(hub.connection_count(7), 2);

        hub.broadcast(7, event(EventKind::FileUploaded)).await;

        assert_eq!(rx1.recv().await.unwrap().kind, EventKind::FileUploaded);
        assert_eq!(rx2.recv().await.unwrap().kind, EventKind::FileUploaded);
    }

    #[tokio::test]
    async fn leave_removes_the_connection() {
        let hub = RealtimeHub::new();

        let (tx, _rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(tx);
        hub.join(7, handle.clone());
        assert_eq!(hub.total_connections(), 1);

        hub.leave(7, &handle);
        assert_eq!(hub.total_connections(), 0);

        // Broadcasting to an empty group is a no-op
        hub.broadcast(7, event(EventKind::ItemDeleted)).await;
    }
}
