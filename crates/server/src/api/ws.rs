//! WebSocket support for real-time portal updates.
//!
//! The server pushes change notifications; clients re-fetch the affected
//! lists. Nothing here is load-bearing for correctness.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// An applicant was created, updated or deleted.
    ApplicantUpdate { applicant_id: String },
    /// A group changed (membership, capacity, deletion).
    GroupUpdate { group_id: String },
    /// A help ticket changed (status, priority, assignment, new message).
    TicketUpdate { ticket_id: String, status: String },
    /// A queue ticket changed.
    QueueUpdate { ticket_id: String, status: String },
    /// A queue ticket was called to a counter. Display clients announce
    /// the number; fired once per call and once per explicit recall.
    QueueCalled {
        ticket_id: String,
        queue_number: u32,
        counter_id: String,
        counter_name: String,
    },
    /// An announcement was published or edited.
    AnnouncementUpdate { announcement_id: String },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Convenience method to broadcast an applicant change.
    pub fn applicant_updated(&self, applicant_id: &str) {
        self.broadcast(WsMessage::ApplicantUpdate {
            applicant_id: applicant_id.to_string(),
        });
    }

    /// Convenience method to broadcast a group change.
    pub fn group_updated(&self, group_id: &str) {
        self.broadcast(WsMessage::GroupUpdate {
            group_id: group_id.to_string(),
        });
    }

    /// Convenience method to broadcast a ticket change.
    pub fn ticket_updated(&self, ticket_id: &str, status: &str) {
        self.broadcast(WsMessage::TicketUpdate {
            ticket_id: ticket_id.to_string(),
            status: status.to_string(),
        });
    }

    /// Convenience method to broadcast a queue ticket change.
    pub fn queue_updated(&self, ticket_id: &str, status: &str) {
        self.broadcast(WsMessage::QueueUpdate {
            ticket_id: ticket_id.to_string(),
            status: status.to_string(),
        });
    }

    /// Convenience method to broadcast a counter call announcement.
    pub fn queue_called(
        &self,
        ticket_id: &str,
        queue_number: u32,
        counter_id: &str,
        counter_name: &str,
    ) {
        self.broadcast(WsMessage::QueueCalled {
            ticket_id: ticket_id.to_string(),
            queue_number,
            counter_id: counter_id.to_string(),
            counter_name: counter_name.to_string(),
        });
    }

    /// Convenience method to broadcast an announcement change.
    pub fn announcement_updated(&self, announcement_id: &str) {
        self.broadcast(WsMessage::AnnouncementUpdate {
            announcement_id: announcement_id.to_string(),
        });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast messages
    let mut rx = state.ws_broadcaster().subscribe();

    // Track connection metrics
    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Spawn task to forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    let msg_type = match &msg {
                        WsMessage::ApplicantUpdate { .. } => "applicant_update",
                        WsMessage::GroupUpdate { .. } => "group_update",
                        WsMessage::TicketUpdate { .. } => "ticket_update",
                        WsMessage::QueueUpdate { .. } => "queue_update",
                        WsMessage::QueueCalled { .. } => "queue_called",
                        WsMessage::AnnouncementUpdate { .. } => "announcement_update",
                        WsMessage::Heartbeat { .. } => "heartbeat",
                    };
                    WS_MESSAGES_SENT.with_label_values(&[msg_type]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                    // Continue receiving - the client will catch up
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Handle incoming messages from client (ping/pong, close)
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                // We don't expect any client messages, but log them
                debug!("Received text message: {}", text);
            }
            Ok(_) => {
                // Ignore other message types
            }
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_reaches_subscriber() {
        let broadcaster = WsBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.queue_called("q-1", 7, "c-1", "Counter 1");

        let msg = rx.try_recv().expect("Should receive message");
        match msg {
            WsMessage::QueueCalled {
                queue_number,
                counter_name,
                ..
            } => {
                assert_eq!(queue_number, 7);
                assert_eq!(counter_name, "Counter 1");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers_is_fine() {
        let broadcaster = WsBroadcaster::default();
        broadcaster.ticket_updated("t-1", "open");
    }

    #[test]
    fn test_message_serialization() {
        let msg = WsMessage::TicketUpdate {
            ticket_id: "t-1".to_string(),
            status: "in_progress".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"ticket_update\""));
        assert!(json.contains("in_progress"));
    }
}
