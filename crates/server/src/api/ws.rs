//! WebSocket support for live queue displays.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use callboard_core::{CallTrigger, PriorityClass, QueueEvent, TicketCode};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Interval between heartbeats sent to connected clients.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A ticket joined the queue.
    TicketEnrolled {
        ticket_id: TicketCode,
        priority_class: PriorityClass,
        /// Position among waiting tickets (0 = next).
        position: usize,
    },
    /// A ticket became current and should be announced.
    TicketCalled {
        ticket_id: TicketCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        counter_label: Option<String>,
        trigger: CallTrigger,
    },
    /// A current ticket was sent back to waiting by a manual selection.
    TicketReturned { ticket_id: TicketCode },
    /// A ticket finished service.
    TicketArchived { ticket_id: TicketCode },
    /// Automatic dispatching was started or stopped.
    DispatcherStatus { active: bool },
    /// Server heartbeat (sent periodically to keep connection alive).
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::TicketEnrolled { .. } => "ticket_enrolled",
            WsMessage::TicketCalled { .. } => "ticket_called",
            WsMessage::TicketReturned { .. } => "ticket_returned",
            WsMessage::TicketArchived { .. } => "ticket_archived",
            WsMessage::DispatcherStatus { .. } => "dispatcher_status",
            WsMessage::Heartbeat { .. } => "heartbeat",
        }
    }
}

impl From<QueueEvent> for WsMessage {
    fn from(event: QueueEvent) -> Self {
        match event {
            QueueEvent::Enrolled {
                ticket_id,
                priority_class,
                position,
            } => WsMessage::TicketEnrolled {
                ticket_id,
                priority_class,
                position,
            },
            QueueEvent::Called {
                ticket_id,
                counter_label,
                trigger,
            } => WsMessage::TicketCalled {
                ticket_id,
                counter_label,
                trigger,
            },
            QueueEvent::Returned { ticket_id } => WsMessage::TicketReturned { ticket_id },
            QueueEvent::Archived { ticket_id } => WsMessage::TicketArchived { ticket_id },
            QueueEvent::SchedulerChanged { active } => WsMessage::DispatcherStatus { active },
        }
    }
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

    /// Relay dispatcher events to clients, with a heartbeat in between.
    ///
    /// The task ends when the dispatcher's event channel closes.
    pub fn forward(&self, mut events: broadcast::Receiver<QueueEvent>) -> JoinHandle<()> {
        let broadcaster = self.clone();
        tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            heartbeat.tick().await;

            loop {
                tokio::select! {
                    result = events.recv() => match result {
                        Ok(event) => broadcaster.broadcast(event.into()),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Event forwarder lagged, skipped {} queue events", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Queue event channel closed");
                            break;
                        }
                    },
                    _ = heartbeat.tick() => {
                        broadcaster.broadcast(WsMessage::Heartbeat {
                            timestamp: Utc::now().timestamp(),
                        });
                    }
                }
            }
        })
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

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Spawn task to forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

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
                    // Displays refetch the snapshot on the next event
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
            Ok(Message::Text(text)) => {
                debug!("Ignoring client message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}
