//! services/api/src/web/ws_handler.rs
//!
//! The activity monitor socket. Each connection gets its own monitor task:
//! incoming frame messages are fed to it and every published snapshot is
//! forwarded back to the client. The message loop works on any sink/stream
//! pair of WebSocket messages, so it can be driven without a real socket.

use crate::{
    runtime::{MonitorHandle, MonitorInput, MonitorSnapshot},
    web::{
        protocol::{frame_observation, ClientMessage, ServerMessage},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, sync::Arc, time::Duration};
use study_buddy_core::activity::ActivitySettings;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

type WsSender<S> = Arc<Mutex<S>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn monitor_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New monitor connection established");
    let (sender, receiver) = socket.split();
    serve_monitor(
        sender,
        receiver,
        app_state.activity,
        app_state.monitor_check_period,
    )
    .await;
    info!("Monitor connection closed");
}

/// Runs one monitor for the lifetime of a connection. Returns when the
/// client closes, the stream ends or errors, or a reply cannot be sent.
pub async fn serve_monitor<S, R, E>(
    sender: S,
    mut receiver: R,
    settings: ActivitySettings,
    check_period: Duration,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let ws_sender: WsSender<S> = Arc::new(Mutex::new(sender));

    let monitor = MonitorHandle::spawn(settings, check_period);
    let forward_task = tokio::spawn(forward_snapshots(monitor.subscribe(), ws_sender.clone()));

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Monitor socket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::Frame { face, hand }) => {
                    monitor.submit(MonitorInput::Frame(frame_observation(face, hand)));
                }
                Ok(ClientMessage::CameraError { message }) => {
                    monitor.send(MonitorInput::CameraError(message)).await;
                }
                Err(e) => {
                    debug!("Unreadable monitor message: {}", e);
                    let reply = ServerMessage::Error {
                        message: format!("Invalid message: {}", e),
                    };
                    if !send_message(&ws_sender, &reply).await {
                        break;
                    }
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    forward_task.abort();
    monitor.shutdown().await;
}

/// Sends the current snapshot, then one message per change until the
/// monitor stops or the client goes away.
async fn forward_snapshots<S>(mut snapshots: watch::Receiver<MonitorSnapshot>, ws_sender: WsSender<S>)
where
    S: Sink<Message> + Unpin,
{
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if !send_message(&ws_sender, &ServerMessage::from(snapshot)).await {
            break;
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

async fn send_message<S>(ws_sender: &WsSender<S>, message: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return false;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}
