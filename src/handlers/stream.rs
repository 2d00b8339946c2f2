//! Observer stream handler
//!
//! Each WebSocket connection becomes one broadcast subscription. Events are
//! forwarded as JSON text frames until either side goes away.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};

use crate::AppState;
use crate::models::{ConnectionStatus, MonitorEvent};

/// Upgrade to a WebSocket observer session
pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| observe(socket, state))
}

async fn observe(socket: WebSocket, state: AppState) {
    let mut subscription = state.broadcaster.subscribe();
    let (mut sink, mut stream) = socket.split();

    let greeting = MonitorEvent::ConnectionStatus(ConnectionStatus::connected(state.monitor.appliance()));
    if let Err(e) = send_event(&mut sink, &greeting).await {
        tracing::debug!("Observer {} closed before greeting: {}", subscription.id(), e);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            if let Err(e) = send_event(&mut sink, &event).await {
                tracing::debug!("Delivery to observer {} failed: {}", subscription.id(), e);
                break;
            }
        }
    });

    // Inbound frames are ignored; we only watch for the close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &MonitorEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => sink.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!("Failed to serialize '{}' event: {}", event.name(), e);
            Ok(())
        }
    }
}
