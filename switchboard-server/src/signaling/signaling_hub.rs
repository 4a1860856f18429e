use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use switchboard_core::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Writer handles of every open socket, keyed by connection id.
#[derive(Clone, Default)]
pub struct SignalingHub {
    sockets: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl SignalingHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.sockets.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.sockets.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.sockets.len()
    }

    fn send_text(&self, connection_id: &ConnectionId, json: String) {
        let Some(socket) = self.sockets.get(connection_id) else {
            debug!("Dropping event for departed connection {}", connection_id);
            return;
        };
        if socket.send(Message::Text(json.into())).is_err() {
            debug!("Writer for {} already closed", connection_id);
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingHub {
    async fn send_event(&self, connection_id: &ConnectionId, event: ServerEvent) {
        match event.to_json() {
            Ok(json) => self.send_text(connection_id, json),
            Err(e) => error!("Failed to serialize {} event: {}", event.name(), e),
        }
    }
}
