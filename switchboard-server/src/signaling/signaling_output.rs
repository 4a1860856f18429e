use async_trait::async_trait;
use switchboard_core::{ConnectionId, ServerEvent};

/// Outbound side of the relay. Implemented by whatever owns the sockets,
/// so the relay can address a peer by its connection id alone.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver an event to one connection. A target that is already gone is
    /// silently skipped.
    async fn send_event(&self, connection_id: &ConnectionId, event: ServerEvent);
}
