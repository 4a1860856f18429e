use switchboard_core::{ConnectionId, RoomId};

/// Where a connection stands. `Closed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unjoined,
    Joined(RoomId),
    Closed,
}

/// Per-connection state, owned by the task reading that connection's socket.
#[derive(Debug)]
pub struct PeerSession {
    connection_id: ConnectionId,
    state: ConnectionState,
}

impl PeerSession {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            state: ConnectionState::Unjoined,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn room(&self) -> Option<&RoomId> {
        match &self.state {
            ConnectionState::Joined(room_id) => Some(room_id),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    pub(crate) fn joined(&mut self, room_id: RoomId) {
        self.state = ConnectionState::Joined(room_id);
    }

    pub(crate) fn left(&mut self) {
        if !self.is_closed() {
            self.state = ConnectionState::Unjoined;
        }
    }

    pub(crate) fn closed(&mut self) {
        self.state = ConnectionState::Closed;
    }
}
