use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Association of one live connection with one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub user_id: UserId,
}

/// Entry of a `room-peers` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
}

/// Result of removing a member: where it was, who it was, and who is left
/// in that room right after the removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub remaining_peers: HashSet<ConnectionId>,
}
