use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use switchboard_core::{ConnectionId, Departure, Member, RoomId, UserId};
use tracing::debug;

/// Both directions of the membership index. Only the registry's own methods
/// touch it, always under the lock, so the two maps never disagree.
#[derive(Default)]
struct MembershipIndex {
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    members: HashMap<ConnectionId, Member>,
}

impl MembershipIndex {
    fn remove(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let member = self.members.remove(connection_id)?;

        let remaining_peers = match self.rooms.get_mut(&member.room_id) {
            Some(set) => {
                set.remove(connection_id);
                set.clone()
            }
            None => HashSet::new(),
        };

        if remaining_peers.is_empty() {
            self.rooms.remove(&member.room_id);
            debug!("Room '{}' is empty, dropping it", member.room_id);
        }

        Some(Departure {
            room_id: member.room_id,
            user_id: member.user_id,
            remaining_peers,
        })
    }
}

/// In-memory room membership. Every method is one atomic step: callers never
/// see a room listing a connection that the connection index does not.
#[derive(Default)]
pub struct ConnectionRegistry {
    index: Mutex<MembershipIndex>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MembershipIndex> {
        // Mutations never panic halfway, so a poisoned index is still consistent.
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `connection_id` to `room_id` and returns the members that were
    /// already there, each with its user id.
    ///
    /// A connection recorded in another room is removed from it first.
    /// Joining the room it is already in only refreshes the user id.
    pub fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        user_id: UserId,
    ) -> HashMap<ConnectionId, UserId> {
        let mut index = self.lock();

        let moving = index
            .members
            .get(&connection_id)
            .is_some_and(|m| m.room_id != room_id);
        if moving {
            index.remove(&connection_id);
        }

        let room = index.rooms.entry(room_id.clone()).or_default();
        let existing: Vec<ConnectionId> = room
            .iter()
            .filter(|c| **c != connection_id)
            .copied()
            .collect();
        room.insert(connection_id);

        let peers = existing
            .into_iter()
            .filter_map(|c| index.members.get(&c).map(|m| (c, m.user_id.clone())))
            .collect();

        index.members.insert(
            connection_id,
            Member {
                connection_id,
                room_id,
                user_id,
            },
        );

        peers
    }

    /// Removes the connection from whatever room it is in. `None` when it was
    /// not a member anywhere, in which case nothing changes.
    pub fn leave(&self, connection_id: &ConnectionId) -> Option<Departure> {
        self.lock().remove(connection_id)
    }

    pub fn peers_of(&self, room_id: &RoomId) -> HashSet<ConnectionId> {
        self.lock().rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId> {
        self.lock()
            .members
            .get(connection_id)
            .map(|m| m.user_id.clone())
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.lock()
            .members
            .get(connection_id)
            .map(|m| m.room_id.clone())
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.lock().rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.lock().members.len()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let index = self.lock();

        for (room_id, set) in &index.rooms {
            assert!(!set.is_empty(), "room '{}' left empty", room_id);
            for c in set {
                let member = index.members.get(c).expect("room lists unknown connection");
                assert_eq!(&member.room_id, room_id);
            }
        }

        for (c, member) in &index.members {
            assert_eq!(&member.connection_id, c);
            let in_rooms = index.rooms.values().filter(|s| s.contains(c)).count();
            assert_eq!(in_rooms, 1, "connection {} in {} rooms", c, in_rooms);
        }
    }
}
