use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use super::peer::PeerHandle;

/// In-memory map of room id to the peers currently in it.
///
/// A single lock guards the whole map. Rooms are created on first join and
/// removed under the same lock as the leave that empties them, so a room in
/// the map always has at least one member.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, HashSet<PeerHandle>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, HashSet<PeerHandle>>> {
        // Nothing under the lock can leave the map half-updated.
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `peer` to the room, creating it if needed. Returns `false` if the
    /// peer was already a member.
    pub fn join(&self, room_id: &str, peer: &PeerHandle) -> bool {
        let mut rooms = self.rooms();
        let added = rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(peer.clone());
        if added {
            debug!("Peer {} joined room {}", peer.id(), room_id);
        }
        added
    }

    /// Removes `peer` from the room and drops the room once it is empty.
    /// Returns `false` if the peer was not a member.
    pub fn leave(&self, room_id: &str, peer: &PeerHandle) -> bool {
        let mut rooms = self.rooms();
        let Some(members) = rooms.get_mut(room_id) else {
            return false;
        };

        let removed = members.remove(peer);
        if members.is_empty() {
            rooms.remove(room_id);
            debug!("Room {} is empty, removed", room_id);
        }
        removed
    }

    /// Snapshot of every member of the room other than `peer`.
    pub fn members_except(&self, room_id: &str, peer: &PeerHandle) -> Vec<PeerHandle> {
        self.rooms()
            .get(room_id)
            .map(|members| members.iter().filter(|m| *m != peer).cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms().contains_key(room_id)
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms().get(room_id).map_or(0, HashSet::len)
    }

    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }
}
