use std::collections::HashMap;

use howl_core::ids::RoomId;

use crate::session::SessionHandle;

/// Owns the collection of live rooms: id → session handle. All room state
/// lives inside each room's session task; the registry only routes. Phase
/// rules are enforced by the sessions themselves.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, SessionHandle>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: SessionHandle) {
        self.rooms.insert(handle.room_id, handle);
    }

    pub fn handle(&self, id: RoomId) -> Option<SessionHandle> {
        self.rooms.get(&id).cloned()
    }

    pub fn handles(&self) -> Vec<SessionHandle> {
        self.rooms.values().cloned().collect()
    }

    pub fn remove(&mut self, id: RoomId) {
        self.rooms.remove(&id);
    }

    /// Drop handles whose session task has already terminated (its command
    /// channel is closed). Returns the number removed.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, h| !h.is_closed());
        before - self.rooms.len()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
