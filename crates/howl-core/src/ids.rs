use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque server-generated identifier for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque server-generated identifier for a player. Clients never mint these;
/// the server issues one at join time and the transport layer maps each live
/// connection back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = RoomId::new();
        let parsed = RoomId::parse(&id.to_string());
        assert_eq!(parsed, Some(id));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(RoomId::parse("not-a-uuid").is_none());
        assert!(PlayerId::parse("").is_none());
    }
}
