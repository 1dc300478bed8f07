//! Shared types and the wire protocol for the Howl game engine.
//!
//! Everything here is serializable and free of I/O: identifiers, roles,
//! phases, the authoritative player record, night actions and votes, the
//! typed game log, per-player sanitized views, and the MessagePack message
//! codec spoken between clients and the server.

pub mod action;
pub mod ids;
pub mod log;
pub mod net;
pub mod phase;
pub mod player;
pub mod role;
pub mod time;
pub mod view;
