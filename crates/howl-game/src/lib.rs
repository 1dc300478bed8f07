//! Game rules for Howl: the per-room state machine, night-action resolution,
//! vote tallying, the role capability registry, per-agent knowledge views,
//! and the rule-based AI decision fallback.
//!
//! This crate is pure logic — no timers, no channels, no I/O. The server's
//! session actor drives it: it owns the phase deadlines and feeds every
//! submission (human or AI) through the same validated mutation path.

pub mod bot;
pub mod capability;
pub mod error;
pub mod game;
pub mod knowledge;
pub mod night;
pub mod speaker;
pub mod vote;

pub use error::GameError;
pub use game::{Game, RulesConfig, WitchPotions};
