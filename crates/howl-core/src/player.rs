use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::phase::Phase;
use crate::role::Role;

/// Whether a seat is held by a human or an AI agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    User,
    Ai,
}

/// How a player died. Recorded for the log and for the hunter rule: a
/// poisoned hunter gets no shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    WerewolfKill,
    Poison,
    Vote,
    HunterShot,
    SelfDestruct,
}

/// One recorded speech during a discussion phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speech {
    pub round: u32,
    pub phase: Phase,
    pub content: String,
    pub timestamp: String,
}

/// The authoritative player record. Connection handles live in the transport
/// layer; an AI player simply never has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub kind: PlayerKind,
    /// Assigned once at game start, immutable afterwards.
    pub role: Option<Role>,
    pub alive: bool,
    /// Seat number, 1..N, stable for the game's lifetime.
    pub position: u8,
    pub online: bool,
    pub has_acted_night: bool,
    pub has_voted: bool,
    pub death_cause: Option<DeathCause>,
    pub speeches: Vec<Speech>,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String, kind: PlayerKind, position: u8) -> Self {
        Self {
            id,
            display_name,
            kind,
            role: None,
            alive: true,
            position,
            online: kind == PlayerKind::User,
            has_acted_night: false,
            has_voted: false,
            death_cause: None,
            speeches: Vec::new(),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }

    pub fn is_wolf(&self) -> bool {
        self.role == Some(Role::Werewolf)
    }

    pub fn reset_night_flag(&mut self) {
        self.has_acted_night = false;
    }

    pub fn reset_vote_flag(&mut self) {
        self.has_voted = false;
    }
}
