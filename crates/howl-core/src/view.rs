use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, RoomId};
use crate::log::LogEntry;
use crate::phase::Phase;
use crate::player::PlayerKind;
use crate::role::{Faction, Role};

/// Public slice of one player, as seen by some viewer. `role` is populated
/// only when the viewer is entitled to it (self, dead, game over, or wolf
/// teammate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    pub alive: bool,
    pub position: u8,
    pub online: bool,
    pub has_acted_night: bool,
    pub has_voted: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitchPotionsView {
    pub antidote: bool,
    pub poison: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeerCheckView {
    pub round: u32,
    pub target: PlayerId,
    pub is_werewolf: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WolfChatView {
    pub sender: PlayerId,
    pub content: String,
    pub round: u32,
    pub timestamp: String,
}

/// Round-1 sheriff election sub-state, shown while relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionView {
    pub open: bool,
    pub candidates: Vec<PlayerId>,
}

/// One player's legally visible slice of a room, recomputed and pushed after
/// every committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: RoomId,
    pub room_name: String,
    pub host: PlayerId,
    pub you: PlayerId,
    pub your_role: Option<Role>,
    pub phase: Phase,
    pub round: u32,
    pub paused: bool,
    pub players: Vec<PlayerView>,
    pub current_speaker: Option<PlayerId>,
    /// Whole seconds left on the phase (or current speaker) clock.
    pub deadline_secs: Option<u64>,
    pub sheriff: Option<PlayerId>,
    pub winner: Option<Faction>,
    /// Witch only.
    pub witch_potions: Option<WitchPotionsView>,
    /// Witch only, during NIGHT once the wolf consensus has settled.
    pub pending_kill: Option<PlayerId>,
    /// Seer only: the viewer's own accumulated check results.
    pub seer_checks: Vec<SeerCheckView>,
    /// Werewolves only: the private night chat.
    pub wolf_chat: Vec<WolfChatView>,
    pub election: Option<ElectionView>,
    pub log: Vec<LogEntry>,
}

/// Lobby listing entry for a joinable room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub players: usize,
    pub max_players: usize,
    pub phase: Phase,
}
