use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::phase::Phase;
use crate::player::DeathCause;
use crate::role::Faction;

/// One applied death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    pub player: PlayerId,
    pub cause: DeathCause,
}

/// Structured game-log event. The log is append-only; what each viewer sees
/// is decided at serialization time (see [`LogEntry::visible_to`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogEvent {
    GameStarted { player_count: usize },
    PhaseChanged { phase: Phase },
    /// Public morning announcement. `quiet` means nobody died.
    NightResolved { deaths: Vec<Death>, quiet: bool },
    /// Private to the checking seer until the game ends.
    SeerChecked {
        seer: PlayerId,
        target: PlayerId,
        is_werewolf: bool,
    },
    VoteCast {
        voter: PlayerId,
        target: Option<PlayerId>,
    },
    VoteTied { candidates: Vec<PlayerId> },
    /// `half_votes` is the winning tally in half-vote units (a plain vote is
    /// worth 2 so the optional 1.5x sheriff vote stays integral).
    PlayerEliminated {
        player: PlayerId,
        half_votes: u32,
    },
    HunterShot { hunter: PlayerId, target: PlayerId },
    BadgeTransferred {
        from: PlayerId,
        to: Option<PlayerId>,
    },
    SheriffElected { player: PlayerId, half_votes: u32 },
    WolfSelfDestructed { player: PlayerId },
    PlayerJoined { player: PlayerId },
    PlayerLeft { player: PlayerId },
    PlayerReconnected { player: PlayerId },
    GameOver { winner: Faction },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: u32,
    pub phase: Phase,
    pub timestamp: String,
    pub event: LogEvent,
}

impl LogEntry {
    /// Whether this entry may be serialized into `viewer`'s state push.
    /// Seer check results stay private to the checking seer; `reveal_all`
    /// lifts that once the game is over.
    pub fn visible_to(&self, viewer: PlayerId, reveal_all: bool) -> bool {
        match &self.event {
            LogEvent::SeerChecked { seer, .. } => reveal_all || *seer == viewer,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(event: LogEvent) -> LogEntry {
        LogEntry {
            round: 1,
            phase: Phase::Night,
            timestamp: "0Z".into(),
            event,
        }
    }

    #[test]
    fn seer_checks_private_to_seer() {
        let seer = PlayerId::new();
        let other = PlayerId::new();
        let e = entry(LogEvent::SeerChecked {
            seer,
            target: other,
            is_werewolf: true,
        });
        assert!(e.visible_to(seer, false));
        assert!(!e.visible_to(other, false));
        assert!(e.visible_to(other, true));
    }

    #[test]
    fn public_events_visible_to_all() {
        let anyone = PlayerId::new();
        let e = entry(LogEvent::NightResolved {
            deaths: vec![],
            quiet: true,
        });
        assert!(e.visible_to(anyone, false));
    }
}
