use serde::{Deserialize, Serialize};

/// Room phase graph:
///
/// `Waiting → Night → DayDiscuss → DayVote → (HunterShoot) → (BadgeTransfer)
/// → Night (round+1) → … → GameOver`
///
/// `HunterShoot` and `BadgeTransfer` are interrupt windows entered only when
/// the triggering death occurred; they return to wherever the main flow was
/// headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Waiting,
    Night,
    DayDiscuss,
    DayVote,
    HunterShoot,
    BadgeTransfer,
    GameOver,
}

impl Phase {
    pub fn in_game(self) -> bool {
        !matches!(self, Phase::Waiting)
    }

    pub fn is_interrupt(self) -> bool {
        matches!(self, Phase::HunterShoot | Phase::BadgeTransfer)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Waiting => "WAITING",
            Phase::Night => "NIGHT",
            Phase::DayDiscuss => "DAY_DISCUSS",
            Phase::DayVote => "DAY_VOTE",
            Phase::HunterShoot => "HUNTER_SHOOT",
            Phase::BadgeTransfer => "BADGE_TRANSFER",
            Phase::GameOver => "GAME_OVER",
        };
        write!(f, "{name}")
    }
}
