/// Rejection reasons for submitted actions and room operations. Every
/// variant maps to a short machine-checkable code surfaced only to the
/// submitting player; the room is never left partially mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    NotInRoom,
    DeadActor,
    WrongPhase,
    CapabilityDenied,
    TargetRequired,
    InvalidTarget,
    DeadTarget,
    PotionSpent,
    GuardRepeat,
    NotHost,
    GameInProgress,
    BadPlayerCount(usize),
    RoomFull,
    NotCurrentSpeaker,
    NotCandidate,
    AlreadyCandidate,
    ElectionClosed,
    NotSheriff,
    NotPendingHunter,
}

impl GameError {
    /// Short machine-checkable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom => "NOT_IN_ROOM",
            Self::DeadActor => "DEAD_ACTOR",
            Self::WrongPhase => "WRONG_PHASE",
            Self::CapabilityDenied => "ILLEGAL_ACTION",
            Self::TargetRequired => "TARGET_REQUIRED",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::DeadTarget => "DEAD_TARGET",
            Self::PotionSpent => "POTION_SPENT",
            Self::GuardRepeat => "GUARD_REPEAT",
            Self::NotHost => "NOT_HOST",
            Self::GameInProgress => "GAME_IN_PROGRESS",
            Self::BadPlayerCount(_) => "BAD_PLAYER_COUNT",
            Self::RoomFull => "ROOM_FULL",
            Self::NotCurrentSpeaker => "NOT_CURRENT_SPEAKER",
            Self::NotCandidate => "NOT_CANDIDATE",
            Self::AlreadyCandidate => "ALREADY_CANDIDATE",
            Self::ElectionClosed => "ELECTION_CLOSED",
            Self::NotSheriff => "NOT_SHERIFF",
            Self::NotPendingHunter => "NOT_PENDING_HUNTER",
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInRoom => write!(f, "player is not in this room"),
            Self::DeadActor => write!(f, "dead players cannot act"),
            Self::WrongPhase => write!(f, "action not valid in the current phase"),
            Self::CapabilityDenied => write!(f, "role cannot perform this action now"),
            Self::TargetRequired => write!(f, "this action requires a target"),
            Self::InvalidTarget => write!(f, "target is not a valid player"),
            Self::DeadTarget => write!(f, "target is dead"),
            Self::PotionSpent => write!(f, "that potion has already been used"),
            Self::GuardRepeat => write!(f, "guard cannot protect the same player twice in a row"),
            Self::NotHost => write!(f, "only the host may do this"),
            Self::GameInProgress => write!(f, "game already started"),
            Self::BadPlayerCount(n) => write!(f, "unsupported player count: {n}"),
            Self::RoomFull => write!(f, "room is full"),
            Self::NotCurrentSpeaker => write!(f, "it is not your turn to speak"),
            Self::NotCandidate => write!(f, "target is not a sheriff candidate"),
            Self::AlreadyCandidate => write!(f, "already registered as a candidate"),
            Self::ElectionClosed => write!(f, "the sheriff election is closed"),
            Self::NotSheriff => write!(f, "only the sheriff may transfer the badge"),
            Self::NotPendingHunter => write!(f, "no shot window is open for this player"),
        }
    }
}

impl std::error::Error for GameError {}
