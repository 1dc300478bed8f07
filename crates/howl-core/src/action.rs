use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::role::Role;

/// A role's private night ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    Kill,
    Check,
    Save,
    Poison,
    Protect,
    Skip,
}

/// A night action as submitted. The role is denormalized at submission time
/// so the audit trail survives later role reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightAction {
    pub actor: PlayerId,
    pub role: Role,
    pub kind: NightActionKind,
    pub target: Option<PlayerId>,
}

/// A day vote. `target: None` is an abstention: it marks the voter as having
/// voted but counts toward no one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: PlayerId,
    pub target: Option<PlayerId>,
}

/// Every action a client can invoke, named for capability lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    NightKill,
    NightCheck,
    NightSave,
    NightPoison,
    NightProtect,
    NightSkip,
    Discuss,
    Vote,
    SelfDestruct,
    HunterShoot,
    BadgeTransfer,
    ApplySheriff,
    VoteSheriff,
}

impl NightActionKind {
    pub fn action_id(self) -> ActionId {
        match self {
            NightActionKind::Kill => ActionId::NightKill,
            NightActionKind::Check => ActionId::NightCheck,
            NightActionKind::Save => ActionId::NightSave,
            NightActionKind::Poison => ActionId::NightPoison,
            NightActionKind::Protect => ActionId::NightProtect,
            NightActionKind::Skip => ActionId::NightSkip,
        }
    }
}
