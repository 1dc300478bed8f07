use howl_core::action::ActionId;
use howl_core::phase::Phase;
use howl_core::role::Role;

/// What kind of target an action takes. "Living" is validated against the
/// room roster at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSpec {
    None,
    OptionalLiving,
    RequiredLiving,
}

/// One legally invokable action for a (role, phase) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub action: ActionId,
    pub target: TargetSpec,
}

const fn cap(action: ActionId, target: TargetSpec) -> Capability {
    Capability { action, target }
}

static NIGHT_WOLF: [Capability; 2] = [
    cap(ActionId::NightKill, TargetSpec::RequiredLiving),
    cap(ActionId::NightSkip, TargetSpec::None),
];
static NIGHT_SEER: [Capability; 2] = [
    cap(ActionId::NightCheck, TargetSpec::RequiredLiving),
    cap(ActionId::NightSkip, TargetSpec::None),
];
static NIGHT_WITCH: [Capability; 3] = [
    cap(ActionId::NightSave, TargetSpec::RequiredLiving),
    cap(ActionId::NightPoison, TargetSpec::RequiredLiving),
    cap(ActionId::NightSkip, TargetSpec::None),
];
static NIGHT_GUARD: [Capability; 2] = [
    cap(ActionId::NightProtect, TargetSpec::RequiredLiving),
    cap(ActionId::NightSkip, TargetSpec::None),
];
static DAY_DISCUSS_WOLF: [Capability; 4] = [
    cap(ActionId::Discuss, TargetSpec::None),
    cap(ActionId::SelfDestruct, TargetSpec::None),
    cap(ActionId::ApplySheriff, TargetSpec::None),
    cap(ActionId::VoteSheriff, TargetSpec::RequiredLiving),
];
static DAY_DISCUSS_TOWN: [Capability; 3] = [
    cap(ActionId::Discuss, TargetSpec::None),
    cap(ActionId::ApplySheriff, TargetSpec::None),
    cap(ActionId::VoteSheriff, TargetSpec::RequiredLiving),
];
static DAY_VOTE: [Capability; 1] = [cap(ActionId::Vote, TargetSpec::OptionalLiving)];
static HUNTER_WINDOW: [Capability; 1] = [cap(ActionId::HunterShoot, TargetSpec::RequiredLiving)];
static BADGE_WINDOW: [Capability; 1] = [cap(ActionId::BadgeTransfer, TargetSpec::OptionalLiving)];

/// The capability registry: the single source of truth for who may do what
/// when. The session rejects any submission whose (role, phase, action)
/// triple is absent here, so role checks are never hard-coded inline.
///
/// Two windows are additionally identity-gated by the state machine, since a
/// badge is not a role: `HunterShoot` belongs to the one dying hunter, and
/// `BadgeTransfer` to the dying sheriff whatever their role is (the table
/// grants it per-role; `Game` narrows it to the badge holder).
pub fn capabilities_for(role: Role, phase: Phase) -> &'static [Capability] {
    match phase {
        Phase::Waiting | Phase::GameOver => &[],
        Phase::Night => match role {
            Role::Werewolf => &NIGHT_WOLF,
            Role::Seer => &NIGHT_SEER,
            Role::Witch => &NIGHT_WITCH,
            Role::Guard => &NIGHT_GUARD,
            Role::Villager | Role::Hunter => &[],
        },
        Phase::DayDiscuss => match role {
            Role::Werewolf => &DAY_DISCUSS_WOLF,
            _ => &DAY_DISCUSS_TOWN,
        },
        Phase::DayVote => &DAY_VOTE,
        Phase::HunterShoot => match role {
            Role::Hunter => &HUNTER_WINDOW,
            _ => &[],
        },
        Phase::BadgeTransfer => &BADGE_WINDOW,
    }
}

/// Convenience lookup for a single action.
pub fn find(role: Role, phase: Phase, action: ActionId) -> Option<Capability> {
    capabilities_for(role, phase)
        .iter()
        .copied()
        .find(|c| c.action == action)
}
