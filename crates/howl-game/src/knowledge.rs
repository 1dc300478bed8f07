use howl_core::ids::PlayerId;
use howl_core::phase::Phase;
use howl_core::role::Role;

use crate::game::{Game, WitchPotions};
use crate::night::SeerCheck;

/// Public facts about one living player — what anyone at the table can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPlayer {
    pub id: PlayerId,
    pub position: u8,
    pub speech_count: usize,
}

/// A read-only snapshot of exactly what one agent is entitled to know.
/// Decision code never touches the authoritative room: werewolves learn
/// their teammates, the witch learns tonight's victim, the seer keeps its
/// own results, and nobody reads anyone else's role.
#[derive(Debug, Clone)]
pub struct KnowledgeView {
    pub me: PlayerId,
    pub role: Role,
    pub round: u32,
    pub phase: Phase,
    /// Every living player, self included.
    pub living: Vec<KnownPlayer>,
    /// Fellow living werewolves (wolves only, self excluded).
    pub teammates: Vec<PlayerId>,
    /// Tonight's settled kill target (witch only, during NIGHT).
    pub pending_kill: Option<PlayerId>,
    /// Remaining potions (witch only).
    pub potions: Option<WitchPotions>,
    /// Last night's protection target (guard only).
    pub last_protected: Option<PlayerId>,
    /// Own accumulated check results (seer only).
    pub my_checks: Vec<SeerCheck>,
}

impl KnowledgeView {
    /// Build the view for one player. Returns `None` before roles exist or
    /// for ids not in the room.
    pub fn for_player(game: &Game, id: PlayerId) -> Option<Self> {
        let me = game.player(id)?;
        let role = me.role?;

        let living = game
            .living()
            .map(|p| KnownPlayer {
                id: p.id,
                position: p.position,
                speech_count: p.speeches.len(),
            })
            .collect();

        let teammates = if role == Role::Werewolf {
            game.living_wolves()
                .filter(|p| p.id != id)
                .map(|p| p.id)
                .collect()
        } else {
            Vec::new()
        };

        let is_witch = role == Role::Witch;
        Some(Self {
            me: id,
            role,
            round: game.round,
            phase: game.phase,
            living,
            teammates,
            pending_kill: if is_witch && game.phase == Phase::Night {
                game.pending_kill
            } else {
                None
            },
            potions: is_witch.then_some(game.potions),
            last_protected: (role == Role::Guard).then(|| game.guard_last_target()).flatten(),
            my_checks: if role == Role::Seer {
                game.seer_checks_for(id)
            } else {
                Vec::new()
            },
        })
    }

    /// Living players other than the agent itself.
    pub fn living_others(&self) -> impl Iterator<Item = &KnownPlayer> {
        self.living.iter().filter(move |p| p.id != self.me)
    }
}
