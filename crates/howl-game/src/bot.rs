use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use howl_core::action::NightActionKind;
use howl_core::ids::PlayerId;
use howl_core::role::Role;

use crate::knowledge::{KnowledgeView, KnownPlayer};

/// Suspicion threshold above which the fallback witch will spend the poison.
const POISON_SUSPICION_FLOOR: f32 = 85.0;

/// Behavioral trait for an AI seat. Analytical agents bias toward
/// talkativeness signals instead of pure chance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotProfile {
    pub analytical: bool,
}

/// A proposed night action. Proposals re-enter the engine through the same
/// validated submission path as human input — this module only suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightProposal {
    pub kind: NightActionKind,
    pub target: Option<PlayerId>,
}

/// Seam for a live reasoning backend. The rule-based fallback below is the
/// default implementation, used whenever no backend is configured or one
/// fails to answer in time.
pub trait DecisionBackend: Send + Sync {
    fn decide_night(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
        profile: BotProfile,
    ) -> Option<NightProposal>;

    fn decide_vote(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
        profile: BotProfile,
    ) -> Option<PlayerId>;

    fn decide_shot(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
    ) -> Option<PlayerId>;

    fn decide_badge(&self, view: &KnowledgeView) -> Option<PlayerId>;
}

/// Rules, not guesses: deterministic policies with uniform-random tie
/// breaking, operating only on the agent's legal knowledge view.
#[derive(Debug, Default)]
pub struct RuleFallback;

impl DecisionBackend for RuleFallback {
    fn decide_night(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
        profile: BotProfile,
    ) -> Option<NightProposal> {
        match view.role {
            Role::Werewolf => self.wolf_kill(view, suspicion, profile),
            Role::Seer => self.seer_check(view, suspicion),
            Role::Witch => Some(self.witch_potion(view, suspicion)),
            Role::Guard => self.guard_protect(view),
            Role::Villager | Role::Hunter => None,
        }
    }

    fn decide_vote(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
        profile: BotProfile,
    ) -> Option<PlayerId> {
        let candidates: Vec<&KnownPlayer> = view.living_others().collect();
        if candidates.is_empty() {
            return None;
        }
        if let Some(scores) = suspicion
            && !scores.is_empty()
        {
            return pick_by_score(&candidates, scores, true);
        }
        if profile.analytical {
            // Bias toward the quietest players.
            let min = candidates.iter().map(|p| p.speech_count).min()?;
            let quiet: Vec<&KnownPlayer> = candidates
                .iter()
                .copied()
                .filter(|p| p.speech_count == min)
                .collect();
            return choose(&quiet);
        }
        choose(&candidates)
    }

    fn decide_shot(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
    ) -> Option<PlayerId> {
        let candidates: Vec<&KnownPlayer> = view.living_others().collect();
        if candidates.is_empty() {
            return None;
        }
        if let Some(scores) = suspicion
            && !scores.is_empty()
        {
            return pick_by_score(&candidates, scores, true);
        }
        choose(&candidates)
    }

    fn decide_badge(&self, view: &KnowledgeView) -> Option<PlayerId> {
        let candidates: Vec<&KnownPlayer> = view.living_others().collect();
        choose(&candidates)
    }
}

impl RuleFallback {
    fn wolf_kill(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
        profile: BotProfile,
    ) -> Option<NightProposal> {
        let candidates: Vec<&KnownPlayer> = view
            .living_others()
            .filter(|p| !view.teammates.contains(&p.id))
            .collect();
        if candidates.is_empty() {
            return Some(NightProposal {
                kind: NightActionKind::Skip,
                target: None,
            });
        }
        let target = if let Some(scores) = suspicion.filter(|s| !s.is_empty()) {
            // The least-suspected player reads most like a power role.
            pick_by_score(&candidates, scores, false)
        } else if profile.analytical {
            most_talkative(&candidates)
        } else {
            choose(&candidates)
        };
        target.map(|t| NightProposal {
            kind: NightActionKind::Kill,
            target: Some(t),
        })
    }

    fn seer_check(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
    ) -> Option<NightProposal> {
        let checked: Vec<PlayerId> = view.my_checks.iter().map(|c| c.target).collect();
        let mut candidates: Vec<&KnownPlayer> = view
            .living_others()
            .filter(|p| !checked.contains(&p.id))
            .collect();
        if candidates.is_empty() {
            // Everyone alive has been checked; re-checks add nothing.
            candidates = view.living_others().collect();
        }
        let target = if let Some(scores) = suspicion.filter(|s| !s.is_empty()) {
            pick_by_score(&candidates, scores, true)
        } else {
            choose(&candidates)
        };
        target.map(|t| NightProposal {
            kind: NightActionKind::Check,
            target: Some(t),
        })
    }

    /// The witch only ever weighs the *current* night's victim for the
    /// antidote; the first-night auto-save is deliberate policy. Poison is
    /// never thrown blind.
    fn witch_potion(
        &self,
        view: &KnowledgeView,
        suspicion: Option<&HashMap<PlayerId, f32>>,
    ) -> NightProposal {
        let potions = view.potions.unwrap_or_default();
        if potions.antidote
            && view.round == 1
            && let Some(victim) = view.pending_kill
        {
            return NightProposal {
                kind: NightActionKind::Save,
                target: Some(victim),
            };
        }
        if potions.poison
            && view.round > 2
            && let Some(scores) = suspicion
        {
            let mut worst: Option<(PlayerId, f32)> = None;
            for p in view.living_others() {
                let score = scores.get(&p.id).copied().unwrap_or(0.0);
                if score > POISON_SUSPICION_FLOOR
                    && worst.is_none_or(|(_, s)| score > s)
                {
                    worst = Some((p.id, score));
                }
            }
            if let Some((target, _)) = worst {
                return NightProposal {
                    kind: NightActionKind::Poison,
                    target: Some(target),
                };
            }
        }
        NightProposal {
            kind: NightActionKind::Skip,
            target: None,
        }
    }

    /// Self-protection is allowed; repeating last night's pick is not.
    fn guard_protect(&self, view: &KnowledgeView) -> Option<NightProposal> {
        let candidates: Vec<&KnownPlayer> = view
            .living
            .iter()
            .filter(|p| Some(p.id) != view.last_protected)
            .collect();
        if candidates.is_empty() {
            return Some(NightProposal {
                kind: NightActionKind::Skip,
                target: None,
            });
        }
        let mut rng = rand::rng();
        let target = if view.round == 1 && rng.random_bool(0.5) {
            Some(view.me).filter(|me| candidates.iter().any(|p| p.id == *me))
        } else {
            None
        };
        let target = target.or_else(|| most_talkative(&candidates));
        target.map(|t| NightProposal {
            kind: NightActionKind::Protect,
            target: Some(t),
        })
    }
}

fn choose(candidates: &[&KnownPlayer]) -> Option<PlayerId> {
    let mut rng = rand::rng();
    candidates.choose(&mut rng).map(|p| p.id)
}

fn most_talkative(candidates: &[&KnownPlayer]) -> Option<PlayerId> {
    candidates
        .iter()
        .max_by_key(|p| p.speech_count)
        .map(|p| p.id)
}

fn pick_by_score(
    candidates: &[&KnownPlayer],
    scores: &HashMap<PlayerId, f32>,
    highest: bool,
) -> Option<PlayerId> {
    let score_of = |p: &KnownPlayer| scores.get(&p.id).copied().unwrap_or(50.0);
    let best = candidates.iter().map(|p| score_of(p)).fold(
        if highest { f32::MIN } else { f32::MAX },
        |acc, s| if highest { acc.max(s) } else { acc.min(s) },
    );
    let leaders: Vec<&KnownPlayer> = candidates
        .iter()
        .copied()
        .filter(|p| (score_of(p) - best).abs() < f32::EPSILON)
        .collect();
    choose(&leaders)
}
