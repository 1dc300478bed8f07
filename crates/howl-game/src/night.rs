use howl_core::action::{NightAction, NightActionKind};
use howl_core::ids::PlayerId;
use howl_core::log::Death;
use howl_core::player::{DeathCause, Player};
use howl_core::role::Role;

/// A seer's private result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeerCheck {
    pub seer: PlayerId,
    pub round: u32,
    pub target: PlayerId,
    pub is_werewolf: bool,
}

/// The computed result of one night, applied to the room in a single step.
/// Computing over a snapshot and applying atomically means a mid-resolution
/// failure can never leave half the deaths committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NightOutcome {
    pub deaths: Vec<Death>,
    /// Kill negated because the guard protected the victim.
    pub guarded: Option<PlayerId>,
    /// Kill negated because the witch's antidote matched the victim.
    pub saved: Option<PlayerId>,
    pub antidote_spent: bool,
    pub poison_spent: bool,
    pub checks: Vec<SeerCheck>,
}

/// Pure night resolution over a snapshot. `kill_target` is the settled
/// werewolf consensus (`None` = no kill tonight). Order is fixed:
///
/// 1. guard protection negates a matching kill;
/// 2. the antidote negates the kill iff it names exactly the still-pending
///    victim — against anyone else it is a no-op and is NOT consumed;
/// 3. poison kills its living target unconditionally, overriding both the
///    werewolf outcome and the antidote;
/// 4. all deaths land simultaneously; seer checks are recorded as private
///    results.
pub fn resolve(
    round: u32,
    kill_target: Option<PlayerId>,
    actions: &[NightAction],
    players: &[Player],
) -> NightOutcome {
    let target_of = |kind: NightActionKind| {
        actions
            .iter()
            .rev()
            .find(|a| a.kind == kind)
            .and_then(|a| a.target)
    };
    let protect = target_of(NightActionKind::Protect);
    let save = target_of(NightActionKind::Save);
    let poison = target_of(NightActionKind::Poison);

    let mut out = NightOutcome::default();

    for action in actions.iter().filter(|a| a.kind == NightActionKind::Check) {
        if let Some(target) = action.target
            && let Some(p) = players.iter().find(|p| p.id == target)
        {
            out.checks.push(SeerCheck {
                seer: action.actor,
                round,
                target,
                is_werewolf: p.role == Some(Role::Werewolf),
            });
        }
    }

    let mut pending_kill = kill_target;
    if let Some(victim) = pending_kill
        && protect == Some(victim)
    {
        out.guarded = Some(victim);
        pending_kill = None;
    }
    if let Some(victim) = pending_kill
        && save == Some(victim)
    {
        out.saved = Some(victim);
        out.antidote_spent = true;
        pending_kill = None;
    }
    if let Some(victim) = pending_kill {
        out.deaths.push(Death {
            player: victim,
            cause: DeathCause::WerewolfKill,
        });
    }

    if let Some(victim) = poison {
        out.poison_spent = true;
        if players.iter().any(|p| p.id == victim && p.alive) {
            // Poison overrides a werewolf kill on the same victim.
            out.deaths.retain(|d| d.player != victim);
            out.deaths.push(Death {
                player: victim,
                cause: DeathCause::Poison,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use howl_core::player::PlayerKind;

    fn roster(roles: &[Role]) -> Vec<Player> {
        roles
            .iter()
            .enumerate()
            .map(|(i, &role)| {
                let mut p = Player::new(
                    PlayerId::new(),
                    format!("P{}", i + 1),
                    PlayerKind::User,
                    (i + 1) as u8,
                );
                p.role = Some(role);
                p
            })
            .collect()
    }

    fn action(actor: PlayerId, role: Role, kind: NightActionKind, target: PlayerId) -> NightAction {
        NightAction {
            actor,
            role,
            kind,
            target: Some(target),
        }
    }

    #[test]
    fn unprotected_kill_lands() {
        let players = roster(&[Role::Werewolf, Role::Villager]);
        let victim = players[1].id;
        let out = resolve(1, Some(victim), &[], &players);
        assert_eq!(
            out.deaths,
            vec![Death {
                player: victim,
                cause: DeathCause::WerewolfKill
            }]
        );
    }

    #[test]
    fn guard_negates_matching_kill() {
        let players = roster(&[Role::Werewolf, Role::Villager, Role::Guard]);
        let victim = players[1].id;
        let guard = players[2].id;
        let actions = [action(guard, Role::Guard, NightActionKind::Protect, victim)];
        let out = resolve(1, Some(victim), &actions, &players);
        assert!(out.deaths.is_empty());
        assert_eq!(out.guarded, Some(victim));
        assert!(!out.antidote_spent);
    }

    #[test]
    fn antidote_negates_exact_kill_target_and_is_consumed() {
        let players = roster(&[Role::Werewolf, Role::Seer, Role::Witch]);
        let victim = players[1].id;
        let witch = players[2].id;
        let actions = [action(witch, Role::Witch, NightActionKind::Save, victim)];
        let out = resolve(1, Some(victim), &actions, &players);
        assert!(out.deaths.is_empty());
        assert_eq!(out.saved, Some(victim));
        assert!(out.antidote_spent);
    }

    #[test]
    fn antidote_on_wrong_target_is_noop_and_not_consumed() {
        let players = roster(&[Role::Werewolf, Role::Villager, Role::Witch]);
        let victim = players[1].id;
        let witch = players[2].id;
        let actions = [action(witch, Role::Witch, NightActionKind::Save, witch)];
        let out = resolve(1, Some(victim), &actions, &players);
        assert_eq!(out.deaths.len(), 1);
        assert_eq!(out.saved, None);
        assert!(!out.antidote_spent);
    }

    #[test]
    fn antidote_after_guard_negation_is_not_consumed() {
        // Guard already negated the kill, so the antidote no longer matches a
        // pending victim.
        let players = roster(&[Role::Werewolf, Role::Villager, Role::Witch, Role::Guard]);
        let victim = players[1].id;
        let witch = players[2].id;
        let guard = players[3].id;
        let actions = [
            action(guard, Role::Guard, NightActionKind::Protect, victim),
            action(witch, Role::Witch, NightActionKind::Save, victim),
        ];
        let out = resolve(1, Some(victim), &actions, &players);
        assert!(out.deaths.is_empty());
        assert_eq!(out.guarded, Some(victim));
        assert!(!out.antidote_spent);
    }

    #[test]
    fn poison_overrides_antidote_on_same_victim() {
        let players = roster(&[Role::Werewolf, Role::Villager, Role::Witch]);
        let victim = players[1].id;
        let witch = players[2].id;
        let actions = [
            action(witch, Role::Witch, NightActionKind::Save, victim),
            action(witch, Role::Witch, NightActionKind::Poison, victim),
        ];
        let out = resolve(1, Some(victim), &actions, &players);
        assert_eq!(
            out.deaths,
            vec![Death {
                player: victim,
                cause: DeathCause::Poison
            }]
        );
        assert!(out.poison_spent);
    }

    #[test]
    fn poison_kills_independently_of_wolves() {
        let players = roster(&[Role::Werewolf, Role::Villager, Role::Witch, Role::Seer]);
        let kill_victim = players[1].id;
        let poison_victim = players[3].id;
        let witch = players[2].id;
        let actions = [action(
            witch,
            Role::Witch,
            NightActionKind::Poison,
            poison_victim,
        )];
        let out = resolve(1, Some(kill_victim), &actions, &players);
        assert_eq!(out.deaths.len(), 2);
        assert!(out.deaths.iter().any(|d| d.player == kill_victim
            && d.cause == DeathCause::WerewolfKill));
        assert!(out
            .deaths
            .iter()
            .any(|d| d.player == poison_victim && d.cause == DeathCause::Poison));
    }

    #[test]
    fn no_consensus_means_quiet_night() {
        let players = roster(&[Role::Werewolf, Role::Villager]);
        let out = resolve(1, None, &[], &players);
        assert!(out.deaths.is_empty());
    }

    #[test]
    fn seer_check_reports_faction() {
        let players = roster(&[Role::Werewolf, Role::Seer, Role::Villager]);
        let seer = players[1].id;
        let actions = [
            action(seer, Role::Seer, NightActionKind::Check, players[0].id),
        ];
        let out = resolve(2, None, &actions, &players);
        assert_eq!(out.checks.len(), 1);
        assert!(out.checks[0].is_werewolf);
        assert_eq!(out.checks[0].round, 2);
    }

    mod order_independence {
        use super::*;
        use proptest::prelude::*;

        // Resolution must not depend on the order actions were submitted in.
        proptest! {
            #[test]
            fn shuffled_actions_resolve_identically(seed in 0usize..24) {
                let players = roster(&[
                    Role::Werewolf,
                    Role::Villager,
                    Role::Witch,
                    Role::Guard,
                    Role::Seer,
                ]);
                let victim = players[1].id;
                let witch = players[2].id;
                let guard = players[3].id;
                let seer = players[4].id;

                let mut actions = vec![
                    action(guard, Role::Guard, NightActionKind::Protect, victim),
                    action(witch, Role::Witch, NightActionKind::Save, victim),
                    action(seer, Role::Seer, NightActionKind::Check, players[0].id),
                ];
                // Deterministic permutation from the seed.
                let n = actions.len();
                actions.rotate_left(seed % n);
                if seed % 2 == 1 {
                    actions.swap(0, 1);
                }

                let out = resolve(1, Some(victim), &actions, &players);
                prop_assert!(out.deaths.is_empty());
                prop_assert_eq!(out.guarded, Some(victim));
                prop_assert!(!out.antidote_spent);
                prop_assert_eq!(out.checks.len(), 1);
            }
        }
    }
}
