use howl_core::phase::Phase;
use howl_core::player::Player;
use howl_core::role::Role;
use howl_core::view::{
    ElectionView, PlayerView, RoomView, SeerCheckView, WitchPotionsView,
};
use howl_game::Game;

/// Build one player's sanitized view of the room. This is the only path
/// state ever takes toward a client, so the visibility rules live here:
///
/// - own role always; others' roles only if the holder is dead, the game is
///   over, or both viewer and holder are werewolves;
/// - witch potions and the pending kill target go to the witch alone;
/// - seer results go to the checking seer alone;
/// - wolf chat goes to werewolves alone;
/// - log entries are filtered per viewer.
pub fn room_view(game: &Game, viewer: &Player, deadline_secs: Option<u64>) -> RoomView {
    let reveal_all = game.reveal_all();
    let viewer_is_wolf = viewer.role == Some(Role::Werewolf);
    let viewer_is_witch = viewer.role == Some(Role::Witch);

    let players = game
        .players
        .iter()
        .map(|p| {
            let role_visible = p.id == viewer.id
                || !p.alive
                || reveal_all
                || (viewer_is_wolf && p.role == Some(Role::Werewolf));
            PlayerView {
                id: p.id,
                name: p.display_name.clone(),
                kind: p.kind,
                alive: p.alive,
                position: p.position,
                online: p.online,
                has_acted_night: p.has_acted_night,
                has_voted: p.has_voted,
                role: if role_visible { p.role } else { None },
            }
        })
        .collect();

    let election = (game.election.open || !game.election.candidates.is_empty())
        .then(|| ElectionView {
            open: game.election.open,
            candidates: game.election.candidates.clone(),
        });

    RoomView {
        room_id: game.room_id,
        room_name: game.room_name.clone(),
        host: game.host,
        you: viewer.id,
        your_role: viewer.role,
        phase: game.phase,
        round: game.round,
        paused: game.paused,
        players,
        current_speaker: game.speakers.current(),
        deadline_secs,
        sheriff: game.sheriff,
        winner: game.winner,
        witch_potions: viewer_is_witch.then(|| WitchPotionsView {
            antidote: game.potions.antidote,
            poison: game.potions.poison,
        }),
        pending_kill: if viewer_is_witch && game.phase == Phase::Night {
            game.pending_kill
        } else {
            None
        },
        seer_checks: if viewer.role == Some(Role::Seer) {
            game.seer_checks_for(viewer.id)
                .into_iter()
                .map(|c| SeerCheckView {
                    round: c.round,
                    target: c.target,
                    is_werewolf: c.is_werewolf,
                })
                .collect()
        } else {
            Vec::new()
        },
        wolf_chat: if viewer_is_wolf {
            game.wolf_chat.clone()
        } else {
            Vec::new()
        },
        election,
        log: game
            .log
            .iter()
            .filter(|e| e.visible_to(viewer.id, reveal_all))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use howl_core::action::NightActionKind;
    use howl_core::ids::{PlayerId, RoomId};
    use howl_core::player::PlayerKind;

    fn game_with_roles(roles: &[Role]) -> Game {
        let host = Player::new(PlayerId::new(), "host".into(), PlayerKind::User, 1);
        let mut game = Game::new(RoomId::new(), "view-test".into(), host);
        for i in 1..roles.len() {
            game.add_player(format!("p{i}"), PlayerKind::User).unwrap();
        }
        for (p, &r) in game.players.iter_mut().zip(roles) {
            p.role = Some(r);
        }
        game.phase = Phase::Night;
        game
    }

    const SIX: [Role; 6] = [
        Role::Werewolf,
        Role::Werewolf,
        Role::Villager,
        Role::Villager,
        Role::Seer,
        Role::Witch,
    ];

    /// The central secrecy invariant: a living, non-teammate player's role
    /// never appears in anyone else's view while the game is running.
    #[test]
    fn living_roles_hidden_from_strangers() {
        let game = game_with_roles(&SIX);
        for viewer in &game.players {
            let view = room_view(&game, viewer, None);
            for pv in &view.players {
                if pv.id == viewer.id {
                    assert_eq!(pv.role, viewer.role);
                    continue;
                }
                let holder_is_wolf = game.player(pv.id).unwrap().is_wolf();
                let entitled = viewer.is_wolf() && holder_is_wolf;
                assert_eq!(
                    pv.role.is_some(),
                    entitled,
                    "viewer {:?} saw role of {:?}",
                    viewer.role,
                    pv.id
                );
            }
        }
    }

    #[test]
    fn wolves_see_each_other() {
        let game = game_with_roles(&SIX);
        let wolf = &game.players[0];
        let view = room_view(&game, wolf, None);
        let teammate_view = view
            .players
            .iter()
            .find(|p| p.id == game.players[1].id)
            .unwrap();
        assert_eq!(teammate_view.role, Some(Role::Werewolf));
    }

    #[test]
    fn dead_roles_are_public() {
        let mut game = game_with_roles(&SIX);
        game.players[4].alive = false;
        let villager = game.players[2].clone();
        let view = room_view(&game, &villager, None);
        let dead = view.players.iter().find(|p| !p.alive).unwrap();
        assert_eq!(dead.role, Some(Role::Seer));
    }

    #[test]
    fn game_over_reveals_everything() {
        let mut game = game_with_roles(&SIX);
        game.phase = Phase::GameOver;
        let villager = game.players[2].clone();
        let view = room_view(&game, &villager, None);
        assert!(view.players.iter().all(|p| p.role.is_some()));
    }

    #[test]
    fn potions_and_pending_kill_go_to_witch_only() {
        let mut game = game_with_roles(&SIX);
        game.pending_kill = Some(game.players[2].id);
        let witch = game.players[5].clone();
        let view = room_view(&game, &witch, None);
        assert!(view.witch_potions.is_some());
        assert_eq!(view.pending_kill, Some(game.players[2].id));

        for other in game.players.iter().filter(|p| p.id != witch.id) {
            let view = room_view(&game, other, None);
            assert!(view.witch_potions.is_none(), "{:?}", other.role);
            assert!(view.pending_kill.is_none(), "{:?}", other.role);
        }
    }

    #[test]
    fn seer_results_go_to_seer_only() {
        let mut game = game_with_roles(&SIX);
        let seer = game.players[4].clone();
        let wolf = game.players[0].id;
        game.submit_night_action(seer.id, NightActionKind::Check, Some(wolf))
            .unwrap();
        game.resolve_night();

        let view = room_view(&game, game.player(seer.id).unwrap(), None);
        assert_eq!(view.seer_checks.len(), 1);
        assert!(view.seer_checks[0].is_werewolf);
        assert!(view.log.iter().any(|e| matches!(
            e.event,
            howl_core::log::LogEvent::SeerChecked { .. }
        )));

        let villager = game.player(game.players[2].id).unwrap();
        let view = room_view(&game, villager, None);
        assert!(view.seer_checks.is_empty());
        assert!(!view.log.iter().any(|e| matches!(
            e.event,
            howl_core::log::LogEvent::SeerChecked { .. }
        )));
    }

    #[test]
    fn wolf_chat_hidden_from_town() {
        let mut game = game_with_roles(&SIX);
        game.wolf_chat.push(howl_core::view::WolfChatView {
            sender: game.players[0].id,
            content: "take the seer".into(),
            round: 1,
            timestamp: "0Z".into(),
        });
        let wolf_view = room_view(&game, &game.players[1].clone(), None);
        assert_eq!(wolf_view.wolf_chat.len(), 1);
        let town_view = room_view(&game, &game.players[3].clone(), None);
        assert!(town_view.wolf_chat.is_empty());
    }
}
