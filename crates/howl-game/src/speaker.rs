use howl_core::ids::PlayerId;
use howl_core::player::Player;

/// Turn-based speaking order for discussion phases: living players in seat
/// order, starting from the lowest seat.
#[derive(Debug, Clone, Default)]
pub struct SpeakerQueue {
    order: Vec<PlayerId>,
    index: usize,
    exhausted: bool,
}

impl SpeakerQueue {
    pub fn rebuild(players: &[Player]) -> Self {
        let mut living: Vec<&Player> = players.iter().filter(|p| p.alive).collect();
        living.sort_by_key(|p| p.position);
        let order: Vec<PlayerId> = living.iter().map(|p| p.id).collect();
        Self {
            exhausted: order.is_empty(),
            order,
            index: 0,
        }
    }

    pub fn current(&self) -> Option<PlayerId> {
        if self.exhausted {
            None
        } else {
            self.order.get(self.index).copied()
        }
    }

    /// Advance to the next living speaker. Returns the new current speaker,
    /// or `None` once everyone has had their turn.
    pub fn advance(&mut self, players: &[Player]) -> Option<PlayerId> {
        while !self.exhausted {
            self.index += 1;
            if self.index >= self.order.len() {
                self.exhausted = true;
                return None;
            }
            let id = self.order[self.index];
            // Players can die mid-day (self-destruct); skip them.
            if players.iter().any(|p| p.id == id && p.alive) {
                return Some(id);
            }
        }
        None
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index = 0;
        self.exhausted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use howl_core::player::PlayerKind;

    fn roster(n: u8) -> Vec<Player> {
        (1..=n)
            .map(|i| {
                Player::new(
                    PlayerId::new(),
                    format!("P{i}"),
                    PlayerKind::User,
                    i,
                )
            })
            .collect()
    }

    #[test]
    fn seat_order_from_position_one() {
        let players = roster(4);
        let q = SpeakerQueue::rebuild(&players);
        assert_eq!(q.current(), Some(players[0].id));
    }

    #[test]
    fn advances_through_everyone_once() {
        let players = roster(3);
        let mut q = SpeakerQueue::rebuild(&players);
        assert_eq!(q.advance(&players), Some(players[1].id));
        assert_eq!(q.advance(&players), Some(players[2].id));
        assert_eq!(q.advance(&players), None);
        assert!(q.is_exhausted());
    }

    #[test]
    fn skips_players_who_died_mid_queue() {
        let mut players = roster(3);
        let mut q = SpeakerQueue::rebuild(&players);
        players[1].alive = false;
        assert_eq!(q.advance(&players), Some(players[2].id));
    }

    #[test]
    fn dead_players_excluded_at_rebuild() {
        let mut players = roster(3);
        players[0].alive = false;
        let q = SpeakerQueue::rebuild(&players);
        assert_eq!(q.current(), Some(players[1].id));
    }

    #[test]
    fn empty_roster_is_exhausted() {
        let q = SpeakerQueue::rebuild(&[]);
        assert!(q.is_exhausted());
        assert_eq!(q.current(), None);
    }
}
