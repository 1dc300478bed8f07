use serde::{Deserialize, Serialize};

/// A player's secret role. The set is closed; behavior is resolved through
/// the capability registry rather than scattered conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Werewolf,
    Villager,
    Seer,
    Witch,
    Hunter,
    Guard,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Werewolf,
        Role::Villager,
        Role::Seer,
        Role::Witch,
        Role::Hunter,
        Role::Guard,
    ];

    pub fn faction(self) -> Faction {
        match self {
            Role::Werewolf => Faction::Werewolves,
            _ => Faction::Town,
        }
    }

    /// Whether this role submits a night action of its own.
    pub fn acts_at_night(self) -> bool {
        matches!(self, Role::Werewolf | Role::Seer | Role::Witch | Role::Guard)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Werewolf => "werewolf",
            Role::Villager => "villager",
            Role::Seer => "seer",
            Role::Witch => "witch",
            Role::Hunter => "hunter",
            Role::Guard => "guard",
        };
        write!(f, "{name}")
    }
}

/// The two win-condition factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Werewolves,
    Town,
}

/// Player counts the engine accepts at game start.
pub const SUPPORTED_PLAYER_COUNTS: [usize; 3] = [6, 9, 12];

/// Fixed role distribution table. Returns `None` for unsupported counts.
pub fn distribution(player_count: usize) -> Option<&'static [(Role, usize)]> {
    match player_count {
        6 => Some(&[
            (Role::Werewolf, 2),
            (Role::Villager, 2),
            (Role::Seer, 1),
            (Role::Witch, 1),
        ]),
        9 => Some(&[
            (Role::Werewolf, 3),
            (Role::Villager, 3),
            (Role::Seer, 1),
            (Role::Witch, 1),
            (Role::Hunter, 1),
        ]),
        12 => Some(&[
            (Role::Werewolf, 4),
            (Role::Villager, 4),
            (Role::Seer, 1),
            (Role::Witch, 1),
            (Role::Hunter, 1),
            (Role::Guard, 1),
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distributions_sum_to_player_count() {
        for count in SUPPORTED_PLAYER_COUNTS {
            let table = distribution(count).expect("supported count");
            let total: usize = table.iter().map(|(_, n)| n).sum();
            assert_eq!(total, count, "distribution for {count} players");
        }
    }

    #[test]
    fn unsupported_counts_rejected() {
        for count in [0, 1, 5, 7, 8, 10, 11, 13, 20] {
            assert!(distribution(count).is_none(), "{count} should be rejected");
        }
    }

    #[test]
    fn only_werewolves_are_wolves() {
        for role in Role::ALL {
            let expect = role == Role::Werewolf;
            assert_eq!(role.faction() == Faction::Werewolves, expect);
        }
    }

    #[test]
    fn night_actors() {
        assert!(Role::Werewolf.acts_at_night());
        assert!(Role::Guard.acts_at_night());
        assert!(!Role::Villager.acts_at_night());
        assert!(!Role::Hunter.acts_at_night());
    }
}
