use std::collections::BTreeMap;

use howl_core::action::Vote;
use howl_core::ids::PlayerId;

/// Votes are tallied in half-vote units so the optional 1.5x sheriff weight
/// stays integral: a plain vote is worth 2, a weighted sheriff vote 3.
pub const HALF_VOTES: u32 = 2;
pub const SHERIFF_HALF_VOTES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Sole plurality leader, if any. A strict tie yields `None`.
    pub eliminated: Option<PlayerId>,
    /// The tied leaders when no one is eliminated (empty when `eliminated`
    /// is set or nobody received a vote).
    pub tied: Vec<PlayerId>,
    /// Winning tally in half-vote units.
    pub top_half_votes: u32,
}

/// Plurality tally. Abstentions (`target: None`) count toward no one.
/// A strict tie eliminates nobody; no re-vote is attempted.
pub fn tally(votes: &[Vote], sheriff: Option<PlayerId>, sheriff_weight: bool) -> Tally {
    let mut counts: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for vote in votes {
        let Some(target) = vote.target else { continue };
        let weight = if sheriff_weight && sheriff == Some(vote.voter) {
            SHERIFF_HALF_VOTES
        } else {
            HALF_VOTES
        };
        *counts.entry(target).or_insert(0) += weight;
    }

    let top = counts.values().copied().max().unwrap_or(0);
    if top == 0 {
        return Tally {
            eliminated: None,
            tied: Vec::new(),
            top_half_votes: 0,
        };
    }

    let leaders: Vec<PlayerId> = counts
        .iter()
        .filter(|&(_, &c)| c == top)
        .map(|(&id, _)| id)
        .collect();

    if leaders.len() == 1 {
        Tally {
            eliminated: Some(leaders[0]),
            tied: Vec::new(),
            top_half_votes: top,
        }
    } else {
        Tally {
            eliminated: None,
            tied: leaders,
            top_half_votes: top,
        }
    }
}
