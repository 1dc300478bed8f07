use rand::seq::{IndexedRandom, SliceRandom};

use howl_core::action::{ActionId, NightAction, NightActionKind, Vote};
use howl_core::ids::{PlayerId, RoomId};
use howl_core::log::{LogEntry, LogEvent};
use howl_core::phase::Phase;
use howl_core::player::{DeathCause, Player, PlayerKind, Speech};
use howl_core::role::{self, Faction, Role};
use howl_core::time::timestamp_now;
use howl_core::view::WolfChatView;

use crate::capability::{self, TargetSpec};
use crate::error::GameError;
use crate::night::{self, SeerCheck};
use crate::speaker::SpeakerQueue;
use crate::vote::{self, Tally};

/// Hard cap on room size; actual game starts require a supported count.
pub const MAX_PLAYERS: usize = 12;

/// Optional rule toggles.
#[derive(Debug, Clone, Copy)]
pub struct RulesConfig {
    /// Sheriff's vote counts 1.5x when enabled. Off by default.
    pub sheriff_vote_weight: bool,
    /// Round-1 sheriff election sub-state. On by default.
    pub sheriff_election: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            sheriff_vote_weight: false,
            sheriff_election: true,
        }
    }
}

/// The witch's two single-use consumables.
#[derive(Debug, Clone, Copy)]
pub struct WitchPotions {
    pub antidote: bool,
    pub poison: bool,
}

impl Default for WitchPotions {
    fn default() -> Self {
        Self {
            antidote: true,
            poison: true,
        }
    }
}

/// Round-1 sheriff election sub-state.
#[derive(Debug, Clone, Default)]
pub struct SheriffElection {
    pub open: bool,
    pub done: bool,
    pub candidates: Vec<PlayerId>,
    pub ballots: Vec<Vote>,
}

/// Where the main flow resumes once interrupt windows (hunter shot, badge
/// transfer) have drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Day,
    Night,
}

/// Authoritative per-room game state. Mutated exclusively by the owning
/// session task; all submissions pass through the validated methods below
/// regardless of whether a human or the AI fallback produced them.
#[derive(Debug)]
pub struct Game {
    pub room_id: RoomId,
    pub room_name: String,
    pub host: PlayerId,
    pub phase: Phase,
    pub round: u32,
    pub players: Vec<Player>,
    pub night_actions: Vec<NightAction>,
    pub votes: Vec<Vote>,
    pub potions: WitchPotions,
    pub sheriff: Option<PlayerId>,
    pub election: SheriffElection,
    pub speakers: SpeakerQueue,
    pub log: Vec<LogEntry>,
    pub winner: Option<Faction>,
    pub paused: bool,
    pub rules: RulesConfig,
    pub wolf_chat: Vec<WolfChatView>,
    /// Settled werewolf consensus for the current night.
    pub pending_kill: Option<PlayerId>,
    consensus_settled: bool,
    guard_last_target: Option<PlayerId>,
    seer_checks: Vec<SeerCheck>,
    pending_hunter: Option<PlayerId>,
    pending_badge: bool,
    resume_after: Resume,
}

impl Game {
    pub fn new(room_id: RoomId, room_name: String, host: Player) -> Self {
        let host_id = host.id;
        let mut game = Self {
            room_id,
            room_name,
            host: host_id,
            phase: Phase::Waiting,
            round: 1,
            players: vec![host],
            night_actions: Vec::new(),
            votes: Vec::new(),
            potions: WitchPotions::default(),
            sheriff: None,
            election: SheriffElection::default(),
            speakers: SpeakerQueue::default(),
            log: Vec::new(),
            winner: None,
            paused: false,
            rules: RulesConfig::default(),
            wolf_chat: Vec::new(),
            pending_kill: None,
            consensus_settled: false,
            guard_last_target: None,
            seer_checks: Vec::new(),
            pending_hunter: None,
            pending_badge: false,
            resume_after: Resume::Day,
        };
        game.push_log(LogEvent::PlayerJoined { player: host_id });
        game
    }

    // ---- roster ----------------------------------------------------------

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn require_living(&self, id: PlayerId) -> Result<&Player, GameError> {
        let p = self.player(id).ok_or(GameError::NotInRoom)?;
        if !p.alive {
            return Err(GameError::DeadActor);
        }
        Ok(p)
    }

    pub fn living(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    pub fn living_wolves(&self) -> impl Iterator<Item = &Player> {
        self.living().filter(|p| p.is_wolf())
    }

    pub fn assert_host(&self, actor: PlayerId) -> Result<(), GameError> {
        if self.host != actor {
            return Err(GameError::NotHost);
        }
        Ok(())
    }

    /// Seat a new player. Rejected once the game has started or the room is
    /// at capacity.
    pub fn add_player(
        &mut self,
        display_name: String,
        kind: PlayerKind,
    ) -> Result<PlayerId, GameError> {
        if self.phase != Phase::Waiting {
            return Err(GameError::GameInProgress);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        let id = PlayerId::new();
        let position = (self.players.len() + 1) as u8;
        self.players
            .push(Player::new(id, display_name, kind, position));
        self.push_log(LogEvent::PlayerJoined { player: id });
        Ok(id)
    }

    /// Remove a player outright (WAITING only). Re-seats positions, migrates
    /// the host if needed. Returns true when the room is now empty.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        self.players.retain(|p| p.id != id);
        for (i, p) in self.players.iter_mut().enumerate() {
            p.position = (i + 1) as u8;
        }
        self.push_log(LogEvent::PlayerLeft { player: id });
        if self.players.is_empty() {
            return true;
        }
        if self.host == id {
            self.host = self.players[0].id;
        }
        false
    }

    /// Mark a mid-game player disconnected; the seat survives for
    /// reconnection.
    pub fn mark_offline(&mut self, id: PlayerId) {
        if let Some(p) = self.player_mut(id) {
            p.online = false;
            self.push_log(LogEvent::PlayerLeft { player: id });
        }
    }

    /// Idempotent rebind: restores the online flag without touching any
    /// accrued state (alive/dead, potions, speeches).
    pub fn mark_online(&mut self, id: PlayerId) {
        if let Some(p) = self.player_mut(id) {
            p.online = true;
            self.push_log(LogEvent::PlayerReconnected { player: id });
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Host starts the game: validates the player count against the fixed
    /// role table, deals a uniformly shuffled role to every seat, and enters
    /// the first night.
    pub fn start(&mut self, actor: PlayerId) -> Result<(), GameError> {
        self.assert_host(actor)?;
        if self.phase != Phase::Waiting {
            return Err(GameError::GameInProgress);
        }
        let count = self.players.len();
        let table = role::distribution(count).ok_or(GameError::BadPlayerCount(count))?;

        let mut roles: Vec<Role> = Vec::with_capacity(count);
        for &(role, n) in table {
            roles.extend(std::iter::repeat_n(role, n));
        }
        let mut rng = rand::rng();
        roles.shuffle(&mut rng);
        for (player, role) in self.players.iter_mut().zip(roles) {
            player.role = Some(role);
        }

        self.push_log(LogEvent::GameStarted {
            player_count: count,
        });
        self.begin_night(false);
        Ok(())
    }

    fn begin_night(&mut self, new_round: bool) {
        if new_round {
            self.round += 1;
        }
        self.night_actions.clear();
        self.pending_kill = None;
        self.consensus_settled = false;
        for p in &mut self.players {
            p.reset_night_flag();
        }
        self.resume_after = Resume::Day;
        self.transition(Phase::Night);
    }

    // ---- night -----------------------------------------------------------

    /// Validate and record a night action. Later submissions from the same
    /// actor replace earlier ones until resolution.
    pub fn submit_night_action(
        &mut self,
        actor: PlayerId,
        kind: NightActionKind,
        target: Option<PlayerId>,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Night {
            return Err(GameError::WrongPhase);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        let cap = capability::find(role, self.phase, kind.action_id())
            .ok_or(GameError::CapabilityDenied)?;
        let target = self.validate_target(cap.target, target)?;

        match kind {
            NightActionKind::Save => {
                if !self.potions.antidote {
                    return Err(GameError::PotionSpent);
                }
                // Once the wolves have settled, the antidote may only name
                // tonight's victim.
                if self.consensus_settled
                    && let Some(victim) = self.pending_kill
                    && target != Some(victim)
                {
                    return Err(GameError::InvalidTarget);
                }
            },
            NightActionKind::Poison => {
                if !self.potions.poison {
                    return Err(GameError::PotionSpent);
                }
            },
            NightActionKind::Protect => {
                if target.is_some() && target == self.guard_last_target {
                    return Err(GameError::GuardRepeat);
                }
            },
            _ => {},
        }

        self.night_actions.retain(|a| a.actor != actor);
        self.night_actions.push(NightAction {
            actor,
            role,
            kind,
            target,
        });
        if let Some(p) = self.player_mut(actor) {
            p.has_acted_night = true;
        }
        Ok(())
    }

    fn validate_target(
        &self,
        spec: TargetSpec,
        target: Option<PlayerId>,
    ) -> Result<Option<PlayerId>, GameError> {
        match spec {
            TargetSpec::None => Ok(None),
            TargetSpec::OptionalLiving => match target {
                None => Ok(None),
                Some(t) => self.check_living_target(t).map(Some),
            },
            TargetSpec::RequiredLiving => {
                let t = target.ok_or(GameError::TargetRequired)?;
                self.check_living_target(t).map(Some)
            },
        }
    }

    fn check_living_target(&self, target: PlayerId) -> Result<PlayerId, GameError> {
        let p = self.player(target).ok_or(GameError::InvalidTarget)?;
        if !p.alive {
            return Err(GameError::DeadTarget);
        }
        Ok(target)
    }

    pub fn all_wolves_acted(&self) -> bool {
        self.living_wolves().all(|p| p.has_acted_night)
    }

    pub fn consensus_settled(&self) -> bool {
        self.consensus_settled
    }

    /// Settle the werewolf team decision: plurality over the wolves'
    /// last-submitted kill votes, ties broken uniformly at random. No votes
    /// (e.g. disagreement timeout) means nobody dies to wolves tonight.
    /// Individual kill votes are replaced by the single consensus target, so
    /// at most one kill exists per night.
    pub fn settle_wolf_consensus(&mut self) {
        if self.consensus_settled {
            return;
        }
        let mut counts: Vec<(PlayerId, u32)> = Vec::new();
        for action in self
            .night_actions
            .iter()
            .filter(|a| a.kind == NightActionKind::Kill)
        {
            if let Some(target) = action.target {
                match counts.iter_mut().find(|(id, _)| *id == target) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((target, 1)),
                }
            }
        }
        self.night_actions
            .retain(|a| a.kind != NightActionKind::Kill);

        let top = counts.iter().map(|&(_, n)| n).max().unwrap_or(0);
        let leaders: Vec<PlayerId> = counts
            .iter()
            .filter(|&&(_, n)| n == top && top > 0)
            .map(|&(id, _)| id)
            .collect();
        let mut rng = rand::rng();
        self.pending_kill = leaders.choose(&mut rng).copied();
        self.consensus_settled = true;
        tracing::debug!(
            room = %self.room_id,
            round = self.round,
            target = ?self.pending_kill,
            "Werewolf consensus settled"
        );
    }

    /// Whether every eligible living role has acted this night.
    pub fn night_complete(&self) -> bool {
        self.consensus_settled
            && self
                .living()
                .filter(|p| p.role.is_some_and(|r| r.acts_at_night()))
                .all(|p| p.has_acted_night)
    }

    /// Resolve the night: compute the outcome over a snapshot, then apply it
    /// as one atomic step, queue interrupt windows, check win conditions and
    /// advance the phase.
    pub fn resolve_night(&mut self) {
        self.settle_wolf_consensus();
        let outcome = night::resolve(
            self.round,
            self.pending_kill,
            &self.night_actions,
            &self.players,
        );

        self.guard_last_target = self
            .night_actions
            .iter()
            .rev()
            .find(|a| a.kind == NightActionKind::Protect)
            .and_then(|a| a.target);

        if outcome.antidote_spent {
            self.potions.antidote = false;
        }
        if outcome.poison_spent {
            self.potions.poison = false;
        }

        for check in &outcome.checks {
            self.push_log(LogEvent::SeerChecked {
                seer: check.seer,
                target: check.target,
                is_werewolf: check.is_werewolf,
            });
        }
        self.seer_checks.extend(outcome.checks.iter().copied());

        for death in &outcome.deaths {
            self.kill_player(death.player, death.cause);
            // Poison deaths bypass the hunter's shot.
            if death.cause == DeathCause::WerewolfKill
                && self.player(death.player).and_then(|p| p.role) == Some(Role::Hunter)
            {
                self.pending_hunter = Some(death.player);
            }
        }
        self.push_log(LogEvent::NightResolved {
            deaths: outcome.deaths.clone(),
            quiet: outcome.deaths.is_empty(),
        });

        self.night_actions.clear();
        self.pending_kill = None;
        self.resume_after = Resume::Day;
        self.check_win();
        self.continue_flow();
    }

    // ---- day: discussion and election ------------------------------------

    fn enter_day_discuss(&mut self) {
        self.speakers = SpeakerQueue::rebuild(&self.players);
        if self.rules.sheriff_election && self.round == 1 && !self.election.done {
            self.election.open = true;
        }
        self.transition(Phase::DayDiscuss);
    }

    /// Record a speech by the current speaker. Advancing the queue is the
    /// caller's move (it owns the per-speaker clock).
    pub fn record_speech(&mut self, actor: PlayerId, content: String) -> Result<(), GameError> {
        if self.phase != Phase::DayDiscuss {
            return Err(GameError::WrongPhase);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::Discuss).ok_or(GameError::CapabilityDenied)?;
        if self.speakers.current() != Some(actor) {
            return Err(GameError::NotCurrentSpeaker);
        }
        let round = self.round;
        let phase = self.phase;
        if let Some(p) = self.player_mut(actor) {
            p.speeches.push(Speech {
                round,
                phase,
                content,
                timestamp: timestamp_now(),
            });
        }
        Ok(())
    }

    /// Move to the next living speaker; when the queue is exhausted the
    /// discussion ends (resolving any open election) and voting begins.
    /// Returns the new current speaker.
    pub fn advance_speaker(&mut self) -> Option<PlayerId> {
        let players = self.players.clone();
        match self.speakers.advance(&players) {
            Some(next) => Some(next),
            None => {
                self.end_discussion();
                None
            },
        }
    }

    fn end_discussion(&mut self) {
        if self.election.open {
            self.resolve_election();
        }
        self.votes.clear();
        for p in &mut self.players {
            p.reset_vote_flag();
        }
        self.transition(Phase::DayVote);
    }

    pub fn apply_sheriff(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::DayDiscuss {
            return Err(GameError::WrongPhase);
        }
        if !self.election.open {
            return Err(GameError::ElectionClosed);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::ApplySheriff)
            .ok_or(GameError::CapabilityDenied)?;
        if self.election.candidates.contains(&actor) {
            return Err(GameError::AlreadyCandidate);
        }
        self.election.candidates.push(actor);
        Ok(())
    }

    pub fn vote_sheriff(&mut self, actor: PlayerId, target: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::DayDiscuss {
            return Err(GameError::WrongPhase);
        }
        if !self.election.open {
            return Err(GameError::ElectionClosed);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::VoteSheriff)
            .ok_or(GameError::CapabilityDenied)?;
        if !self.election.candidates.contains(&target) {
            return Err(GameError::NotCandidate);
        }
        self.election.ballots.retain(|b| b.voter != actor);
        self.election.ballots.push(Vote {
            voter: actor,
            target: Some(target),
        });
        Ok(())
    }

    fn resolve_election(&mut self) {
        self.election.open = false;
        self.election.done = true;
        let result = vote::tally(&self.election.ballots, None, false);
        let elected = match result.eliminated {
            Some(winner) => Some(winner),
            None if !result.tied.is_empty() => {
                // Election ties (unlike day votes) are broken by lot.
                let mut rng = rand::rng();
                result.tied.choose(&mut rng).copied()
            },
            None => None,
        };
        if let Some(winner) = elected {
            self.sheriff = Some(winner);
            self.push_log(LogEvent::SheriffElected {
                player: winner,
                half_votes: result.top_half_votes,
            });
        }
    }

    /// A werewolf blows its cover: it dies on the spot, discussion truncates
    /// and the day's vote is skipped entirely.
    pub fn self_destruct(&mut self, actor: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::DayDiscuss {
            return Err(GameError::WrongPhase);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::SelfDestruct)
            .ok_or(GameError::CapabilityDenied)?;

        self.kill_player(actor, DeathCause::SelfDestruct);
        self.push_log(LogEvent::WolfSelfDestructed { player: actor });
        self.speakers.clear();
        if self.election.open {
            // Truncated day: the election is abandoned for this game.
            self.election.open = false;
            self.election.done = true;
        }
        if self.sheriff == Some(actor) {
            self.pending_badge = true;
        }
        self.resume_after = Resume::Night;
        self.check_win();
        self.continue_flow();
        Ok(())
    }

    // ---- day: voting ------------------------------------------------------

    /// One active vote per voter; re-submitting overwrites until tally time.
    pub fn submit_vote(
        &mut self,
        actor: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<(), GameError> {
        if self.phase != Phase::DayVote {
            return Err(GameError::WrongPhase);
        }
        let player = self.require_living(actor)?;
        let role = player.role.ok_or(GameError::CapabilityDenied)?;
        let cap = capability::find(role, self.phase, ActionId::Vote)
            .ok_or(GameError::CapabilityDenied)?;
        let target = self.validate_target(cap.target, target)?;

        self.votes.retain(|v| v.voter != actor);
        self.votes.push(Vote {
            voter: actor,
            target,
        });
        if let Some(p) = self.player_mut(actor) {
            p.has_voted = true;
        }
        self.push_log(LogEvent::VoteCast {
            voter: actor,
            target,
        });
        Ok(())
    }

    pub fn all_voted(&self) -> bool {
        self.living().all(|p| p.has_voted)
    }

    /// Tally the day's votes. Plurality eliminates; a strict tie eliminates
    /// nobody and the round simply moves on (no re-vote).
    pub fn resolve_votes(&mut self) -> Tally {
        let result = vote::tally(&self.votes, self.sheriff, self.rules.sheriff_vote_weight);
        if let Some(victim) = result.eliminated {
            self.kill_player(victim, DeathCause::Vote);
            self.push_log(LogEvent::PlayerEliminated {
                player: victim,
                half_votes: result.top_half_votes,
            });
            // A voted-out hunter still shoots; a dead sheriff owes the badge.
            if self.player(victim).and_then(|p| p.role) == Some(Role::Hunter) {
                self.pending_hunter = Some(victim);
            }
        } else if !result.tied.is_empty() {
            self.push_log(LogEvent::VoteTied {
                candidates: result.tied.clone(),
            });
        }
        self.votes.clear();
        self.resume_after = Resume::Night;
        self.check_win();
        self.continue_flow();
        result
    }

    // ---- interrupt windows ------------------------------------------------

    pub fn pending_hunter(&self) -> Option<PlayerId> {
        self.pending_hunter
    }

    /// The dying hunter takes a parting shot.
    pub fn hunter_shoot(&mut self, actor: PlayerId, target: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::HunterShoot {
            return Err(GameError::WrongPhase);
        }
        if self.pending_hunter != Some(actor) {
            return Err(GameError::NotPendingHunter);
        }
        let role = self
            .player(actor)
            .and_then(|p| p.role)
            .ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::HunterShoot)
            .ok_or(GameError::CapabilityDenied)?;
        if target == actor {
            return Err(GameError::InvalidTarget);
        }
        self.check_living_target(target)?;

        self.kill_player(target, DeathCause::HunterShot);
        self.push_log(LogEvent::HunterShot {
            hunter: actor,
            target,
        });
        self.pending_hunter = None;
        self.check_win();
        self.continue_flow();
        Ok(())
    }

    /// Timer default: the shot window closes unused.
    pub fn skip_hunter(&mut self) {
        self.pending_hunter = None;
        self.continue_flow();
    }

    /// The dying sheriff nominates a successor, or relinquishes with
    /// `target: None`.
    pub fn badge_transfer(
        &mut self,
        actor: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<(), GameError> {
        if self.phase != Phase::BadgeTransfer {
            return Err(GameError::WrongPhase);
        }
        if self.sheriff != Some(actor) {
            return Err(GameError::NotSheriff);
        }
        let role = self
            .player(actor)
            .and_then(|p| p.role)
            .ok_or(GameError::CapabilityDenied)?;
        capability::find(role, self.phase, ActionId::BadgeTransfer)
            .ok_or(GameError::CapabilityDenied)?;
        if let Some(t) = target {
            self.check_living_target(t)?;
        }
        self.sheriff = target;
        self.push_log(LogEvent::BadgeTransferred {
            from: actor,
            to: target,
        });
        self.pending_badge = false;
        self.continue_flow();
        Ok(())
    }

    /// Timer default: the badge is relinquished.
    pub fn skip_badge(&mut self) {
        if let Some(from) = self.sheriff {
            self.push_log(LogEvent::BadgeTransferred { from, to: None });
        }
        self.sheriff = None;
        self.pending_badge = false;
        self.continue_flow();
    }

    // ---- host controls ----------------------------------------------------

    pub fn host_pause(&mut self, actor: PlayerId) -> Result<(), GameError> {
        self.assert_host(actor)?;
        self.paused = true;
        Ok(())
    }

    pub fn host_resume(&mut self, actor: PlayerId) -> Result<(), GameError> {
        self.assert_host(actor)?;
        self.paused = false;
        Ok(())
    }

    // ---- flow -------------------------------------------------------------

    fn kill_player(&mut self, id: PlayerId, cause: DeathCause) {
        if let Some(p) = self.player_mut(id)
            && p.alive
        {
            p.alive = false;
            p.death_cause = Some(cause);
        }
        if self.sheriff == Some(id) {
            self.pending_badge = true;
        }
    }

    /// Win detection, run immediately after every death-causing resolution:
    /// town wins at zero living wolves; wolves win at parity or better.
    fn check_win(&mut self) {
        if self.winner.is_some() {
            return;
        }
        let wolves = self.living_wolves().count();
        let town = self.living().count() - wolves;
        let winner = if wolves == 0 {
            Some(Faction::Town)
        } else if wolves >= town {
            Some(Faction::Werewolves)
        } else {
            None
        };
        if let Some(winner) = winner {
            self.winner = Some(winner);
            self.push_log(LogEvent::GameOver { winner });
        }
    }

    /// Advance past any drained interrupt windows to the next main phase.
    fn continue_flow(&mut self) {
        if self.winner.is_some() {
            if self.phase != Phase::GameOver {
                self.transition(Phase::GameOver);
            }
            return;
        }
        if self.pending_hunter.is_some() {
            if self.phase != Phase::HunterShoot {
                self.transition(Phase::HunterShoot);
            }
            return;
        }
        if self.pending_badge {
            if self.phase != Phase::BadgeTransfer {
                self.transition(Phase::BadgeTransfer);
            }
            return;
        }
        match self.resume_after {
            Resume::Day => self.enter_day_discuss(),
            Resume::Night => self.begin_night(true),
        }
    }

    fn transition(&mut self, phase: Phase) {
        self.phase = phase;
        self.push_log(LogEvent::PhaseChanged { phase });
        tracing::debug!(room = %self.room_id, round = self.round, %phase, "Phase transition");
    }

    fn push_log(&mut self, event: LogEvent) {
        self.log.push(LogEntry {
            round: self.round,
            phase: self.phase,
            timestamp: timestamp_now(),
            event,
        });
    }

    // ---- read side --------------------------------------------------------

    pub fn reveal_all(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// The viewer's own accumulated seer results.
    pub fn seer_checks_for(&self, viewer: PlayerId) -> Vec<SeerCheck> {
        self.seer_checks
            .iter()
            .filter(|c| c.seer == viewer)
            .copied()
            .collect()
    }

    pub fn guard_last_target(&self) -> Option<PlayerId> {
        self.guard_last_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, position: u8) -> Player {
        Player::new(PlayerId::new(), name.into(), PlayerKind::User, position)
    }

    fn full_room(n: usize) -> Game {
        let mut game = Game::new(RoomId::new(), "test".into(), user("host", 1));
        for i in 1..n {
            game.add_player(format!("p{i}"), PlayerKind::User).unwrap();
        }
        game
    }

    /// Deal fixed roles by seat so scenarios are deterministic.
    fn deal(game: &mut Game, roles: &[Role]) {
        assert_eq!(game.players.len(), roles.len());
        for (p, &r) in game.players.iter_mut().zip(roles) {
            p.role = Some(r);
        }
        game.begin_night(false);
    }

    fn by_role(game: &Game, role: Role) -> Vec<PlayerId> {
        game.players
            .iter()
            .filter(|p| p.role == Some(role))
            .map(|p| p.id)
            .collect()
    }

    const SIX: [Role; 6] = [
        Role::Werewolf,
        Role::Werewolf,
        Role::Villager,
        Role::Villager,
        Role::Seer,
        Role::Witch,
    ];

    #[test]
    fn start_requires_host() {
        let mut game = full_room(6);
        let not_host = game.players[1].id;
        assert_eq!(game.start(not_host), Err(GameError::NotHost));
    }

    #[test]
    fn start_rejects_bad_player_count() {
        let mut game = full_room(5);
        let host = game.host;
        assert_eq!(game.start(host), Err(GameError::BadPlayerCount(5)));
    }

    #[test]
    fn start_assigns_roles_and_enters_night() {
        let mut game = full_room(6);
        let host = game.host;
        game.start(host).unwrap();
        assert_eq!(game.phase, Phase::Night);
        assert!(game.players.iter().all(|p| p.role.is_some()));
        assert_eq!(by_role(&game, Role::Werewolf).len(), 2);
        assert_eq!(by_role(&game, Role::Seer).len(), 1);
    }

    #[test]
    fn join_rejected_after_start() {
        let mut game = full_room(6);
        let host = game.host;
        game.start(host).unwrap();
        assert_eq!(
            game.add_player("late".into(), PlayerKind::User),
            Err(GameError::GameInProgress)
        );
    }

    #[test]
    fn dead_players_cannot_act() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolf = by_role(&game, Role::Werewolf)[0];
        let villager = by_role(&game, Role::Villager)[0];
        game.player_mut(wolf).unwrap().alive = false;
        let err = game.submit_night_action(wolf, NightActionKind::Kill, Some(villager));
        assert_eq!(err, Err(GameError::DeadActor));
    }

    #[test]
    fn villager_has_no_night_capability() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let villager = by_role(&game, Role::Villager)[0];
        let seer = by_role(&game, Role::Seer)[0];
        let err = game.submit_night_action(villager, NightActionKind::Kill, Some(seer));
        assert_eq!(err, Err(GameError::CapabilityDenied));
    }

    #[test]
    fn later_kill_vote_replaces_earlier() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolf = by_role(&game, Role::Werewolf)[0];
        let targets = by_role(&game, Role::Villager);
        game.submit_night_action(wolf, NightActionKind::Kill, Some(targets[0]))
            .unwrap();
        game.submit_night_action(wolf, NightActionKind::Kill, Some(targets[1]))
            .unwrap();
        let kills: Vec<_> = game
            .night_actions
            .iter()
            .filter(|a| a.kind == NightActionKind::Kill)
            .collect();
        assert_eq!(kills.len(), 1);
        assert_eq!(kills[0].target, Some(targets[1]));
    }

    #[test]
    fn consensus_is_plurality_of_wolf_votes() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolves = by_role(&game, Role::Werewolf);
        let seer = by_role(&game, Role::Seer)[0];
        for &wolf in &wolves {
            game.submit_night_action(wolf, NightActionKind::Kill, Some(seer))
                .unwrap();
        }
        game.settle_wolf_consensus();
        assert_eq!(game.pending_kill, Some(seer));
        // Individual kill votes are gone once settled.
        assert!(game
            .night_actions
            .iter()
            .all(|a| a.kind != NightActionKind::Kill));
    }

    #[test]
    fn no_wolf_votes_means_no_kill() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.settle_wolf_consensus();
        assert_eq!(game.pending_kill, None);
    }

    /// Night 1, wolves target the seer, witch saves. Seer
    /// survives, antidote exhausted, 6 players alive in DAY_DISCUSS.
    #[test]
    fn scenario_witch_saves_seer_on_night_one() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolves = by_role(&game, Role::Werewolf);
        let seer = by_role(&game, Role::Seer)[0];
        let witch = by_role(&game, Role::Witch)[0];

        for &wolf in &wolves {
            game.submit_night_action(wolf, NightActionKind::Kill, Some(seer))
                .unwrap();
        }
        game.settle_wolf_consensus();
        game.submit_night_action(witch, NightActionKind::Save, Some(seer))
            .unwrap();
        game.submit_night_action(seer, NightActionKind::Check, Some(wolves[0]))
            .unwrap();
        game.resolve_night();

        assert!(game.player(seer).unwrap().alive);
        assert!(!game.potions.antidote);
        assert!(game.potions.poison);
        assert_eq!(game.living().count(), 6);
        assert_eq!(game.phase, Phase::DayDiscuss);
    }

    /// Night 2 of the same setup: wolves target the witch, antidote
    /// gone. Witch dies with exactly one recorded werewolf-kill death.
    #[test]
    fn scenario_witch_dies_without_antidote() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.potions.antidote = false;
        game.round = 2;
        let wolves = by_role(&game, Role::Werewolf);
        let witch = by_role(&game, Role::Witch)[0];

        for &wolf in &wolves {
            game.submit_night_action(wolf, NightActionKind::Kill, Some(witch))
                .unwrap();
        }
        game.resolve_night();

        assert!(!game.player(witch).unwrap().alive);
        assert_eq!(
            game.player(witch).unwrap().death_cause,
            Some(DeathCause::WerewolfKill)
        );
        let deaths: Vec<_> = game
            .log
            .iter()
            .filter_map(|e| match &e.event {
                LogEvent::NightResolved { deaths, .. } => Some(deaths.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].cause, DeathCause::WerewolfKill);
    }

    /// A strict 2-2 tie eliminates nobody; the round
    /// increments and play returns to NIGHT.
    #[test]
    fn scenario_tied_vote_eliminates_nobody() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        // Bring the roster down to 4 (one wolf, three town) so a 2-2 tie is
        // possible without hitting the parity win condition.
        game.kill_player(by_role(&game, Role::Werewolf)[0], DeathCause::Vote);
        game.kill_player(by_role(&game, Role::Villager)[0], DeathCause::WerewolfKill);
        game.rules.sheriff_election = false;
        game.enter_day_discuss();
        while game.advance_speaker().is_some() {}
        assert_eq!(game.phase, Phase::DayVote);

        let living: Vec<PlayerId> = game.living().map(|p| p.id).collect();
        assert_eq!(living.len(), 4);
        let round_before = game.round;
        game.submit_vote(living[0], Some(living[2])).unwrap();
        game.submit_vote(living[1], Some(living[2])).unwrap();
        game.submit_vote(living[2], Some(living[0])).unwrap();
        game.submit_vote(living[3], Some(living[0])).unwrap();
        assert!(game.all_voted());

        let tally = game.resolve_votes();
        assert_eq!(tally.eliminated, None);
        assert_eq!(game.living().count(), 4);
        assert_eq!(game.round, round_before + 1);
        assert_eq!(game.phase, Phase::Night);
    }

    #[test]
    fn town_wins_immediately_when_last_wolf_dies() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolves = by_role(&game, Role::Werewolf);
        game.kill_player(wolves[0], DeathCause::Vote);
        game.rules.sheriff_election = false;
        game.enter_day_discuss();
        while game.advance_speaker().is_some() {}

        let voters: Vec<PlayerId> = game.living().map(|p| p.id).collect();
        for &v in &voters {
            game.submit_vote(v, Some(wolves[1])).unwrap();
        }
        game.resolve_votes();
        assert_eq!(game.winner, Some(Faction::Town));
        assert_eq!(game.phase, Phase::GameOver);
    }

    #[test]
    fn wolves_win_at_parity() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        // Kill both villagers: 2 wolves vs seer+witch = parity.
        for v in by_role(&game, Role::Villager) {
            game.kill_player(v, DeathCause::WerewolfKill);
        }
        game.check_win();
        assert_eq!(game.winner, Some(Faction::Werewolves));
    }

    #[test]
    fn voted_out_hunter_gets_shot_window() {
        const NINE: [Role; 9] = [
            Role::Werewolf,
            Role::Werewolf,
            Role::Werewolf,
            Role::Villager,
            Role::Villager,
            Role::Villager,
            Role::Seer,
            Role::Witch,
            Role::Hunter,
        ];
        let mut game = full_room(9);
        deal(&mut game, &NINE);
        game.rules.sheriff_election = false;
        let hunter = by_role(&game, Role::Hunter)[0];
        game.enter_day_discuss();
        while game.advance_speaker().is_some() {}

        let voters: Vec<PlayerId> = game.living().map(|p| p.id).collect();
        for &v in &voters {
            game.submit_vote(v, Some(hunter)).unwrap();
        }
        game.resolve_votes();
        assert_eq!(game.phase, Phase::HunterShoot);
        assert_eq!(game.pending_hunter(), Some(hunter));

        let wolf = by_role(&game, Role::Werewolf)[0];
        game.hunter_shoot(hunter, wolf).unwrap();
        assert!(!game.player(wolf).unwrap().alive);
        assert_eq!(game.phase, Phase::Night);
        assert_eq!(game.round, 2);
    }

    #[test]
    fn poisoned_hunter_gets_no_shot_window() {
        const NINE: [Role; 9] = [
            Role::Werewolf,
            Role::Werewolf,
            Role::Werewolf,
            Role::Villager,
            Role::Villager,
            Role::Villager,
            Role::Seer,
            Role::Witch,
            Role::Hunter,
        ];
        let mut game = full_room(9);
        deal(&mut game, &NINE);
        let witch = by_role(&game, Role::Witch)[0];
        let hunter = by_role(&game, Role::Hunter)[0];
        game.submit_night_action(witch, NightActionKind::Poison, Some(hunter))
            .unwrap();
        game.resolve_night();
        assert!(!game.player(hunter).unwrap().alive);
        assert_eq!(game.pending_hunter(), None);
        assert_ne!(game.phase, Phase::HunterShoot);
    }

    #[test]
    fn guard_cannot_repeat_previous_target() {
        const TWELVE: [Role; 12] = [
            Role::Werewolf,
            Role::Werewolf,
            Role::Werewolf,
            Role::Werewolf,
            Role::Villager,
            Role::Villager,
            Role::Villager,
            Role::Villager,
            Role::Seer,
            Role::Witch,
            Role::Hunter,
            Role::Guard,
        ];
        let mut game = full_room(12);
        deal(&mut game, &TWELVE);
        let guard = by_role(&game, Role::Guard)[0];
        let target = by_role(&game, Role::Seer)[0];
        game.submit_night_action(guard, NightActionKind::Protect, Some(target))
            .unwrap();
        game.resolve_night();

        // Next night: same pick is rejected, another is fine.
        game.begin_night(true);
        assert_eq!(
            game.submit_night_action(guard, NightActionKind::Protect, Some(target)),
            Err(GameError::GuardRepeat)
        );
        let other = by_role(&game, Role::Witch)[0];
        assert!(game
            .submit_night_action(guard, NightActionKind::Protect, Some(other))
            .is_ok());
        // Self-protection is allowed.
        game.night_actions.clear();
        assert!(game
            .submit_night_action(guard, NightActionKind::Protect, Some(guard))
            .is_ok());
    }

    #[test]
    fn self_destruct_truncates_day_straight_to_night() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.rules.sheriff_election = false;
        game.enter_day_discuss();
        let wolf = by_role(&game, Role::Werewolf)[0];
        let round_before = game.round;
        game.self_destruct(wolf).unwrap();
        assert!(!game.player(wolf).unwrap().alive);
        assert_eq!(game.phase, Phase::Night);
        assert_eq!(game.round, round_before + 1);
    }

    #[test]
    fn self_destruct_denied_to_town() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.enter_day_discuss();
        let seer = by_role(&game, Role::Seer)[0];
        assert_eq!(game.self_destruct(seer), Err(GameError::CapabilityDenied));
    }

    #[test]
    fn sheriff_election_elects_by_ballots() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.enter_day_discuss();
        assert!(game.election.open);

        let candidate = by_role(&game, Role::Villager)[0];
        game.apply_sheriff(candidate).unwrap();
        for p in game.players.clone() {
            if p.id != candidate {
                game.vote_sheriff(p.id, candidate).unwrap();
            }
        }
        while game.advance_speaker().is_some() {}
        assert_eq!(game.phase, Phase::DayVote);
        assert_eq!(game.sheriff, Some(candidate));
        assert!(game.election.done);
    }

    #[test]
    fn dead_sheriff_triggers_badge_transfer() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.rules.sheriff_election = false;
        let sheriff = by_role(&game, Role::Villager)[0];
        game.sheriff = Some(sheriff);

        let wolves = by_role(&game, Role::Werewolf);
        for &wolf in &wolves {
            game.submit_night_action(wolf, NightActionKind::Kill, Some(sheriff))
                .unwrap();
        }
        game.resolve_night();
        assert_eq!(game.phase, Phase::BadgeTransfer);

        let successor = by_role(&game, Role::Seer)[0];
        game.badge_transfer(sheriff, Some(successor)).unwrap();
        assert_eq!(game.sheriff, Some(successor));
        assert_eq!(game.phase, Phase::DayDiscuss);
    }

    #[test]
    fn night_state_cleared_for_new_round() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        let wolves = by_role(&game, Role::Werewolf);
        let villager = by_role(&game, Role::Villager)[0];
        for &wolf in &wolves {
            game.submit_night_action(wolf, NightActionKind::Kill, Some(villager))
                .unwrap();
        }
        game.settle_wolf_consensus();
        assert!(game.pending_kill.is_some());
        game.begin_night(true);
        assert!(game.night_actions.is_empty());
        assert_eq!(game.pending_kill, None);
        assert!(!game.consensus_settled());
        assert!(game.players.iter().all(|p| !p.has_acted_night));
    }

    #[test]
    fn reconnect_preserves_player_state() {
        let mut game = full_room(6);
        deal(&mut game, &SIX);
        game.potions.antidote = false;
        let id = game.players[2].id;
        game.player_mut(id).unwrap().alive = false;
        game.mark_offline(id);
        assert!(!game.player(id).unwrap().online);
        game.mark_online(id);
        let p = game.player(id).unwrap();
        assert!(p.online);
        assert!(!p.alive);
        assert!(!game.potions.antidote);
        assert_eq!(game.players.len(), 6);
    }

    #[test]
    fn host_migration_on_waiting_leave() {
        let mut game = full_room(3);
        let host = game.host;
        let next = game.players[1].id;
        let empty = game.remove_player(host);
        assert!(!empty);
        assert_eq!(game.host, next);
        assert_eq!(game.players[0].position, 1);
    }
}
