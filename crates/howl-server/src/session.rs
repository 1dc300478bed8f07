use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use howl_core::action::NightActionKind;
use howl_core::ids::{PlayerId, RoomId};
use howl_core::net::messages::{ChatBroadcastMsg, ChatChannel, ServerMessage};
use howl_core::net::protocol::encode_server_message;
use howl_core::phase::Phase;
use howl_core::player::{Player, PlayerKind};
use howl_core::role::Role;
use howl_core::time::timestamp_now;
use howl_core::view::{RoomSummary, WolfChatView};
use howl_game::bot::{BotProfile, DecisionBackend, RuleFallback};
use howl_game::game::MAX_PLAYERS;
use howl_game::knowledge::KnowledgeView;
use howl_game::{Game, GameError, RulesConfig};

use crate::auth::SessionKeys;
use crate::config::ServerConfig;
use crate::error::game_error_reply;
use crate::replay::ReplayRecorder;
use crate::view::room_view;

/// Per-player sender for outbound WebSocket binary frames. Bounded so a slow
/// client can never wedge a room; uses `Bytes` for zero-copy fan-out.
pub type PlayerSender = mpsc::Sender<Bytes>;

/// Granted identity returned by join/reconnect.
#[derive(Debug, Clone)]
pub struct JoinGrant {
    pub player: PlayerId,
    /// Signed credential for reconnection; AI seats get none.
    pub resume_token: Option<String>,
}

/// Internal stats for the lobby listing and the idle sweeper.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub summary: RoomSummary,
    pub online_users: usize,
    pub idle_secs: u64,
}

/// Everything a room can be asked to do. The session task is the single
/// mutator of its room: human input, AI proposals, timer expiry, joins and
/// leaves all drain through this one channel, so no two mutations ever race.
pub enum SessionCommand {
    Join {
        name: String,
        kind: PlayerKind,
        sender: Option<PlayerSender>,
        /// For AI seats: the already-bound player asking to add the agent.
        via: Option<PlayerId>,
        reply: oneshot::Sender<Result<JoinGrant, String>>,
    },
    Reconnect {
        player: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<JoinGrant, String>>,
    },
    Disconnect { player: PlayerId },
    Leave { player: PlayerId },
    Start { player: PlayerId },
    Night {
        player: PlayerId,
        kind: NightActionKind,
        target: Option<PlayerId>,
    },
    CastVote {
        player: PlayerId,
        target: Option<PlayerId>,
    },
    Shoot { player: PlayerId, target: PlayerId },
    Badge {
        player: PlayerId,
        target: Option<PlayerId>,
    },
    ApplySheriff { player: PlayerId },
    VoteSheriff { player: PlayerId, target: PlayerId },
    SelfDestruct { player: PlayerId },
    Chat { player: PlayerId, content: String },
    Pause { player: PlayerId },
    Resume { player: PlayerId },
    ForceSkip { player: PlayerId },
    Stats { reply: oneshot::Sender<SessionStats> },
    Replay { reply: oneshot::Sender<serde_json::Value> },
    Shutdown,
}

/// Cheap cloneable handle to a room's session task.
#[derive(Clone)]
pub struct SessionHandle {
    pub room_id: RoomId,
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn send(&self, cmd: SessionCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn join(
        &self,
        name: String,
        kind: PlayerKind,
        sender: Option<PlayerSender>,
        via: Option<PlayerId>,
    ) -> Result<JoinGrant, String> {
        let (reply, rx) = oneshot::channel();
        if !self.send(SessionCommand::Join {
            name,
            kind,
            sender,
            via,
            reply,
        }) {
            return Err("Room no longer exists".to_string());
        }
        rx.await.map_err(|_| "Room no longer exists".to_string())?
    }

    pub async fn reconnect(
        &self,
        player: PlayerId,
        sender: PlayerSender,
    ) -> Result<JoinGrant, String> {
        let (reply, rx) = oneshot::channel();
        if !self.send(SessionCommand::Reconnect {
            player,
            sender,
            reply,
        }) {
            return Err("Room no longer exists".to_string());
        }
        rx.await.map_err(|_| "Room no longer exists".to_string())?
    }

    pub async fn stats(&self) -> Option<SessionStats> {
        let (reply, rx) = oneshot::channel();
        if !self.send(SessionCommand::Stats { reply }) {
            return None;
        }
        rx.await.ok()
    }

    pub async fn replay(&self) -> Option<serde_json::Value> {
        let (reply, rx) = oneshot::channel();
        if !self.send(SessionCommand::Replay { reply }) {
            return None;
        }
        rx.await.ok()
    }
}

/// Result of creating a room: the handle plus the host's granted identity.
pub struct SpawnedRoom {
    pub handle: SessionHandle,
    pub host: PlayerId,
    pub resume_token: String,
}

/// Spawn a new room session with the caller seated as host.
pub fn spawn(
    room_name: String,
    host_name: String,
    host_sender: PlayerSender,
    cfg: Arc<ServerConfig>,
    keys: SessionKeys,
) -> SpawnedRoom {
    let room_id = RoomId::new();
    let host_id = PlayerId::new();
    let host = Player::new(host_id, host_name, PlayerKind::User, 1);
    let mut game = Game::new(room_id, room_name, host);
    game.rules = RulesConfig {
        sheriff_vote_weight: cfg.rules.sheriff_vote_weight,
        sheriff_election: cfg.rules.sheriff_election,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = SessionHandle { room_id, tx: tx.clone() };
    let resume_token = keys.issue(room_id, host_id);

    let mut connections = HashMap::new();
    connections.insert(host_id, host_sender);

    let session = Session {
        game,
        cfg,
        keys,
        connections,
        recorder: ReplayRecorder::new(),
        backend: Arc::new(RuleFallback),
        profiles: HashMap::new(),
        cmd_tx: tx,
        deadline: None,
        remaining_on_pause: None,
        last_phase: Phase::Waiting,
        last_activity: Instant::now(),
    };
    tokio::spawn(session.run(rx));

    tracing::info!(room = %room_id, "Room created");
    SpawnedRoom {
        handle,
        host: host_id,
        resume_token,
    }
}

struct Session {
    game: Game,
    cfg: Arc<ServerConfig>,
    keys: SessionKeys,
    connections: HashMap<PlayerId, PlayerSender>,
    recorder: ReplayRecorder,
    backend: Arc<dyn DecisionBackend>,
    profiles: HashMap<PlayerId, BotProfile>,
    /// For AI tasks to re-enter the serialized mutation path.
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    deadline: Option<Instant>,
    remaining_on_pause: Option<Duration>,
    last_phase: Phase,
    last_activity: Instant,
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending::<()>().await,
    }
}

impl Session {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
        let room = self.game.room_id;
        loop {
            let armed = if self.game.paused { None } else { self.deadline };
            tokio::select! {
                cmd = rx.recv() => {
                    match cmd {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(cmd) => self.handle(cmd),
                    }
                }
                _ = sleep_until_opt(armed), if armed.is_some() => {
                    self.deadline = None;
                    self.on_deadline();
                }
            }
            self.pump();
            self.recorder.sync_from_log(&self.game.log);
            self.broadcast_views();
            if self.game.players.is_empty() {
                break;
            }
        }
        tracing::info!(room = %room, "Room session ended");
    }

    // ---- command dispatch --------------------------------------------------

    fn handle(&mut self, cmd: SessionCommand) {
        use SessionCommand::*;
        match cmd {
            Join {
                name,
                kind,
                sender,
                via,
                reply,
            } => {
                let _ = reply.send(self.join(name, kind, sender, via));
            },
            Reconnect {
                player,
                sender,
                reply,
            } => {
                let _ = reply.send(self.rebind(player, sender));
            },
            Disconnect { player } | Leave { player } => self.detach(player),
            Start { player } => {
                self.touch();
                if let Err(e) = self.game.start(player) {
                    self.reject(player, &e);
                }
            },
            Night {
                player,
                kind,
                target,
            } => {
                self.touch();
                if let Err(e) = self.game.submit_night_action(player, kind, target) {
                    self.reject(player, &e);
                }
            },
            CastVote { player, target } => {
                self.touch();
                if let Err(e) = self.game.submit_vote(player, target) {
                    self.reject(player, &e);
                }
            },
            Shoot { player, target } => {
                self.touch();
                if let Err(e) = self.game.hunter_shoot(player, target) {
                    self.reject(player, &e);
                }
            },
            Badge { player, target } => {
                self.touch();
                if let Err(e) = self.game.badge_transfer(player, target) {
                    self.reject(player, &e);
                }
            },
            ApplySheriff { player } => {
                self.touch();
                if let Err(e) = self.game.apply_sheriff(player) {
                    self.reject(player, &e);
                }
            },
            VoteSheriff { player, target } => {
                self.touch();
                if let Err(e) = self.game.vote_sheriff(player, target) {
                    self.reject(player, &e);
                }
            },
            SelfDestruct { player } => {
                self.touch();
                if let Err(e) = self.game.self_destruct(player) {
                    self.reject(player, &e);
                }
            },
            Chat { player, content } => {
                self.touch();
                self.chat(player, content);
            },
            Pause { player } => {
                self.touch();
                match self.game.host_pause(player) {
                    Ok(()) => self.freeze_clock(),
                    Err(e) => self.reject(player, &e),
                }
            },
            Resume { player } => {
                self.touch();
                match self.game.host_resume(player) {
                    Ok(()) => self.thaw_clock(),
                    Err(e) => self.reject(player, &e),
                }
            },
            ForceSkip { player } => {
                self.touch();
                if let Err(e) = self.game.assert_host(player) {
                    self.reject(player, &e);
                } else if self.game.phase == Phase::DayDiscuss {
                    self.advance_speaker_clocked();
                }
            },
            Stats { reply } => {
                let _ = reply.send(self.stats());
            },
            Replay { reply } => {
                let _ = reply.send(self.recorder.export(&self.game));
            },
            Shutdown => {},
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            summary: RoomSummary {
                id: self.game.room_id,
                name: self.game.room_name.clone(),
                players: self.game.players.len(),
                max_players: MAX_PLAYERS,
                phase: self.game.phase,
            },
            online_users: self
                .game
                .players
                .iter()
                .filter(|p| p.online && !p.is_ai())
                .count(),
            idle_secs: self.last_activity.elapsed().as_secs(),
        }
    }

    // ---- membership --------------------------------------------------------

    fn join(
        &mut self,
        name: String,
        kind: PlayerKind,
        sender: Option<PlayerSender>,
        via: Option<PlayerId>,
    ) -> Result<JoinGrant, String> {
        self.touch();
        let name = name.trim().to_string();
        if name.is_empty() || name.len() > 32 || name.chars().any(|c| c.is_control()) {
            return Err("Invalid player name".to_string());
        }
        if kind == PlayerKind::Ai && via != Some(self.game.host) {
            return Err("Only the host can add AI players".to_string());
        }

        let id = self
            .game
            .add_player(name, kind)
            .map_err(|e| e.to_string())?;
        if let Some(sender) = sender {
            self.connections.insert(id, sender);
        }
        let resume_token = match kind {
            PlayerKind::User => Some(self.keys.issue(self.game.room_id, id)),
            PlayerKind::Ai => {
                let mut rng = rand::rng();
                self.profiles.insert(
                    id,
                    BotProfile {
                        analytical: rng.random_bool(0.4),
                    },
                );
                None
            },
        };
        tracing::info!(room = %self.game.room_id, player = %id, ?kind, "Player joined");
        Ok(JoinGrant {
            player: id,
            resume_token,
        })
    }

    /// Idempotent reconnection: rebinds the connection to the existing seat
    /// without touching alive/potion/round state.
    fn rebind(&mut self, player: PlayerId, sender: PlayerSender) -> Result<JoinGrant, String> {
        self.touch();
        if self.game.player(player).is_none() {
            return Err("authentication failed".to_string());
        }
        self.connections.insert(player, sender);
        self.game.mark_online(player);
        tracing::info!(room = %self.game.room_id, player = %player, "Player reconnected");
        Ok(JoinGrant {
            player,
            resume_token: Some(self.keys.issue(self.game.room_id, player)),
        })
    }

    /// Connection gone (or explicit leave). In WAITING the seat is removed
    /// outright; mid-game it survives offline for reconnection.
    fn detach(&mut self, player: PlayerId) {
        self.touch();
        self.connections.remove(&player);
        if self.game.phase == Phase::Waiting {
            self.game.remove_player(player);
        } else {
            self.game.mark_offline(player);
        }
        tracing::info!(room = %self.game.room_id, player = %player, "Player detached");
    }

    // ---- chat --------------------------------------------------------------

    fn chat(&mut self, player: PlayerId, content: String) {
        if content.is_empty()
            || content.len() > self.cfg.limits.max_chat_len
            || content.chars().any(|c| c.is_control() && c != '\n')
        {
            return;
        }
        let Some(p) = self.game.player(player) else {
            return;
        };
        let sender_name = p.display_name.clone();
        let is_wolf = p.is_wolf();
        let alive = p.alive;
        let timestamp = timestamp_now();

        // Werewolves get a private channel at night; everything else is
        // table talk.
        if self.game.phase == Phase::Night && is_wolf && alive {
            self.game.wolf_chat.push(WolfChatView {
                sender: player,
                content: content.clone(),
                round: self.game.round,
                timestamp: timestamp.clone(),
            });
            self.recorder.add(
                "wolf_chat",
                serde_json::json!({ "sender": player.to_string(), "content": content }),
            );
            let msg = ServerMessage::Chat(ChatBroadcastMsg {
                sender: player,
                sender_name,
                content,
                channel: ChatChannel::Werewolves,
                phase: self.game.phase,
                timestamp,
            });
            self.send_to_wolves(&msg);
            return;
        }

        let is_speech = self.game.phase == Phase::DayDiscuss
            && self.game.speakers.current() == Some(player);
        if is_speech {
            if let Err(e) = self.game.record_speech(player, content.clone()) {
                self.reject(player, &e);
                return;
            }
            self.recorder.add(
                "speech",
                serde_json::json!({ "sender": player.to_string(), "content": content }),
            );
        } else {
            self.recorder.add(
                "chat",
                serde_json::json!({ "sender": player.to_string(), "content": content }),
            );
        }

        let msg = ServerMessage::Chat(ChatBroadcastMsg {
            sender: player,
            sender_name,
            content,
            channel: ChatChannel::All,
            phase: self.game.phase,
            timestamp,
        });
        self.broadcast_msg(&msg);

        if is_speech {
            // The speech ends the speaker's turn.
            self.advance_speaker_clocked();
        }
    }

    // ---- timers and auto-progress ------------------------------------------

    fn set_deadline(&mut self, secs: u64) {
        self.deadline = Some(Instant::now() + Duration::from_secs(secs));
    }

    fn freeze_clock(&mut self) {
        self.remaining_on_pause = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()));
        self.deadline = None;
    }

    fn thaw_clock(&mut self) {
        if let Some(rem) = self.remaining_on_pause.take() {
            self.deadline = Some(Instant::now() + rem);
        }
    }

    /// Post-mutation bookkeeping: settle the wolf consensus once the last
    /// wolf has spoken, resolve phases whose inputs are complete, and react
    /// to any phase transition.
    fn pump(&mut self) {
        if self.game.phase == Phase::Night
            && !self.game.consensus_settled()
            && self.game.living_wolves().count() > 0
            && self.game.all_wolves_acted()
        {
            self.game.settle_wolf_consensus();
            self.schedule_ai_witch();
        }
        if self.game.phase == Phase::Night && self.game.night_complete() {
            self.deadline = None;
            self.game.resolve_night();
        }
        if self.game.phase == Phase::DayVote && self.game.all_voted() {
            self.deadline = None;
            self.game.resolve_votes();
        }
        self.sync_phase();
    }

    fn sync_phase(&mut self) {
        while self.game.phase != self.last_phase {
            let phase = self.game.phase;
            self.last_phase = phase;
            self.on_phase_enter(phase);
        }
    }

    fn on_phase_enter(&mut self, phase: Phase) {
        self.remaining_on_pause = None;
        match phase {
            Phase::Waiting => self.deadline = None,
            Phase::Night => {
                self.set_deadline(self.cfg.timing.night_secs);
                self.schedule_ai_night();
            },
            Phase::DayDiscuss => {
                self.set_deadline(self.cfg.timing.speech_secs);
                self.maybe_ai_speaker();
            },
            Phase::DayVote => {
                self.set_deadline(self.cfg.timing.vote_secs);
                self.schedule_ai_votes();
            },
            Phase::HunterShoot => {
                self.set_deadline(self.cfg.timing.hunter_secs);
            },
            Phase::BadgeTransfer => {
                self.set_deadline(self.cfg.timing.badge_secs);
            },
            Phase::GameOver => {
                self.deadline = None;
                tracing::info!(
                    room = %self.game.room_id,
                    winner = ?self.game.winner,
                    round = self.game.round,
                    "Game over"
                );
            },
        }
    }

    /// A phase clock ran out. Timers are the only forcing function: every
    /// branch below falls back to the phase's skip default, so an
    /// unresponsive player can never deadlock the room.
    fn on_deadline(&mut self) {
        match self.game.phase {
            Phase::Night => {
                // Wolves first, so the consensus the witch reacts to is
                // final; then everyone else against the settled target.
                self.run_overdue_ai_night(|role| role == Role::Werewolf);
                self.game.settle_wolf_consensus();
                self.run_overdue_ai_night(|role| role != Role::Werewolf);
                self.game.resolve_night();
            },
            Phase::DayDiscuss => self.advance_speaker_clocked(),
            Phase::DayVote => {
                self.run_overdue_ai_votes();
                self.game.resolve_votes();
            },
            Phase::HunterShoot => {
                if !self.ai_hunter_shot() {
                    self.game.skip_hunter();
                }
            },
            Phase::BadgeTransfer => {
                if !self.ai_badge_transfer() {
                    self.game.skip_badge();
                }
            },
            Phase::Waiting | Phase::GameOver => {},
        }
    }

    fn advance_speaker_clocked(&mut self) {
        let next = self.game.advance_speaker();
        if self.game.phase == Phase::DayDiscuss && next.is_some() {
            self.set_deadline(self.cfg.timing.speech_secs);
            self.maybe_ai_speaker();
        }
        // Otherwise the discussion ended; sync_phase arms the vote clock.
    }

    // ---- AI scheduling -----------------------------------------------------
    //
    // Decisions are computed off the serialized path against an immutable
    // knowledge snapshot, then re-enter through the same command channel as
    // human input — a slow decision never blocks the room, and two agents
    // can never race each other's mutations.

    fn ai_delay(&self) -> Duration {
        let mut rng = rand::rng();
        let ms = rng.random_range(self.cfg.timing.ai_min_delay_ms..=self.cfg.timing.ai_max_delay_ms);
        Duration::from_millis(ms)
    }

    fn schedule_ai_night(&mut self) {
        let ids: Vec<PlayerId> = self
            .game
            .living()
            .filter(|p| p.is_ai() && p.role.is_some_and(|r| r.acts_at_night()))
            // The witch waits for the wolf consensus.
            .filter(|p| p.role != Some(Role::Witch))
            .map(|p| p.id)
            .collect();
        for id in ids {
            self.spawn_ai_night_task(id);
        }
    }

    fn schedule_ai_witch(&mut self) {
        let ids: Vec<PlayerId> = self
            .game
            .living()
            .filter(|p| p.is_ai() && p.role == Some(Role::Witch) && !p.has_acted_night)
            .map(|p| p.id)
            .collect();
        for id in ids {
            self.spawn_ai_night_task(id);
        }
    }

    fn spawn_ai_night_task(&self, id: PlayerId) {
        let Some(view) = KnowledgeView::for_player(&self.game, id) else {
            return;
        };
        let profile = self.profiles.get(&id).copied().unwrap_or_default();
        let backend = Arc::clone(&self.backend);
        let tx = self.cmd_tx.clone();
        let delay = self.ai_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let cmd = match backend.decide_night(&view, None, profile) {
                Some(p) => SessionCommand::Night {
                    player: id,
                    kind: p.kind,
                    target: p.target,
                },
                None => SessionCommand::Night {
                    player: id,
                    kind: NightActionKind::Skip,
                    target: None,
                },
            };
            let _ = tx.send(cmd);
        });
    }

    fn schedule_ai_votes(&mut self) {
        let ids: Vec<PlayerId> = self
            .game
            .living()
            .filter(|p| p.is_ai())
            .map(|p| p.id)
            .collect();
        for id in ids {
            let Some(view) = KnowledgeView::for_player(&self.game, id) else {
                continue;
            };
            let profile = self.profiles.get(&id).copied().unwrap_or_default();
            let backend = Arc::clone(&self.backend);
            let tx = self.cmd_tx.clone();
            let delay = self.ai_delay();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let target = backend.decide_vote(&view, None, profile);
                let _ = tx.send(SessionCommand::CastVote { player: id, target });
            });
        }
    }

    /// An AI speaker takes a brief turn and passes.
    fn maybe_ai_speaker(&mut self) {
        let Some(current) = self.game.speakers.current() else {
            return;
        };
        let Some(p) = self.game.player(current) else {
            return;
        };
        if !p.is_ai() {
            return;
        }
        const PASS_LINES: [&str; 4] = [
            "I'll pass for now.",
            "Nothing from me this round.",
            "I'm still listening.",
            "No read yet, let's hear the others.",
        ];
        let mut rng = rand::rng();
        let line = PASS_LINES.choose(&mut rng).copied().unwrap_or(PASS_LINES[0]);
        let tx = self.cmd_tx.clone();
        let delay = self.ai_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionCommand::Chat {
                player: current,
                content: line.to_string(),
            });
        });
    }

    /// Night clock ran out with AI actors still undecided: decide inline so
    /// resolution always sees their input. Validation still applies.
    fn run_overdue_ai_night(&mut self, role_filter: impl Fn(Role) -> bool) {
        let overdue: Vec<PlayerId> = self
            .game
            .living()
            .filter(|p| {
                p.is_ai()
                    && !p.has_acted_night
                    && p.role.is_some_and(|r| r.acts_at_night() && role_filter(r))
            })
            .map(|p| p.id)
            .collect();
        for id in overdue {
            let Some(view) = KnowledgeView::for_player(&self.game, id) else {
                continue;
            };
            let profile = self.profiles.get(&id).copied().unwrap_or_default();
            if let Some(p) = self.backend.decide_night(&view, None, profile)
                && let Err(e) = self.game.submit_night_action(id, p.kind, p.target)
            {
                tracing::debug!(player = %id, error = %e, "Overdue AI night action rejected");
            }
        }
    }

    fn run_overdue_ai_votes(&mut self) {
        let overdue: Vec<PlayerId> = self
            .game
            .living()
            .filter(|p| p.is_ai() && !p.has_voted)
            .map(|p| p.id)
            .collect();
        for id in overdue {
            let Some(view) = KnowledgeView::for_player(&self.game, id) else {
                continue;
            };
            let profile = self.profiles.get(&id).copied().unwrap_or_default();
            let target = self.backend.decide_vote(&view, None, profile);
            if let Err(e) = self.game.submit_vote(id, target) {
                tracing::debug!(player = %id, error = %e, "Overdue AI vote rejected");
            }
        }
    }

    /// Returns true when an AI hunter took the shot.
    fn ai_hunter_shot(&mut self) -> bool {
        let Some(hunter) = self.game.pending_hunter() else {
            return false;
        };
        if !self.game.player(hunter).is_some_and(|p| p.is_ai()) {
            return false;
        }
        let Some(view) = KnowledgeView::for_player(&self.game, hunter) else {
            return false;
        };
        if let Some(target) = self.backend.decide_shot(&view, None) {
            return self.game.hunter_shoot(hunter, target).is_ok();
        }
        false
    }

    /// Returns true when an AI sheriff passed the badge.
    fn ai_badge_transfer(&mut self) -> bool {
        let Some(sheriff) = self.game.sheriff else {
            return false;
        };
        if !self.game.player(sheriff).is_some_and(|p| p.is_ai()) {
            return false;
        }
        let Some(view) = KnowledgeView::for_player(&self.game, sheriff) else {
            return false;
        };
        let target = self.backend.decide_badge(&view);
        self.game.badge_transfer(sheriff, target).is_ok()
    }

    // ---- outbound ----------------------------------------------------------

    fn reject(&self, player: PlayerId, err: &GameError) {
        tracing::debug!(room = %self.game.room_id, player = %player, error = %err, "Action rejected");
        let msg = ServerMessage::Error(game_error_reply(err));
        self.send_to(player, &msg);
    }

    fn send_to(&self, player: PlayerId, msg: &ServerMessage) {
        if let Some(sender) = self.connections.get(&player)
            && let Ok(data) = encode_server_message(msg)
            && sender.try_send(Bytes::from(data)).is_err()
        {
            tracing::debug!(player = %player, "Dropped message to slow or gone client");
        }
    }

    fn send_to_wolves(&self, msg: &ServerMessage) {
        let Ok(data) = encode_server_message(msg) else {
            return;
        };
        let bytes = Bytes::from(data);
        for p in self.game.players.iter().filter(|p| p.is_wolf()) {
            if let Some(sender) = self.connections.get(&p.id)
                && sender.try_send(bytes.clone()).is_err()
            {
                tracing::debug!(player = %p.id, "Dropped wolf chat to slow client");
            }
        }
    }

    fn broadcast_msg(&self, msg: &ServerMessage) {
        let Ok(data) = encode_server_message(msg) else {
            return;
        };
        let bytes = Bytes::from(data);
        for (id, sender) in &self.connections {
            if sender.try_send(bytes.clone()).is_err() {
                tracing::debug!(player = %id, "Dropped broadcast to slow client");
            }
        }
    }

    /// Recompute and push every player's sanitized view.
    fn broadcast_views(&self) {
        let deadline_secs = if self.game.paused {
            self.remaining_on_pause.map(|d| d.as_secs())
        } else {
            self.deadline
                .map(|d| d.saturating_duration_since(Instant::now()).as_secs())
        };
        for player in &self.game.players {
            let Some(sender) = self.connections.get(&player.id) else {
                continue;
            };
            let view = room_view(&self.game, player, deadline_secs);
            let msg = ServerMessage::RoomState(Box::new(
                howl_core::net::messages::RoomStateMsg { view },
            ));
            if let Ok(data) = encode_server_message(&msg)
                && sender.try_send(Bytes::from(data)).is_err()
            {
                tracing::debug!(player = %player.id, "Dropped state push to slow client");
            }
        }
    }
}
