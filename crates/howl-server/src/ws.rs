use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, FromRequest, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use howl_core::ids::PlayerId;
use howl_core::net::messages::{
    ClientMessage, CreateRoomMsg, JoinResponseMsg, JoinRoomMsg, ServerMessage,
};
use howl_core::net::protocol::{
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION, decode_client_message, encode_server_message,
};
use howl_core::player::PlayerKind;

use crate::error::auth_failure_reply;
use crate::session::{self, SessionCommand, SessionHandle};
use crate::state::{AppState, ConnectionGuard, IpConnectionGuard};

pub async fn ws_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<axum::response::Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));
    let max_per_ip = state.config.limits.max_ws_per_ip;
    let Some(ip_guard) =
        IpConnectionGuard::try_acquire(ip, Arc::clone(&state.ws_per_ip), max_per_ip)
    else {
        tracing::warn!(%ip, max_per_ip, "Per-IP WS connection limit reached");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    };

    let ws = WebSocketUpgrade::from_request(request, &state)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, ip_guard))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState, _ip_guard: IpConnectionGuard) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // The connection is anonymous until its first frame binds it to a player
    // identity: CreateRoom or JoinRoom, nothing else.
    let first = match ws_receiver.next().await {
        Some(Ok(Message::Binary(data))) => data,
        _ => return,
    };
    let Ok(first_msg) = decode_client_message(&first) else {
        return;
    };

    let bound = match first_msg {
        ClientMessage::CreateRoom(m) => create_room(&state, m).await,
        ClientMessage::JoinRoom(m) => join_room(&state, m).await,
        _ => Err("Expected CreateRoom or JoinRoom".to_string()),
    };

    let (handle, player_id, tx, rx) = match bound {
        Ok(b) => b,
        Err(error) => {
            send_join_error(&mut ws_sender, &error).await;
            return;
        },
    };

    let response = JoinResponseMsg {
        success: true,
        room_id: Some(handle.room_id),
        player_id: Some(player_id),
        resume_token: tx.1.clone(),
        error: None,
    };
    if let Ok(data) = encode_server_message(&ServerMessage::JoinResponse(response)) {
        if ws_sender.send(Message::Binary(data.into())).await.is_err() {
            handle.send(SessionCommand::Disconnect { player: player_id });
            return;
        }
    }

    spawn_writer(ws_sender, rx);
    read_loop(&mut ws_receiver, &state, &handle, player_id, tx.0).await;

    // Connection gone: the session keeps the seat mid-game, or frees it in
    // the lobby.
    handle.send(SessionCommand::Disconnect { player: player_id });
    tracing::info!(player = %player_id, room = %handle.room_id, "Connection closed");
}

type Bound = (
    SessionHandle,
    PlayerId,
    (mpsc::Sender<Bytes>, Option<String>),
    mpsc::Receiver<Bytes>,
);

async fn create_room(state: &AppState, msg: CreateRoomMsg) -> Result<Bound, String> {
    check_protocol_version(msg.protocol_version)?;
    let room_name = msg.room_name.trim().to_string();
    if room_name.is_empty() || room_name.len() > 64 || room_name.chars().any(|c| c.is_control()) {
        return Err("Invalid room name".to_string());
    }
    let player_name = msg.player_name.trim().to_string();
    if player_name.is_empty() || player_name.len() > 32 {
        return Err("Invalid player name".to_string());
    }

    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);
    let spawned = session::spawn(
        room_name,
        player_name,
        tx.clone(),
        Arc::clone(&state.config),
        state.keys.clone(),
    );
    {
        let mut registry = state.registry.write().await;
        registry.insert(spawned.handle.clone());
    }
    Ok((
        spawned.handle,
        spawned.host,
        (tx, Some(spawned.resume_token)),
        rx,
    ))
}

async fn join_room(state: &AppState, msg: JoinRoomMsg) -> Result<Bound, String> {
    check_protocol_version(msg.protocol_version)?;
    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);

    // A resume token takes precedence: its signed (room, player) binding is
    // the identity, not anything else in the payload.
    if let Some(ref token) = msg.resume_token {
        let generic = auth_failure_reply().message;
        let Some((room, player)) = state.keys.verify(token) else {
            return Err(generic);
        };
        let handle = {
            let registry = state.registry.read().await;
            registry.handle(room)
        };
        let Some(handle) = handle else {
            return Err(generic);
        };
        let grant = handle.reconnect(player, tx.clone()).await?;
        return Ok((handle, grant.player, (tx, grant.resume_token), rx));
    }

    if msg.is_ai {
        // AI seats are added from an already-bound host connection, not by
        // fresh anonymous ones.
        return Err("AI players are added from the host connection".to_string());
    }

    let handle = {
        let registry = state.registry.read().await;
        registry.handle(msg.room_id)
    };
    let Some(handle) = handle else {
        return Err("Room not found".to_string());
    };
    let grant = handle
        .join(msg.player_name, PlayerKind::User, Some(tx.clone()), None)
        .await?;
    Ok((handle, grant.player, (tx, grant.resume_token), rx))
}

fn check_protocol_version(version: u8) -> Result<(), String> {
    if version != 0 && version != PROTOCOL_VERSION {
        return Err(format!(
            "Protocol version mismatch: client={version}, server={PROTOCOL_VERSION}"
        ));
    }
    Ok(())
}

async fn send_join_error(
    ws_sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    error: &str,
) {
    let msg = ServerMessage::JoinResponse(JoinResponseMsg {
        success: false,
        room_id: None,
        player_id: None,
        resume_token: None,
        error: Some(error.to_string()),
    });
    if let Ok(data) = encode_server_message(&msg)
        && let Err(e) = ws_sender.send(Message::Binary(data.into())).await
    {
        tracing::debug!(error = %e, "Failed to send join error response");
    }
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Bytes>,
) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender.send(Message::Binary(data)).await.is_err() {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Relay inbound frames to the room session. The claimed contents of a
/// message never name a player: the trusted `player_id` bound at join time
/// is attached here, so no frame can ever act as someone else.
async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    handle: &SessionHandle,
    player_id: PlayerId,
    own_tx: mpsc::Sender<Bytes>,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(player = %player_id, "Rate limited");
            continue;
        }
        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            continue;
        }
        let Ok(client_msg) = decode_client_message(&data) else {
            continue;
        };

        let cmd = match client_msg {
            // Already bound; a second bind on the same connection is only
            // meaningful for seating an AI agent.
            ClientMessage::CreateRoom(_) => continue,
            ClientMessage::JoinRoom(m) if m.is_ai => {
                let grant = handle
                    .join(m.player_name, PlayerKind::Ai, None, Some(player_id))
                    .await;
                let response = match grant {
                    Ok(g) => JoinResponseMsg {
                        success: true,
                        room_id: Some(handle.room_id),
                        player_id: Some(g.player),
                        resume_token: None,
                        error: None,
                    },
                    Err(e) => JoinResponseMsg {
                        success: false,
                        room_id: None,
                        player_id: None,
                        resume_token: None,
                        error: Some(e),
                    },
                };
                if let Ok(data) =
                    encode_server_message(&ServerMessage::JoinResponse(response))
                {
                    let _ = own_tx.try_send(Bytes::from(data));
                }
                continue;
            },
            ClientMessage::JoinRoom(_) => continue,
            ClientMessage::LeaveRoom(_) => {
                handle.send(SessionCommand::Leave { player: player_id });
                break;
            },
            ClientMessage::StartGame(_) => SessionCommand::Start { player: player_id },
            ClientMessage::NightAction(m) => SessionCommand::Night {
                player: player_id,
                kind: m.kind,
                target: m.target,
            },
            ClientMessage::Vote(m) => SessionCommand::CastVote {
                player: player_id,
                target: m.target,
            },
            ClientMessage::HunterShoot(m) => SessionCommand::Shoot {
                player: player_id,
                target: m.target,
            },
            ClientMessage::BadgeTransfer(m) => SessionCommand::Badge {
                player: player_id,
                target: m.target,
            },
            ClientMessage::ApplySheriff(_) => SessionCommand::ApplySheriff { player: player_id },
            ClientMessage::VoteSheriff(m) => SessionCommand::VoteSheriff {
                player: player_id,
                target: m.target,
            },
            ClientMessage::SelfDestruct(_) => SessionCommand::SelfDestruct { player: player_id },
            ClientMessage::Chat(m) => SessionCommand::Chat {
                player: player_id,
                content: m.content,
            },
            ClientMessage::HostPause(_) => SessionCommand::Pause { player: player_id },
            ClientMessage::HostResume(_) => SessionCommand::Resume { player: player_id },
            ClientMessage::HostForceSkip(_) => SessionCommand::ForceSkip { player: player_id },
        };

        if !handle.send(cmd) {
            // Session gone; nothing left to relay.
            break;
        }
    }
}
