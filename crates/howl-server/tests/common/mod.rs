use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use howl_core::ids::RoomId;
use howl_core::net::messages::{
    ClientMessage, CreateRoomMsg, JoinResponseMsg, JoinRoomMsg, ServerMessage,
};
use howl_core::net::protocol::{
    PROTOCOL_VERSION, decode_server_message, encode_client_message,
};

use howl_server::config::{ServerConfig, TimingConfig};
use howl_server::{build_app, spawn_idle_sweeper};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with default (slow) phase clocks.
    #[allow(dead_code)]
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);
        spawn_idle_sweeper(state);

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _server: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Phase clocks long enough that a test can act mid-phase without racing the
/// engine, but AI agents still answer quickly.
#[allow(dead_code)]
pub fn steady_timing() -> ServerConfig {
    ServerConfig {
        timing: TimingConfig {
            night_secs: 10,
            speech_secs: 10,
            vote_secs: 10,
            hunter_secs: 10,
            badge_secs: 10,
            ai_min_delay_ms: 50,
            ai_max_delay_ms: 100,
        },
        ..ServerConfig::default()
    }
}

pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn send_client(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Read the next ServerMessage (5s timeout).
pub async fn read_server_msg(stream: &mut WsStream) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return decode_server_message(&data).expect("should decode");
                },
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Read messages until one matches `pred`, skipping state pushes and chatter.
pub async fn read_until<F>(stream: &mut WsStream, pred: F) -> ServerMessage
where
    F: Fn(&ServerMessage) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = read_server_msg(stream).await;
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("Timed out waiting for expected message")
}

/// Try to read one message, returning None on timeout.
#[allow(dead_code)]
pub async fn try_read(stream: &mut WsStream, timeout_ms: u64) -> Option<ServerMessage> {
    tokio::time::timeout(Duration::from_millis(timeout_ms), read_server_msg(stream))
        .await
        .ok()
}

/// Open a room and return the host's join response.
pub async fn create_room(stream: &mut WsStream, room_name: &str, player_name: &str) -> JoinResponseMsg {
    send_client(
        stream,
        &ClientMessage::CreateRoom(CreateRoomMsg {
            room_name: room_name.to_string(),
            player_name: player_name.to_string(),
            protocol_version: PROTOCOL_VERSION,
        }),
    )
    .await;
    match read_until(stream, |m| matches!(m, ServerMessage::JoinResponse(_))).await {
        ServerMessage::JoinResponse(join) => join,
        _ => unreachable!(),
    }
}

/// Join an existing room and return the response (success or failure).
pub async fn join_room(stream: &mut WsStream, room_id: RoomId, player_name: &str) -> JoinResponseMsg {
    send_client(
        stream,
        &ClientMessage::JoinRoom(JoinRoomMsg {
            room_id,
            player_name: player_name.to_string(),
            is_ai: false,
            resume_token: None,
            protocol_version: PROTOCOL_VERSION,
        }),
    )
    .await;
    match read_until(stream, |m| matches!(m, ServerMessage::JoinResponse(_))).await {
        ServerMessage::JoinResponse(join) => join,
        _ => unreachable!(),
    }
}

/// Reconnect with a previously issued resume token.
#[allow(dead_code)]
pub async fn reconnect(stream: &mut WsStream, room_id: RoomId, token: &str) -> JoinResponseMsg {
    send_client(
        stream,
        &ClientMessage::JoinRoom(JoinRoomMsg {
            room_id,
            player_name: String::new(),
            is_ai: false,
            resume_token: Some(token.to_string()),
            protocol_version: PROTOCOL_VERSION,
        }),
    )
    .await;
    match read_until(stream, |m| matches!(m, ServerMessage::JoinResponse(_))).await {
        ServerMessage::JoinResponse(join) => join,
        _ => unreachable!(),
    }
}

/// Ask the host connection to seat an AI agent.
#[allow(dead_code)]
pub async fn add_ai(stream: &mut WsStream, room_id: RoomId, name: &str) -> JoinResponseMsg {
    send_client(
        stream,
        &ClientMessage::JoinRoom(JoinRoomMsg {
            room_id,
            player_name: name.to_string(),
            is_ai: true,
            resume_token: None,
            protocol_version: PROTOCOL_VERSION,
        }),
    )
    .await;
    match read_until(stream, |m| matches!(m, ServerMessage::JoinResponse(_))).await {
        ServerMessage::JoinResponse(join) => join,
        _ => unreachable!(),
    }
}
