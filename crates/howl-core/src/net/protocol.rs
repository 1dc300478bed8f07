use serde::{Deserialize, Serialize};

use super::messages::{
    ApplySheriffMsg, BadgeTransferMsg, ChatBroadcastMsg, ChatMsg, ClientMessage, CreateRoomMsg,
    ErrorReplyMsg, HostForceSkipMsg, HostPauseMsg, HostResumeMsg, HunterShootMsg, JoinResponseMsg,
    JoinRoomMsg, LeaveRoomMsg, MessageType, NightActionMsg, RoomStateMsg, SelfDestructMsg,
    ServerMessage, StartGameMsg, VoteMsg, VoteSheriffMsg,
};

/// Current protocol version. Checked at room creation/join.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(f, "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})")
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::CreateRoom(m) => encode_message(MessageType::CreateRoom, m),
        ClientMessage::JoinRoom(m) => encode_message(MessageType::JoinRoom, m),
        ClientMessage::LeaveRoom(m) => encode_message(MessageType::LeaveRoom, m),
        ClientMessage::StartGame(m) => encode_message(MessageType::StartGame, m),
        ClientMessage::NightAction(m) => encode_message(MessageType::NightAction, m),
        ClientMessage::Vote(m) => encode_message(MessageType::Vote, m),
        ClientMessage::HunterShoot(m) => encode_message(MessageType::HunterShoot, m),
        ClientMessage::BadgeTransfer(m) => encode_message(MessageType::BadgeTransfer, m),
        ClientMessage::ApplySheriff(m) => encode_message(MessageType::ApplySheriff, m),
        ClientMessage::VoteSheriff(m) => encode_message(MessageType::VoteSheriff, m),
        ClientMessage::SelfDestruct(m) => encode_message(MessageType::SelfDestruct, m),
        ClientMessage::Chat(m) => encode_message(MessageType::Chat, m),
        ClientMessage::HostPause(m) => encode_message(MessageType::HostPause, m),
        ClientMessage::HostResume(m) => encode_message(MessageType::HostResume, m),
        ClientMessage::HostForceSkip(m) => encode_message(MessageType::HostForceSkip, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::JoinResponse(m) => encode_message(MessageType::JoinResponse, m),
        ServerMessage::RoomState(m) => encode_message(MessageType::RoomState, m.as_ref()),
        ServerMessage::Chat(m) => encode_message(MessageType::ChatBroadcast, m),
        ServerMessage::Error(m) => encode_message(MessageType::ErrorReply, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::CreateRoom => Ok(ClientMessage::CreateRoom(
            decode_payload::<CreateRoomMsg>(data)?,
        )),
        MessageType::JoinRoom => Ok(ClientMessage::JoinRoom(decode_payload::<JoinRoomMsg>(
            data,
        )?)),
        MessageType::LeaveRoom => Ok(ClientMessage::LeaveRoom(decode_payload::<LeaveRoomMsg>(
            data,
        )?)),
        MessageType::StartGame => Ok(ClientMessage::StartGame(decode_payload::<StartGameMsg>(
            data,
        )?)),
        MessageType::NightAction => Ok(ClientMessage::NightAction(decode_payload::<
            NightActionMsg,
        >(data)?)),
        MessageType::Vote => Ok(ClientMessage::Vote(decode_payload::<VoteMsg>(data)?)),
        MessageType::HunterShoot => Ok(ClientMessage::HunterShoot(decode_payload::<
            HunterShootMsg,
        >(data)?)),
        MessageType::BadgeTransfer => Ok(ClientMessage::BadgeTransfer(decode_payload::<
            BadgeTransferMsg,
        >(data)?)),
        MessageType::ApplySheriff => Ok(ClientMessage::ApplySheriff(decode_payload::<
            ApplySheriffMsg,
        >(data)?)),
        MessageType::VoteSheriff => Ok(ClientMessage::VoteSheriff(decode_payload::<
            VoteSheriffMsg,
        >(data)?)),
        MessageType::SelfDestruct => Ok(ClientMessage::SelfDestruct(decode_payload::<
            SelfDestructMsg,
        >(data)?)),
        MessageType::Chat => Ok(ClientMessage::Chat(decode_payload::<ChatMsg>(data)?)),
        MessageType::HostPause => Ok(ClientMessage::HostPause(decode_payload::<HostPauseMsg>(
            data,
        )?)),
        MessageType::HostResume => Ok(ClientMessage::HostResume(decode_payload::<HostResumeMsg>(
            data,
        )?)),
        MessageType::HostForceSkip => Ok(ClientMessage::HostForceSkip(decode_payload::<
            HostForceSkipMsg,
        >(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinResponse => Ok(ServerMessage::JoinResponse(decode_payload::<
            JoinResponseMsg,
        >(data)?)),
        MessageType::RoomState => Ok(ServerMessage::RoomState(Box::new(decode_payload::<
            RoomStateMsg,
        >(data)?))),
        MessageType::ChatBroadcast => Ok(ServerMessage::Chat(decode_payload::<ChatBroadcastMsg>(
            data,
        )?)),
        MessageType::ErrorReply => Ok(ServerMessage::Error(decode_payload::<ErrorReplyMsg>(
            data,
        )?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}
