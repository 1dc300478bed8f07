use serde::{Deserialize, Serialize};

use crate::action::NightActionKind;
use crate::ids::{PlayerId, RoomId};
use crate::phase::Phase;
use crate::view::RoomView;

/// Network message type discriminator (the 1-byte wire prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> server
    CreateRoom = 0x01,
    JoinRoom = 0x02,
    LeaveRoom = 0x03,
    StartGame = 0x04,
    NightAction = 0x05,
    Vote = 0x06,
    HunterShoot = 0x07,
    BadgeTransfer = 0x08,
    ApplySheriff = 0x09,
    VoteSheriff = 0x0A,
    SelfDestruct = 0x0B,
    Chat = 0x0C,
    HostPause = 0x0D,
    HostResume = 0x0E,
    HostForceSkip = 0x0F,

    // Server -> client
    JoinResponse = 0x20,
    RoomState = 0x21,
    ChatBroadcast = 0x22,
    ErrorReply = 0x23,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::CreateRoom),
            0x02 => Some(Self::JoinRoom),
            0x03 => Some(Self::LeaveRoom),
            0x04 => Some(Self::StartGame),
            0x05 => Some(Self::NightAction),
            0x06 => Some(Self::Vote),
            0x07 => Some(Self::HunterShoot),
            0x08 => Some(Self::BadgeTransfer),
            0x09 => Some(Self::ApplySheriff),
            0x0A => Some(Self::VoteSheriff),
            0x0B => Some(Self::SelfDestruct),
            0x0C => Some(Self::Chat),
            0x0D => Some(Self::HostPause),
            0x0E => Some(Self::HostResume),
            0x0F => Some(Self::HostForceSkip),
            0x20 => Some(Self::JoinResponse),
            0x21 => Some(Self::RoomState),
            0x22 => Some(Self::ChatBroadcast),
            0x23 => Some(Self::ErrorReply),
            _ => None,
        }
    }
}

/// Open a brand-new room and seat the caller as host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomMsg {
    pub room_name: String,
    pub player_name: String,
    pub protocol_version: u8,
}

/// Join an existing room. A `resume_token` (issued at a previous join)
/// triggers idempotent reconnection instead of a fresh seat. `is_ai` asks
/// the server to seat an AI agent; only the room host may do so, from its
/// already-bound connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomMsg {
    pub room_id: RoomId,
    pub player_name: String,
    pub is_ai: bool,
    pub resume_token: Option<String>,
    pub protocol_version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaveRoomMsg {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartGameMsg {}

/// Identity is taken from the transport connection, never from the payload:
/// action messages deliberately carry no player id at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightActionMsg {
    pub kind: NightActionKind,
    pub target: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteMsg {
    /// `None` abstains.
    pub target: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HunterShootMsg {
    pub target: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgeTransferMsg {
    /// `None` relinquishes the badge.
    pub target: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplySheriffMsg {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteSheriffMsg {
    pub target: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelfDestructMsg {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMsg {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostPauseMsg {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostResumeMsg {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostForceSkipMsg {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinResponseMsg {
    pub success: bool,
    pub room_id: Option<RoomId>,
    pub player_id: Option<PlayerId>,
    /// Signed credential for reconnection. Absent for AI seats and failures.
    pub resume_token: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStateMsg {
    pub view: RoomView,
}

/// Chat delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    All,
    Werewolves,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBroadcastMsg {
    pub sender: PlayerId,
    pub sender_name: String,
    pub content: String,
    pub channel: ChatChannel,
    pub phase: Phase,
    pub timestamp: String,
}

/// Machine-checkable error code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReplyMsg {
    pub code: String,
    pub message: String,
}

/// All client → server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    CreateRoom(CreateRoomMsg),
    JoinRoom(JoinRoomMsg),
    LeaveRoom(LeaveRoomMsg),
    StartGame(StartGameMsg),
    NightAction(NightActionMsg),
    Vote(VoteMsg),
    HunterShoot(HunterShootMsg),
    BadgeTransfer(BadgeTransferMsg),
    ApplySheriff(ApplySheriffMsg),
    VoteSheriff(VoteSheriffMsg),
    SelfDestruct(SelfDestructMsg),
    Chat(ChatMsg),
    HostPause(HostPauseMsg),
    HostResume(HostResumeMsg),
    HostForceSkip(HostForceSkipMsg),
}

impl ClientMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::CreateRoom(_) => MessageType::CreateRoom,
            Self::JoinRoom(_) => MessageType::JoinRoom,
            Self::LeaveRoom(_) => MessageType::LeaveRoom,
            Self::StartGame(_) => MessageType::StartGame,
            Self::NightAction(_) => MessageType::NightAction,
            Self::Vote(_) => MessageType::Vote,
            Self::HunterShoot(_) => MessageType::HunterShoot,
            Self::BadgeTransfer(_) => MessageType::BadgeTransfer,
            Self::ApplySheriff(_) => MessageType::ApplySheriff,
            Self::VoteSheriff(_) => MessageType::VoteSheriff,
            Self::SelfDestruct(_) => MessageType::SelfDestruct,
            Self::Chat(_) => MessageType::Chat,
            Self::HostPause(_) => MessageType::HostPause,
            Self::HostResume(_) => MessageType::HostResume,
            Self::HostForceSkip(_) => MessageType::HostForceSkip,
        }
    }
}

/// All server → client messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    JoinResponse(JoinResponseMsg),
    RoomState(Box<RoomStateMsg>),
    Chat(ChatBroadcastMsg),
    Error(ErrorReplyMsg),
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::JoinResponse(_) => MessageType::JoinResponse,
            Self::RoomState(_) => MessageType::RoomState,
            Self::Chat(_) => MessageType::ChatBroadcast,
            Self::Error(_) => MessageType::ErrorReply,
        }
    }
}
