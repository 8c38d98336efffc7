//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by a camelCase `type` field, e.g.
//! `{"type":"joinRoom","roomId":"HANGOUT-ab12cd","userName":"alice","userId":"u1"}`.

use serde::{Deserialize, Serialize};

/// Events sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        user_name: String,
        /// Omitted by guests; the server mints one.
        #[serde(default)]
        user_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        room_id: String,
        #[serde(default)]
        user_name: Option<String>,
        #[serde(default)]
        message: String,
        #[serde(default)]
        image_url: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom {
        room_id: String,
        #[serde(default)]
        user_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CloseSession { room_id: String },
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    RoomInfo {
        name: String,
        meeting_id: String,
        session_time: String,
        host_id: String,
        allow_uploads: bool,
    },
    UpdateParticipants {
        participants: Vec<ParticipantInfo>,
    },
    UserJoined {
        text: String,
    },
    UserLeft {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ReceiveMessage {
        user_name: String,
        message: String,
        image_url: Option<String>,
        timestamp: String,
    },
    SessionTimer {
        time: String,
    },
    SessionEnded,
    RoomFull {
        message: String,
    },
    ErrorMessage {
        text: String,
    },
}

/// One entry of `updateParticipants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    /// User id
    pub id: String,
    /// Connection id
    pub socket_id: String,
    pub name: String,
    /// `"Host"` or `"Participant"`
    pub role: String,
}
