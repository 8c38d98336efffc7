//! Outbound room events.
//!
//! The wire shape of each event lives in the DTO layer; this enum is what the
//! core produces and the broadcaster fans out.

use super::{
    entity::{ChatMessage, Participant},
    value_object::{DisplayName, RoomId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Sent to a connection right after it joins.
    RoomInfo {
        name: String,
        meeting_id: RoomId,
        session_time: String,
        host_id: UserId,
        allow_uploads: bool,
    },
    UpdateParticipants(Vec<Participant>),
    UserJoined { text: String },
    UserLeft { text: String },
    ReceiveMessage(ChatMessage),
    /// Remaining session time, `HH:MM:SS`.
    SessionTimer { time: String },
    SessionEnded,
    RoomFull { message: String },
    ErrorMessage { text: String },
}

impl RoomEvent {
    pub fn user_joined(name: &DisplayName) -> Self {
        RoomEvent::UserJoined {
            text: format!("{} joined the chat", name),
        }
    }

    pub fn user_left(name: &DisplayName) -> Self {
        RoomEvent::UserLeft {
            text: format!("{} left the chat", name),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        RoomEvent::ErrorMessage { text: text.into() }
    }

    /// Event name as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::RoomInfo { .. } => "roomInfo",
            RoomEvent::UpdateParticipants(_) => "updateParticipants",
            RoomEvent::UserJoined { .. } => "userJoined",
            RoomEvent::UserLeft { .. } => "userLeft",
            RoomEvent::ReceiveMessage(_) => "receiveMessage",
            RoomEvent::SessionTimer { .. } => "sessionTimer",
            RoomEvent::SessionEnded => "sessionEnded",
            RoomEvent::RoomFull { .. } => "roomFull",
            RoomEvent::ErrorMessage { .. } => "errorMessage",
        }
    }
}
