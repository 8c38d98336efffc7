//! Conversion logic between domain types and DTOs.

use crate::domain::{Participant, RoomEvent};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain → DTO
// ========================================

impl From<&Participant> for dto::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            id: model.user_id.as_str().to_string(),
            socket_id: model.connection_id.as_str().to_string(),
            name: model.display_name.as_str().to_string(),
            role: model.role.as_str().to_string(),
        }
    }
}

impl From<&RoomEvent> for dto::ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::RoomInfo {
                name,
                meeting_id,
                session_time,
                host_id,
                allow_uploads,
            } => Self::RoomInfo {
                name: name.clone(),
                meeting_id: meeting_id.as_str().to_string(),
                session_time: session_time.clone(),
                host_id: host_id.as_str().to_string(),
                allow_uploads: *allow_uploads,
            },
            RoomEvent::UpdateParticipants(participants) => Self::UpdateParticipants {
                participants: participants.iter().map(Into::into).collect(),
            },
            RoomEvent::UserJoined { text } => Self::UserJoined { text: text.clone() },
            RoomEvent::UserLeft { text } => Self::UserLeft { text: text.clone() },
            RoomEvent::ReceiveMessage(message) => Self::ReceiveMessage {
                user_name: message.sender_name.as_str().to_string(),
                message: message.body.clone(),
                image_url: message.image_url.clone(),
                timestamp: message.timestamp.clone(),
            },
            RoomEvent::SessionTimer { time } => Self::SessionTimer { time: time.clone() },
            RoomEvent::SessionEnded => Self::SessionEnded,
            RoomEvent::RoomFull { message } => Self::RoomFull {
                message: message.clone(),
            },
            RoomEvent::ErrorMessage { text } => Self::ErrorMessage { text: text.clone() },
        }
    }
}

/// Encode a domain event as a JSON text frame.
pub fn encode_event(event: &RoomEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::ServerMessage::from(event))
}
