//! Domain entities.

use serde::{Deserialize, Serialize};

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, DisplayName, RoomId, Timestamp, UserId},
};

/// Session length used when a room is created without one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Capacity used when a room is created without one.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 5;

/// Room metadata as recorded in the Room Directory.
///
/// The core only reads these records; the expiry timestamp is fixed when the
/// room is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: RoomId,
    pub room_name: String,
    pub description: String,
    pub host_id: UserId,
    pub max_participants: usize,
    pub expires_at: Timestamp,
    pub allow_uploads: bool,
}

impl RoomRecord {
    /// A room is expired once its expiry timestamp is at or before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry, clamped to zero.
    pub fn remaining_millis(&self, now: Timestamp) -> i64 {
        (self.expires_at.value() - now.value()).max(0)
    }

    /// Role a user gets when joining this room.
    pub fn role_for(&self, user_id: &UserId) -> ParticipantRole {
        if &self.host_id == user_id {
            ParticipantRole::Host
        } else {
            ParticipantRole::Participant
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantRole {
    Host,
    Participant,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "Host",
            ParticipantRole::Participant => "Participant",
        }
    }
}

/// A live connection joined to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub display_name: DisplayName,
    /// Resolved against the room's host id when the participant is added.
    pub role: ParticipantRole,
    pub joined_at: Timestamp,
}

impl Participant {
    /// Create a participant; the role is resolved by the registry at join time.
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            display_name,
            role: ParticipantRole::Participant,
            joined_at,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == ParticipantRole::Host
    }
}

/// Ephemeral chat message. Never stored, only broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender_name: DisplayName,
    pub body: String,
    pub image_url: Option<String>,
    pub timestamp: String,
}

impl ChatMessage {
    /// The body may be empty only when an image is attached.
    pub fn new(
        room_id: RoomId,
        sender_name: DisplayName,
        body: String,
        image_url: Option<String>,
        timestamp: String,
    ) -> Result<Self, ValueObjectError> {
        let image_url = image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let body = body.trim().to_string();
        if body.is_empty() && image_url.is_none() {
            return Err(ValueObjectError::Empty("message"));
        }
        Ok(Self {
            room_id,
            sender_name,
            body,
            image_url,
            timestamp,
        })
    }

    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}
