//! Domain layer: value objects, entities, events and the interfaces the
//! core needs from the outside world.

pub mod directory;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod value_object;

pub use directory::RoomDirectory;
#[cfg(test)]
pub use directory::MockRoomDirectory;
pub use entity::{
    ChatMessage, DEFAULT_DURATION_MINUTES, DEFAULT_MAX_PARTICIPANTS, Participant, ParticipantRole,
    RoomRecord,
};
pub use error::{DirectoryError, MessagePushError, ValueObjectError};
pub use event::RoomEvent;
pub use factory::{ConnectionIdFactory, RoomIdFactory, UserIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use value_object::{ConnectionId, DisplayName, RoomId, Timestamp, UserId};
