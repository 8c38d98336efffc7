//! UseCase layer: the room coordination core and the use cases behind the
//! HTTP surface.

pub mod broadcaster;
pub mod connection_handler;
pub mod create_room;
pub mod delete_room;
pub mod error;
pub mod get_active_sessions;
pub mod get_room_detail;
pub mod room_registry;
pub mod session_timer;

pub use broadcaster::EventBroadcaster;
pub use connection_handler::{
    ConnectionEvents, ConnectionHandler, ConnectionState, JoinRequest, MessageRequest,
};
pub use create_room::{CreateRoomUseCase, NewRoom};
pub use delete_room::DeleteRoomUseCase;
pub use error::{
    CloseError, CreateRoomError, DeleteRoomError, GetRoomDetailError, HandlerError, JoinError,
    RejectReason,
};
pub use get_active_sessions::GetActiveSessionsUseCase;
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use room_registry::{RoomRegistry, SessionSummary};
pub use session_timer::DEFAULT_TICK_INTERVAL;
