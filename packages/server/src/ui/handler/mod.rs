//! Endpoint handlers.

mod http;
mod websocket;

pub use http::{create_room, delete_room, get_active_sessions, get_room_detail, health_check};
pub use websocket::websocket_handler;
