//! Hangout room-coordination server.
//!
//! Tracks which users occupy which ephemeral chatroom, enforces capacity and
//! host privileges, counts each room down to its expiry and broadcasts
//! membership, message and lifecycle events over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
