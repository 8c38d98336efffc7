//! WebSocket / HTTP server for the room coordination core.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
