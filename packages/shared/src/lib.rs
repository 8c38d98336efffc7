//! Utilities shared by the Hangout packages: logging setup and time handling.

pub mod logger;
pub mod time;
