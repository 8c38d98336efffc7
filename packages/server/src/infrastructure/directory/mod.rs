//! Room Directory の実装
//!
//! - `inmemory`: HashMap を使ったインメモリ実装
//! - 将来的に: MongoDB や PostgreSQL などの永続ストア

pub mod inmemory;

pub use inmemory::InMemoryRoomDirectory;
