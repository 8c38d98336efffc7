//! ID の生成

use uuid::Uuid;

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, RoomId, UserId},
};

/// ルーム ID の接頭辞
pub const ROOM_ID_PREFIX: &str = "HANGOUT-";

/// ルーム ID の接頭辞に続くランダム部分の長さ
pub const ROOM_ID_RANDOM_LEN: usize = 6;

/// ルーム ID を生成する（例: `HANGOUT-3f9a0c`）
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        let random = Uuid::new_v4().simple().to_string();
        let suffix: String = random.chars().take(ROOM_ID_RANDOM_LEN).collect();
        RoomId::new(format!("{}{}", ROOM_ID_PREFIX, suffix))
    }
}

/// 接続 ID を生成する（UUID v4）
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> Result<ConnectionId, ValueObjectError> {
        ConnectionId::new(Uuid::new_v4().to_string())
    }
}

/// ゲストのユーザー ID を発行する
pub struct UserIdFactory;

impl UserIdFactory {
    pub fn guest() -> Result<UserId, ValueObjectError> {
        UserId::new(format!("guest-{}", Uuid::new_v4()))
    }
}
