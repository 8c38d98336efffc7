//! InMemory Room Directory 実装
//!
//! ドメイン層が定義する RoomDirectory trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ルームのメタデータはプロセスの再起動で失われます。永続化が必要になったら
//! 同じ trait を実装する DB 版を追加します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DirectoryError, RoomDirectory, RoomId, RoomRecord};

/// インメモリ Room Directory 実装
#[derive(Default)]
pub struct InMemoryRoomDirectory {
    /// Key: ルーム ID, Value: ルームのメタデータ
    rooms: Mutex<HashMap<RoomId, RoomRecord>>,
}

impl InMemoryRoomDirectory {
    /// 空の InMemoryRoomDirectory を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定したルームを登録済みの状態で作成
    ///
    /// 同じ ID のルームが複数ある場合は後のものが優先されます。
    pub fn with_rooms(records: impl IntoIterator<Item = RoomRecord>) -> Self {
        let rooms = records
            .into_iter()
            .map(|record| (record.room_id.clone(), record))
            .collect();
        Self {
            rooms: Mutex::new(rooms),
        }
    }

    /// 登録されているルーム数を取得
    pub async fn count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn find_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, DirectoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn save_room(&self, record: RoomRecord) -> Result<(), DirectoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&record.room_id) {
            return Err(DirectoryError::Conflict(record.room_id.into_string()));
        }
        tracing::debug!("Room '{}' saved to directory", record.room_id);
        rooms.insert(record.room_id.clone(), record);
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, DirectoryError> {
        let removed = self.rooms.lock().await.remove(room_id);
        if removed.is_some() {
            tracing::debug!("Room '{}' deleted from directory", room_id);
        }
        Ok(removed)
    }
}
