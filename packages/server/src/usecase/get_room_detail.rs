//! UseCase: ルーム詳細の取得
//!
//! Room Directory のメタデータに、稼働中のセッションの参加者数を加えて返します。

use std::sync::Arc;

use crate::domain::{RoomDirectory, RoomId, RoomRecord};

use super::{error::GetRoomDetailError, room_registry::RoomRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room: RoomRecord,
    pub participant_count: usize,
}

pub struct GetRoomDetailUseCase {
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>, registry: Arc<RoomRegistry>) -> Self {
        Self {
            directory,
            registry,
        }
    }

    pub async fn execute(&self, room_id: &RoomId) -> Result<RoomDetail, GetRoomDetailError> {
        let room = self
            .directory
            .find_room(room_id)
            .await?
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        if room.is_expired_at(self.registry.now()) {
            return Err(GetRoomDetailError::RoomExpired);
        }

        let participant_count = self.registry.participant_count(room_id).await;
        Ok(RoomDetail {
            room,
            participant_count,
        })
    }
}
