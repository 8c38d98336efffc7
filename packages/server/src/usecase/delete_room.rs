//! UseCase: ルーム削除
//!
//! ホストだけが Room Directory からルームを削除できます。稼働中のセッションが
//! あれば、期限切れと同じくホスト接続の有無に関係なく終了させ、参加者全員に
//! `sessionEnded` を届けます。

use std::sync::Arc;

use crate::domain::{RoomDirectory, RoomEvent, RoomId, RoomRecord, UserId};

use super::{broadcaster::EventBroadcaster, error::DeleteRoomError, room_registry::RoomRegistry};

pub struct DeleteRoomUseCase {
    directory: Arc<dyn RoomDirectory>,
    registry: Arc<RoomRegistry>,
    broadcaster: EventBroadcaster,
}

impl DeleteRoomUseCase {
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        registry: Arc<RoomRegistry>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            directory,
            registry,
            broadcaster,
        }
    }

    /// 削除したルームのレコードを返す
    pub async fn execute(
        &self,
        room_id: &RoomId,
        host_id: &str,
    ) -> Result<RoomRecord, DeleteRoomError> {
        if host_id.trim().is_empty() {
            return Err(DeleteRoomError::MissingHostId);
        }
        let host_id = UserId::new(host_id.trim().to_string())?;

        let room = self
            .directory
            .find_room(room_id)
            .await?
            .ok_or(DeleteRoomError::RoomNotFound)?;
        if room.host_id != host_id {
            return Err(DeleteRoomError::NotHost);
        }

        // 検索と削除の間に別の要求で消えていれば 404
        let room = self
            .directory
            .delete_room(room_id)
            .await?
            .ok_or(DeleteRoomError::RoomNotFound)?;
        tracing::info!("Room '{}' deleted by host '{}'", room_id, host_id);

        if let Some(members) = self.registry.end_session(room_id).await {
            self.broadcaster
                .to_connections(members, &RoomEvent::SessionEnded)
                .await;
        }
        Ok(room)
    }
}
