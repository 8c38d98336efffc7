//! Event Broadcaster
//!
//! ルームに参加中の接続へイベントを配送する唯一の窓口。状態を持たず、
//! 宛先は配送時点の Room Registry のスナップショットから決めます。
//!
//! - room-wide: 送信者を含む全参加者
//! - room-except-sender: 送信者以外の参加者
//! - direct: 特定の接続のみ
//!
//! 配送はベストエフォートで、失敗はログに残すだけで再送しません。
//! 切断された接続の後始末は通常の切断処理が担当します。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomEvent, RoomId};

use super::room_registry::RoomRegistry;

#[derive(Clone)]
pub struct EventBroadcaster {
    message_pusher: Arc<dyn MessagePusher>,
}

impl EventBroadcaster {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// ルームの全参加者に配送
    pub async fn to_room(&self, registry: &RoomRegistry, room_id: &RoomId, event: &RoomEvent) {
        let targets = registry.connection_ids(room_id).await;
        self.to_connections(targets, event).await;
    }

    /// 送信者以外のルーム参加者に配送
    pub async fn to_room_except(
        &self,
        registry: &RoomRegistry,
        room_id: &RoomId,
        sender: &ConnectionId,
        event: &RoomEvent,
    ) {
        let targets = registry
            .connection_ids(room_id)
            .await
            .into_iter()
            .filter(|id| id != sender)
            .collect();
        self.to_connections(targets, event).await;
    }

    /// 特定の接続に配送
    pub async fn to_connection(&self, connection_id: &ConnectionId, event: &RoomEvent) {
        if let Err(e) = self.message_pusher.push_to(connection_id, event).await {
            tracing::warn!(
                "Failed to deliver '{}' to connection '{}': {}",
                event.kind(),
                connection_id,
                e
            );
        }
    }

    /// 宛先を指定して配送
    ///
    /// セッション削除後の `sessionEnded` のように、レジストリから既に消えた
    /// 参加者へ届ける場合に使う。
    pub async fn to_connections(&self, targets: Vec<ConnectionId>, event: &RoomEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, event).await {
            tracing::warn!("Failed to broadcast '{}': {}", event.kind(), e);
        }
    }
}
