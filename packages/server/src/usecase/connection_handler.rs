//! Connection Handler
//!
//! WebSocket 接続 1 本ごとのプロトコル状態機械。受信イベントを Room Registry の
//! 操作に変換し、結果を Event Broadcaster 経由で配信します。
//!
//! ```text
//! Unjoined ──joinRoom──▶ Joined ──leaveRoom────▶ Left
//!                          │    ──closeSession──▶ Closed
//!                          └──── disconnect ────▶ Disconnected
//! ```
//!
//! 失敗はすべて送信者にだけ通知され、状態は変わりません。

use std::sync::Arc;

use async_trait::async_trait;
use hangout_shared::time::{format_hms, timestamp_to_rfc3339};
use tokio::task::JoinHandle;

use crate::domain::{
    ChatMessage, ConnectionId, DisplayName, Participant, RoomEvent, RoomId, UserId,
    UserIdFactory,
};

use super::{
    broadcaster::EventBroadcaster,
    error::{HandlerError, RejectReason},
    room_registry::RoomRegistry,
};

/// 参加中のルームと、参加時の身元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub display_name: DisplayName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unjoined,
    Joined(Membership),
    Left,
    Closed,
    Disconnected,
}

impl ConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionState::Left | ConnectionState::Closed | ConnectionState::Disconnected
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room_id: String,
    pub user_name: String,
    /// ゲストは None（接続ごとに ID を発行する）
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub room_id: String,
    pub message: String,
    pub image_url: Option<String>,
    pub timestamp: Option<String>,
}

/// トランスポートから届く接続イベント
#[async_trait]
pub trait ConnectionEvents: Send + Sync {
    async fn on_join(&mut self, request: JoinRequest) -> Result<(), HandlerError>;
    async fn on_message(&mut self, request: MessageRequest) -> Result<(), HandlerError>;
    async fn on_leave(&mut self, room_id: String) -> Result<(), HandlerError>;
    async fn on_close(&mut self, room_id: String) -> Result<(), HandlerError>;
    /// 切断時に 1 度だけ呼ばれる
    async fn on_disconnect(&mut self);
    /// 失敗を送信者に通知する
    async fn report(&self, error: &HandlerError);
}

pub struct ConnectionHandler {
    connection_id: ConnectionId,
    registry: Arc<RoomRegistry>,
    broadcaster: EventBroadcaster,
    state: ConnectionState,
    /// ユーザー ID なしで参加したときに使う ID（初回参加時に発行）
    guest_id: Option<UserId>,
    /// 完了を待っている退出処理
    departures: Vec<JoinHandle<()>>,
}

impl ConnectionHandler {
    pub fn new(
        connection_id: ConnectionId,
        registry: Arc<RoomRegistry>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            connection_id,
            registry,
            broadcaster,
            state: ConnectionState::Unjoined,
            guest_id: None,
            departures: Vec::new(),
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn ensure_active(&self) -> Result<(), HandlerError> {
        if self.state.is_terminal() {
            return Err(HandlerError::Terminated);
        }
        Ok(())
    }

    fn resolve_user_id(&mut self, requested: Option<String>) -> Result<UserId, HandlerError> {
        match requested.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(UserId::new(id)?),
            None => match &self.guest_id {
                Some(id) => Ok(id.clone()),
                None => {
                    let id = UserIdFactory::guest()?;
                    self.guest_id = Some(id.clone());
                    Ok(id)
                }
            },
        }
    }

    /// 現在のルームのメンバーシップを取り出す（ルーム ID が一致する場合のみ）
    fn membership_for(&self, room_id: &str) -> Result<Membership, HandlerError> {
        match &self.state {
            ConnectionState::Joined(membership) if membership.room_id.as_str() == room_id.trim() => {
                Ok(membership.clone())
            }
            _ => Err(HandlerError::NotJoined(room_id.to_string())),
        }
    }

    /// ルームから抜けて、残った参加者に通知する
    ///
    /// 削除と通知は別タスクで実行するので、呼び出し元の future が途中で破棄
    /// されても最後まで進む。待ち切れなかったタスクは次の `finish_departures` で待つ。
    async fn depart(&mut self, membership: Membership) {
        let registry = self.registry.clone();
        let broadcaster = self.broadcaster.clone();
        let connection_id = self.connection_id.clone();
        self.departures.push(tokio::spawn(async move {
            announce_departure(&registry, &broadcaster, &connection_id, &membership).await;
        }));
        self.finish_departures().await;
    }

    async fn finish_departures(&mut self) {
        while let Some(handle) = self.departures.last_mut() {
            if let Err(e) = handle.await {
                tracing::error!(
                    "Departure of connection '{}' did not complete: {}",
                    self.connection_id,
                    e
                );
            }
            self.departures.pop();
        }
    }
}

async fn announce_departure(
    registry: &RoomRegistry,
    broadcaster: &EventBroadcaster,
    connection_id: &ConnectionId,
    membership: &Membership,
) {
    let removed = registry
        .remove_participant(&membership.room_id, connection_id)
        .await;
    if removed.is_none() {
        // セッションは既に終了・期限切れで削除済み
        return;
    }

    let participants = registry.snapshot_participants(&membership.room_id).await;
    if !participants.is_empty() {
        broadcaster
            .to_room(
                registry,
                &membership.room_id,
                &RoomEvent::UpdateParticipants(participants),
            )
            .await;
    }
    broadcaster
        .to_room_except(
            registry,
            &membership.room_id,
            connection_id,
            &RoomEvent::user_left(&membership.display_name),
        )
        .await;
}

#[async_trait]
impl ConnectionEvents for ConnectionHandler {
    async fn on_join(&mut self, request: JoinRequest) -> Result<(), HandlerError> {
        self.ensure_active()?;
        let room_id = RoomId::new(request.room_id)?;
        let display_name = DisplayName::new(request.user_name)?;
        let user_id = self.resolve_user_id(request.user_id)?;

        let participant = Participant::new(
            self.connection_id.clone(),
            user_id.clone(),
            display_name.clone(),
            self.registry.now(),
        );
        let joined = self.registry.add_participant(&room_id, participant).await?;

        let previous = std::mem::replace(
            &mut self.state,
            ConnectionState::Joined(Membership {
                room_id: room_id.clone(),
                user_id,
                display_name: display_name.clone(),
            }),
        );
        if let ConnectionState::Joined(old) = previous
            && old.room_id != room_id
        {
            tracing::info!(
                "Connection '{}' switched from room '{}' to '{}'",
                self.connection_id,
                old.room_id,
                room_id
            );
            self.depart(old).await;
        }

        let room_info = RoomEvent::RoomInfo {
            name: joined.room.room_name.clone(),
            meeting_id: room_id.clone(),
            session_time: format_hms(joined.remaining_millis),
            host_id: joined.room.host_id.clone(),
            allow_uploads: joined.room.allow_uploads,
        };
        self.broadcaster
            .to_connection(&self.connection_id, &room_info)
            .await;

        let participants = self.registry.snapshot_participants(&room_id).await;
        self.broadcaster
            .to_room(
                &self.registry,
                &room_id,
                &RoomEvent::UpdateParticipants(participants),
            )
            .await;

        if !joined.rejoined {
            self.broadcaster
                .to_room_except(
                    &self.registry,
                    &room_id,
                    &self.connection_id,
                    &RoomEvent::user_joined(&display_name),
                )
                .await;
        }
        Ok(())
    }

    async fn on_message(&mut self, request: MessageRequest) -> Result<(), HandlerError> {
        self.ensure_active()?;
        let ConnectionState::Joined(membership) = &self.state else {
            return Err(HandlerError::MessageRejected(RejectReason::NotJoined));
        };
        let requested = RoomId::new(request.room_id)?;
        if requested != membership.room_id {
            return Err(HandlerError::MessageRejected(RejectReason::RoomMismatch {
                joined: membership.room_id.clone(),
                requested,
            }));
        }

        let room = self
            .registry
            .membership(&membership.room_id, &self.connection_id)
            .await
            .ok_or_else(|| {
                HandlerError::MessageRejected(RejectReason::NoLiveSession(
                    membership.room_id.clone(),
                ))
            })?;

        let timestamp = request
            .timestamp
            .filter(|timestamp| !timestamp.trim().is_empty())
            .unwrap_or_else(|| timestamp_to_rfc3339(self.registry.now().value()));
        let message = ChatMessage::new(
            membership.room_id.clone(),
            membership.display_name.clone(),
            request.message,
            request.image_url,
            timestamp,
        )
        .map_err(|_| HandlerError::MessageRejected(RejectReason::EmptyMessage))?;
        if message.has_image() && !room.allow_uploads {
            return Err(HandlerError::MessageRejected(
                RejectReason::UploadsNotAllowed,
            ));
        }

        self.broadcaster
            .to_room(
                &self.registry,
                &membership.room_id,
                &RoomEvent::ReceiveMessage(message),
            )
            .await;
        Ok(())
    }

    async fn on_leave(&mut self, room_id: String) -> Result<(), HandlerError> {
        self.ensure_active()?;
        let membership = self.membership_for(&room_id)?;
        self.state = ConnectionState::Left;
        self.depart(membership).await;
        Ok(())
    }

    async fn on_close(&mut self, room_id: String) -> Result<(), HandlerError> {
        self.ensure_active()?;
        let membership = self.membership_for(&room_id)?;
        let members = self
            .registry
            .close_session(&membership.room_id, &self.connection_id)
            .await?;
        self.state = ConnectionState::Closed;
        self.broadcaster
            .to_connections(members, &RoomEvent::SessionEnded)
            .await;
        Ok(())
    }

    async fn on_disconnect(&mut self) {
        self.finish_departures().await;
        let previous = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Joined(membership) = previous {
            tracing::info!(
                "Connection '{}' disconnected from room '{}'",
                self.connection_id,
                membership.room_id
            );
            self.depart(membership).await;
        }
    }

    async fn report(&self, error: &HandlerError) {
        if error.is_internal() {
            tracing::error!("Connection '{}': {}", self.connection_id, error);
        } else {
            tracing::info!("Connection '{}' rejected: {}", self.connection_id, error);
        }
        self.broadcaster
            .to_connection(&self.connection_id, &error.to_event())
            .await;
    }
}
