//! UseCase 層のエラー型
//!
//! すべて回復可能なエラーで、原因となった接続にだけ通知されます。

use thiserror::Error;

use crate::domain::{DirectoryError, RoomEvent, RoomId, ValueObjectError};

/// ルーム参加の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Room '{0}' not found")]
    RoomNotFound(RoomId),

    #[error("Room '{0}' has expired")]
    RoomExpired(RoomId),

    #[error("Room '{room_id}' is full ({max_participants} participants)")]
    RoomFull {
        room_id: RoomId,
        max_participants: usize,
    },

    /// Room Directory に到達できないなどの内部障害
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// セッション終了の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("Only the host can close room '{0}'")]
    NotHost(RoomId),

    #[error("No live session for room '{0}'")]
    SessionNotFound(RoomId),
}

/// メッセージが拒否された理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("join a room before sending messages")]
    NotJoined,

    #[error("joined '{joined}', not '{requested}'")]
    RoomMismatch { joined: RoomId, requested: RoomId },

    #[error("room '{0}' has no live session")]
    NoLiveSession(RoomId),

    #[error("message is empty")]
    EmptyMessage,

    #[error("image uploads are disabled in this room")]
    UploadsNotAllowed,
}

/// 接続ハンドラが送信者に返すエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Join(#[from] JoinError),

    #[error(transparent)]
    Close(#[from] CloseError),

    #[error("Message rejected: {0}")]
    MessageRejected(RejectReason),

    #[error("Not joined to room '{0}'")]
    NotJoined(String),

    #[error("Connection has already left its room")]
    Terminated,

    #[error("Invalid request: {0}")]
    InvalidInput(#[from] ValueObjectError),

    #[error("Malformed event: {0}")]
    Malformed(String),
}

impl HandlerError {
    /// 送信者に届けるイベント
    ///
    /// 内部障害の詳細はクライアントに出さない。
    pub fn to_event(&self) -> RoomEvent {
        match self {
            HandlerError::Join(JoinError::RoomFull { .. }) => RoomEvent::RoomFull {
                message: "Room is full".to_string(),
            },
            HandlerError::Join(JoinError::Directory(_)) => {
                RoomEvent::error("Something went wrong, please try again")
            }
            other => RoomEvent::error(other.to_string()),
        }
    }

    /// サーバー内部の障害かどうか（ログレベルの判定に使う）
    pub fn is_internal(&self) -> bool {
        matches!(self, HandlerError::Join(JoinError::Directory(_)))
    }
}

/// ルーム作成の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// ルーム詳細取得の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room has expired")]
    RoomExpired,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// ルーム削除の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteRoomError {
    #[error("hostId is required")]
    MissingHostId,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Only the room host can close a session")]
    NotHost,

    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
