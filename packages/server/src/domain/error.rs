//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 空文字（空白のみを含む）
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// 最大長を超えている
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    /// 範囲外の数値
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

/// Room Directory（外部のルームメタデータストア）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// ストアに到達できない
    #[error("Room directory unavailable: {0}")]
    Unavailable(String),

    /// 同じ ID のルームが既に存在する
    #[error("Room '{0}' already exists")]
    Conflict(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先のクライアントが登録されていない
    #[error("Client '{0}' is not registered")]
    ClientNotFound(String),

    /// チャンネルへの送信に失敗した（受信側が既に閉じている）
    #[error("Failed to push message: {0}")]
    PushFailed(String),

    /// イベントのシリアライズに失敗した
    #[error("Failed to encode event: {0}")]
    Encode(String),
}
