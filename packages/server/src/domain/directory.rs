//! Room Directory trait 定義
//!
//! ルームのメタデータ（名前・ホスト・定員・有効期限）を保持する外部ストアへの
//! インターフェース。コアはルーム参加時に `find_room` で読むだけで、書き込みは
//! ルーム作成・削除のユースケースだけが行います。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{entity::RoomRecord, error::DirectoryError, value_object::RoomId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ルーム ID からメタデータを取得（存在しなければ `Ok(None)`）
    async fn find_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, DirectoryError>;

    /// ルームを登録
    async fn save_room(&self, record: RoomRecord) -> Result<(), DirectoryError>;

    /// ルームを削除し、削除したレコードを返す（存在しなければ `Ok(None)`）
    async fn delete_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, DirectoryError>;
}
