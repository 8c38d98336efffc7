//! 値オブジェクト
//!
//! 不変条件（空文字不可、長さ制限など）をコンストラクタで検証し、
//! 検証済みの値だけがドメイン層を流れるようにします。

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// 表示名の最大文字数
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;

/// ID 系の値オブジェクトの最大文字数
pub const ID_MAX_CHARS: usize = 128;

/// 文字列ベースの ID 値オブジェクトを定義する
///
/// 前後の空白を取り除き、空文字と長すぎる値を拒否する。
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// 値を検証して生成
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                if trimmed.chars().count() > ID_MAX_CHARS {
                    return Err(ValueObjectError::TooLong($label, ID_MAX_CHARS));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// ルーム ID（Room Directory と Room Registry 共通のキー）
    RoomId,
    "room_id"
);

string_id!(
    /// 接続 ID（接続ごとに一意、接続中は再利用されない）
    ConnectionId,
    "connection_id"
);

string_id!(
    /// ユーザー ID（ホスト判定にのみ使用）
    UserId,
    "user_id"
);

/// 表示名（ルーム内で一意である必要はない）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("user_name"));
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX_CHARS {
            return Err(ValueObjectError::TooLong(
                "user_name",
                DISPLAY_NAME_MAX_CHARS,
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
