//! UseCase: ルーム作成
//!
//! Room Directory にルームのメタデータを登録します。有効期限は作成時刻と
//! 利用時間から決まり、以後変わりません。

use std::sync::Arc;

use hangout_shared::time::Clock;

use crate::domain::{
    DEFAULT_DURATION_MINUTES, DEFAULT_MAX_PARTICIPANTS, DirectoryError, RoomDirectory, RoomId,
    RoomIdFactory, RoomRecord, Timestamp, UserId, ValueObjectError,
};

use super::error::CreateRoomError;

/// 生成した ID が衝突したときの再試行回数
const MAX_ID_ATTEMPTS: usize = 5;

/// ルーム作成の入力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRoom {
    /// 指定がなければ生成する
    pub room_id: Option<String>,
    pub room_name: String,
    pub description: String,
    pub host_id: String,
    pub allow_uploads: Option<bool>,
    pub duration_minutes: Option<u32>,
    pub max_participants: Option<usize>,
}

pub struct CreateRoomUseCase {
    directory: Arc<dyn RoomDirectory>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(directory: Arc<dyn RoomDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { directory, clock }
    }

    pub async fn execute(&self, input: NewRoom) -> Result<RoomRecord, CreateRoomError> {
        let room_name = required(input.room_name, "roomName")?;
        let description = required(input.description, "description")?;
        let host_id = UserId::new(required(input.host_id, "hostId")?)?;

        // 0 は未指定として扱う
        let duration_minutes = input
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let max_participants = input.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
        if max_participants == 0 {
            return Err(ValueObjectError::OutOfRange("maxParticipants").into());
        }

        let expires_at =
            Timestamp::new(self.clock.now_millis() + i64::from(duration_minutes) * 60 * 1000);
        let mut record = RoomRecord {
            room_id: RoomIdFactory::generate()?,
            room_name,
            description,
            host_id,
            max_participants,
            expires_at,
            allow_uploads: input.allow_uploads.unwrap_or(false),
        };

        if let Some(room_id) = input.room_id.filter(|id| !id.trim().is_empty()) {
            record.room_id = RoomId::new(room_id)?;
            self.directory.save_room(record.clone()).await?;
        } else {
            self.save_with_generated_id(&mut record).await?;
        }

        tracing::info!(
            "Room '{}' created by host '{}' (max {}, {} min)",
            record.room_id,
            record.host_id,
            record.max_participants,
            duration_minutes
        );
        Ok(record)
    }

    async fn save_with_generated_id(&self, record: &mut RoomRecord) -> Result<(), CreateRoomError> {
        let mut attempt = 1;
        loop {
            match self.directory.save_room(record.clone()).await {
                Err(DirectoryError::Conflict(id)) if attempt < MAX_ID_ATTEMPTS => {
                    tracing::warn!("Generated room id '{}' already taken, retrying", id);
                    record.room_id = RoomIdFactory::generate()?;
                    attempt += 1;
                }
                result => return result.map_err(CreateRoomError::from),
            }
        }
    }
}

fn required(value: String, field: &'static str) -> Result<String, CreateRoomError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CreateRoomError::MissingField(field));
    }
    Ok(trimmed.to_string())
}
