//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

/// `POST /api/rooms` request body; also the entry format of the `--rooms`
/// preload file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Generated when omitted.
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub allow_images: Option<bool>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub max_participants: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub room_name: String,
    /// Unix timestamp (milliseconds)
    pub expiry_time: i64,
}

/// `GET /api/rooms/{room_id}` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub name: String,
    pub description: String,
    pub host_id: String,
    /// Unix timestamp (milliseconds)
    pub expire_time: i64,
    pub max_participants: usize,
    pub allow_images: bool,
    /// Connections currently joined to the live session
    pub participant_count: usize,
}

/// One entry of `GET /api/rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionDto {
    pub room_id: String,
    pub participant_count: usize,
    pub host_connected: bool,
    pub timer_running: bool,
}

/// `DELETE /api/rooms/{room_id}` request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoomRequest {
    #[serde(default)]
    pub host_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoomResponse {
    pub room_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
