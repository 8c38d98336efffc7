//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{DirectoryError, RoomId},
    infrastructure::dto::http::{
        ActiveSessionDto, CreateRoomRequest, CreateRoomResponse, DeleteRoomRequest,
        DeleteRoomResponse, ErrorResponse, RoomDetailDto,
    },
    ui::state::AppState,
    usecase::{CreateRoomError, DeleteRoomError, GetRoomDetailError, NewRoom},
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a room in the directory
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    // DTO から UseCase の入力への変換
    let input = NewRoom {
        room_id: request.room_id,
        room_name: request.room_name,
        description: request.description,
        host_id: request.host_id,
        allow_uploads: request.allow_images,
        duration_minutes: request.duration_minutes,
        max_participants: request.max_participants,
    };

    match state.create_room_usecase.execute(input).await {
        Ok(record) => Ok((
            StatusCode::CREATED,
            Json(CreateRoomResponse {
                room_id: record.room_id.into_string(),
                room_name: record.room_name,
                expiry_time: record.expires_at.value(),
            }),
        )),
        Err(e @ (CreateRoomError::MissingField(_) | CreateRoomError::InvalidInput(_))) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(CreateRoomError::Directory(DirectoryError::Conflict(id))) => Err(api_error(
            StatusCode::CONFLICT,
            format!("Room '{}' already exists", id),
        )),
        Err(CreateRoomError::Directory(e)) => {
            tracing::error!("Failed to create room: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create room",
            ))
        }
    }
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let Ok(room_id) = RoomId::new(room_id) else {
        return Err(api_error(StatusCode::NOT_FOUND, "Room not found"));
    };

    match state.get_room_detail_usecase.execute(&room_id).await {
        Ok(detail) => {
            // Domain Model から DTO への変換
            let room = detail.room;
            Ok(Json(RoomDetailDto {
                id: room.room_id.into_string(),
                name: room.room_name,
                description: room.description,
                host_id: room.host_id.into_string(),
                expire_time: room.expires_at.value(),
                max_participants: room.max_participants,
                allow_images: room.allow_uploads,
                participant_count: detail.participant_count,
            }))
        }
        Err(e @ GetRoomDetailError::RoomNotFound) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e @ GetRoomDetailError::RoomExpired) => Err(api_error(StatusCode::GONE, e.to_string())),
        Err(GetRoomDetailError::Directory(e)) => {
            tracing::error!("Failed to look up room '{}': {}", room_id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to look up room",
            ))
        }
    }
}

/// Delete a room and end its live session (host only)
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<DeleteRoomRequest>,
) -> Result<Json<DeleteRoomResponse>, ApiError> {
    let Ok(room_id) = RoomId::new(room_id) else {
        return Err(api_error(StatusCode::NOT_FOUND, "Room not found"));
    };

    match state
        .delete_room_usecase
        .execute(&room_id, &request.host_id)
        .await
    {
        Ok(room) => Ok(Json(DeleteRoomResponse {
            message: format!("Session {} has been ended", room.room_name),
            room_id: room.room_id.into_string(),
        })),
        Err(e @ (DeleteRoomError::MissingHostId | DeleteRoomError::InvalidInput(_))) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ DeleteRoomError::RoomNotFound) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e @ DeleteRoomError::NotHost) => Err(api_error(StatusCode::FORBIDDEN, e.to_string())),
        Err(DeleteRoomError::Directory(e)) => {
            tracing::error!("Failed to delete room '{}': {}", room_id, e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete room",
            ))
        }
    }
}

/// List live sessions
pub async fn get_active_sessions(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ActiveSessionDto>> {
    let sessions = state
        .get_active_sessions_usecase
        .execute()
        .await
        .into_iter()
        .map(|summary| ActiveSessionDto {
            room_id: summary.room_id.into_string(),
            participant_count: summary.participant_count,
            host_connected: summary.host_connected,
            timer_running: summary.timer_running,
        })
        .collect();
    Json(sessions)
}
