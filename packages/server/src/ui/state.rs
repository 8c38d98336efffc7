//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        CreateRoomUseCase, DeleteRoomUseCase, EventBroadcaster, GetActiveSessionsUseCase,
        GetRoomDetailUseCase, RoomRegistry,
    },
};

pub struct AppState {
    /// 接続ハンドラに渡すレジストリ
    pub registry: Arc<RoomRegistry>,
    pub broadcaster: EventBroadcaster,
    /// 接続ごとの送信チャンネルの登録先
    pub message_pusher: Arc<dyn MessagePusher>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub get_active_sessions_usecase: Arc<GetActiveSessionsUseCase>,
    pub delete_room_usecase: Arc<DeleteRoomUseCase>,
}
