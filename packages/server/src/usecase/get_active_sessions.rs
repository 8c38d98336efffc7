//! UseCase: 稼働中のセッション一覧の取得

use std::sync::Arc;

use super::room_registry::{RoomRegistry, SessionSummary};

pub struct GetActiveSessionsUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetActiveSessionsUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self) -> Vec<SessionSummary> {
        self.registry.active_sessions().await
    }
}
