//! Room Registry
//!
//! ルーム ID から「今そのルームにいる接続」への対応を保持するインメモリのレジストリ。
//! 誰がどのルームにいるかの唯一の情報源です。
//!
//! ## 不変条件
//!
//! - セッションが存在する ⇔ 参加者が 1 人以上いて、終了・期限切れになっていない
//! - 参加者数を 0 にした操作、終了・期限切れを処理した操作の中でセッションを削除し、
//!   同時にタイマーを止める
//! - 1 セッションにつきタイマーは高々 1 つ
//!
//! ## 排他制御
//!
//! Room Directory の参照（唯一の待機点）はロックの外で行い、定員チェックと
//! 参加者の追加は 1 つのクリティカルセクション内で `.await` を挟まずに行います。
//! 同じルームへの同時参加が両方とも定員チェックを通過することはありません。
//!
//! レジストリ自体がセッションの消滅を決める「生存キャッシュ」であり、ルームの存在は
//! Room Directory が管理します。空になって削除されたセッションは、次の参加で
//! Directory のデータから作り直されます。

use std::{
    collections::HashMap,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use hangout_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, Participant, RoomDirectory, RoomId, RoomRecord, Timestamp};

use super::{
    broadcaster::EventBroadcaster,
    error::{CloseError, JoinError},
    session_timer::{DEFAULT_TICK_INTERVAL, SessionTimer},
};

/// 稼働中のルームのセッション状態
pub(crate) struct RoomSession {
    /// セッション作成時の Directory のレコード
    room: RoomRecord,
    /// Key: 接続 ID
    participants: HashMap<ConnectionId, Participant>,
    /// ホストのユーザー ID で参加している接続（いなければ None）
    host_connection_id: Option<ConnectionId>,
    timer: Option<SessionTimer>,
    generation: u64,
}

impl RoomSession {
    fn new(room: RoomRecord, generation: u64) -> Self {
        Self {
            room,
            participants: HashMap::new(),
            host_connection_id: None,
            timer: None,
            generation,
        }
    }

    /// 参加順（同時刻なら接続 ID 順）の参加者リスト
    fn snapshot(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self.participants.values().cloned().collect();
        participants.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        participants
    }

    fn connection_ids(&self) -> Vec<ConnectionId> {
        self.snapshot()
            .into_iter()
            .map(|participant| participant.connection_id)
            .collect()
    }

    /// セッションを破棄し、タイマーを止める
    fn shut_down(mut self) -> Vec<ConnectionId> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.connection_ids()
    }
}

/// 参加に成功したときの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    /// 参加時点の Directory のレコード
    pub room: RoomRecord,
    /// 登録された参加者（役割は解決済み）
    pub participant: Participant,
    pub participants: Vec<Participant>,
    pub remaining_millis: i64,
    /// 同じ接続による同じルームへの再参加だったか
    pub rejoined: bool,
}

/// `GET /api/rooms` 用のセッション概要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub room_id: RoomId,
    pub participant_count: usize,
    pub host_connected: bool,
    pub timer_running: bool,
}

/// タイマーの 1 tick の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// 残り時間と配信先
    Running {
        remaining_millis: i64,
        recipients: Vec<ConnectionId>,
    },
    /// 期限切れでセッションを削除した。中身は削除前の参加者
    Expired(Vec<ConnectionId>),
    /// セッションが既に存在しない
    Gone,
}

pub struct RoomRegistry {
    sessions: Mutex<HashMap<RoomId, RoomSession>>,
    directory: Arc<dyn RoomDirectory>,
    clock: Arc<dyn Clock>,
    /// タイマーに渡す配送窓口
    broadcaster: EventBroadcaster,
    tick_interval: Duration,
    next_generation: AtomicU64,
    me: Weak<RoomRegistry>,
}

impl RoomRegistry {
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        clock: Arc<dyn Clock>,
        broadcaster: EventBroadcaster,
    ) -> Arc<Self> {
        Self::with_tick_interval(directory, clock, broadcaster, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_tick_interval(
        directory: Arc<dyn RoomDirectory>,
        clock: Arc<dyn Clock>,
        broadcaster: EventBroadcaster,
        tick_interval: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            sessions: Mutex::new(HashMap::new()),
            directory,
            clock,
            broadcaster,
            tick_interval,
            next_generation: AtomicU64::new(0),
            me: me.clone(),
        })
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 既存のセッションを返す。なければ空のセッションを作る
    ///
    /// 呼び出し元は定員・期限のチェックを済ませた後、同じクリティカルセクション内で
    /// 参加者を追加すること。空のセッションが外から見えることはない。
    fn ensure_session<'a>(
        &self,
        sessions: &'a mut HashMap<RoomId, RoomSession>,
        room_id: &RoomId,
        room: &RoomRecord,
    ) -> &'a mut RoomSession {
        sessions.entry(room_id.clone()).or_insert_with(|| {
            let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
            tracing::info!("Session for room '{}' started", room_id);
            RoomSession::new(room.clone(), generation)
        })
    }

    /// 参加者を追加
    ///
    /// 同じ接続が同じルームに再参加した場合は既存のエントリを再利用し、
    /// 定員チェックをせずに役割だけを解決し直す。
    pub async fn add_participant(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<JoinedSession, JoinError> {
        let room = self
            .directory
            .find_room(room_id)
            .await?
            .ok_or_else(|| JoinError::RoomNotFound(room_id.clone()))?;

        let now = self.now();
        if room.is_expired_at(now) {
            return Err(JoinError::RoomExpired(room_id.clone()));
        }

        let mut sessions = self.sessions.lock().await;

        let existing = sessions
            .get(room_id)
            .and_then(|session| session.participants.get(&participant.connection_id))
            .cloned();
        let current_count = sessions
            .get(room_id)
            .map_or(0, |session| session.participants.len());
        if existing.is_none() && current_count >= room.max_participants {
            return Err(JoinError::RoomFull {
                room_id: room_id.clone(),
                max_participants: room.max_participants,
            });
        }

        let session = self.ensure_session(&mut sessions, room_id, &room);

        let mut participant = participant;
        participant.role = room.role_for(&participant.user_id);
        if let Some(previous) = &existing {
            participant.joined_at = previous.joined_at;
        }
        let connection_id = participant.connection_id.clone();

        if participant.is_host() {
            session.host_connection_id = Some(connection_id.clone());
        } else if session.host_connection_id.as_ref() == Some(&connection_id) {
            session.host_connection_id = None;
        }
        session
            .participants
            .insert(connection_id.clone(), participant.clone());

        if session.timer.is_none() {
            session.timer = Some(SessionTimer::start(
                self.me.clone(),
                self.broadcaster.clone(),
                room_id.clone(),
                session.generation,
                self.tick_interval,
            ));
        }

        tracing::info!(
            "Connection '{}' joined room '{}' as {} ({}/{})",
            connection_id,
            room_id,
            participant.role.as_str(),
            session.participants.len(),
            room.max_participants
        );

        Ok(JoinedSession {
            remaining_millis: room.remaining_millis(now),
            participants: session.snapshot(),
            participant,
            room,
            rejoined: existing.is_some(),
        })
    }

    /// 参加者を削除
    ///
    /// 参加者数が 0 になったらセッションを削除し、タイマーを止める。
    pub async fn remove_participant(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Participant> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(room_id)?;
        let removed = session.participants.remove(connection_id)?;
        if session.host_connection_id.as_ref() == Some(connection_id) {
            session.host_connection_id = None;
        }

        if session.participants.is_empty() {
            if let Some(session) = sessions.remove(room_id) {
                session.shut_down();
            }
            tracing::info!("Session for room '{}' ended: no participants left", room_id);
        }

        tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        Some(removed)
    }

    /// ホストによるセッション終了
    ///
    /// 成功時は削除前の参加者の接続 ID を返す（`sessionEnded` の配信先）。
    pub async fn close_session(
        &self,
        room_id: &RoomId,
        requester: &ConnectionId,
    ) -> Result<Vec<ConnectionId>, CloseError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get(room_id)
            .ok_or_else(|| CloseError::SessionNotFound(room_id.clone()))?;
        if session.host_connection_id.as_ref() != Some(requester) {
            return Err(CloseError::NotHost(room_id.clone()));
        }

        let Some(session) = sessions.remove(room_id) else {
            return Err(CloseError::SessionNotFound(room_id.clone()));
        };
        tracing::info!("Session for room '{}' closed by host", room_id);
        Ok(session.shut_down())
    }

    /// ホスト判定なしでセッションを終了する（ルーム削除時）
    ///
    /// セッションがなければ None。あれば削除前の参加者の接続 ID を返す。
    pub async fn end_session(&self, room_id: &RoomId) -> Option<Vec<ConnectionId>> {
        let session = self.sessions.lock().await.remove(room_id)?;
        tracing::info!("Session for room '{}' ended", room_id);
        Some(session.shut_down())
    }

    /// タイマーから 1 秒ごとに呼ばれる
    ///
    /// 残り時間が 0 以下ならセッションを削除する（ホスト判定なしの強制終了）。
    pub(crate) async fn tick(&self, room_id: &RoomId, generation: u64) -> Tick {
        let mut sessions = self.sessions.lock().await;
        let remaining_millis = match sessions.get(room_id) {
            Some(session) if session.generation == generation => {
                session.room.remaining_millis(self.now())
            }
            _ => return Tick::Gone,
        };

        if remaining_millis > 0 {
            let recipients = sessions
                .get(room_id)
                .map(RoomSession::connection_ids)
                .unwrap_or_default();
            return Tick::Running {
                remaining_millis,
                recipients,
            };
        }

        match sessions.remove(room_id) {
            Some(mut session) => {
                // 自分自身のタスクなので abort しない
                if let Some(timer) = session.timer.take() {
                    timer.detach();
                }
                Tick::Expired(session.connection_ids())
            }
            None => Tick::Gone,
        }
    }

    /// 参加者リスト（参加順）
    pub async fn snapshot_participants(&self, room_id: &RoomId) -> Vec<Participant> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(room_id)
            .map(RoomSession::snapshot)
            .unwrap_or_default()
    }

    pub async fn participant_count(&self, room_id: &RoomId) -> usize {
        let sessions = self.sessions.lock().await;
        sessions
            .get(room_id)
            .map_or(0, |session| session.participants.len())
    }

    /// 参加中の接続 ID（参加順）
    pub async fn connection_ids(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(room_id)
            .map(RoomSession::connection_ids)
            .unwrap_or_default()
    }

    pub async fn has_session(&self, room_id: &RoomId) -> bool {
        self.sessions.lock().await.contains_key(room_id)
    }

    /// 接続が今そのルームのセッションにいれば、セッションのルーム情報を返す
    pub async fn membership(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<RoomRecord> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(room_id)
            .filter(|session| session.participants.contains_key(connection_id))
            .map(|session| session.room.clone())
    }

    /// 稼働中のセッション一覧（ルーム ID 順）
    pub async fn active_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.lock().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(room_id, session)| SessionSummary {
                room_id: room_id.clone(),
                participant_count: session.participants.len(),
                host_connected: session.host_connection_id.is_some(),
                timer_running: session
                    .timer
                    .as_ref()
                    .is_some_and(|timer| !timer.is_finished()),
            })
            .collect();
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// テストでレジストリ操作を途中で止めるためのロック
    #[cfg(test)]
    pub(crate) fn session_lock(&self) -> &Mutex<HashMap<RoomId, RoomSession>> {
        &self.sessions
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        domain::{DirectoryError, DisplayName, MockRoomDirectory, ParticipantRole, UserId},
        infrastructure::{directory::InMemoryRoomDirectory, message_pusher::WebSocketMessagePusher},
    };
    use hangout_shared::time::ManualClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 参加（存在・期限・定員・ホスト判定）、退出、ホストによる終了
    // - 「セッションが存在する ⇔ 参加者が 1 人以上」の不変条件
    // - タイマーがセッションごとに 1 つだけ起動されること
    //
    // 【なぜこのテストが必要か】
    // - レジストリは「誰がどのルームにいるか」の唯一の情報源
    // - 定員チェックと追加が分離すると定員を超えて参加できてしまう
    // ========================================

    pub(crate) const NOW: i64 = 1_700_000_000_000;
    pub(crate) const HOUR: i64 = 3_600_000;

    pub(crate) fn room_id(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    pub(crate) fn connection(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    pub(crate) fn room(id: &str, host: &str, max: usize, expires_at: i64) -> RoomRecord {
        RoomRecord {
            room_id: room_id(id),
            room_name: "Standup".to_string(),
            description: "daily sync".to_string(),
            host_id: UserId::new(host.to_string()).unwrap(),
            max_participants: max,
            expires_at: Timestamp::new(expires_at),
            allow_uploads: false,
        }
    }

    pub(crate) fn participant(connection_id: &str, user_id: &str, name: &str) -> Participant {
        Participant::new(
            connection(connection_id),
            UserId::new(user_id.to_string()).unwrap(),
            DisplayName::new(name.to_string()).unwrap(),
            Timestamp::new(NOW),
        )
    }

    pub(crate) fn create_registry(rooms: Vec<RoomRecord>) -> (Arc<RoomRegistry>, Arc<ManualClock>) {
        let directory = Arc::new(InMemoryRoomDirectory::with_rooms(rooms));
        let clock = Arc::new(ManualClock::new(NOW));
        let broadcaster = EventBroadcaster::new(Arc::new(WebSocketMessagePusher::new()));
        let registry = RoomRegistry::new(directory, clock.clone(), broadcaster);
        (registry, clock)
    }

    #[tokio::test]
    async fn test_add_participant_success() {
        // テスト項目: 参加するとセッションが作られ、参加者が登録される
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作):
        let joined = registry
            .add_participant(&room_id, participant("c1", "u2", "bob"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.participant.role, ParticipantRole::Participant);
        assert_eq!(joined.remaining_millis, HOUR);
        assert!(!joined.rejoined);
        assert!(registry.has_session(&room_id).await);
        assert_eq!(registry.participant_count(&room_id).await, 1);
        assert_eq!(registry.snapshot_participants(&room_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_participant_room_not_found() {
        // テスト項目: Directory にないルームには参加できない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![]);
        let room_id = room_id("HANGOUT-000000");

        // when (操作):
        let result = registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::RoomNotFound(room_id.clone())));
        assert!(!registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_add_participant_room_expired() {
        // テスト項目: 期限切れのルームには参加できず、参加者も追加されない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW - 1)]);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作):
        let result = registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinError::RoomExpired(room_id.clone())));
        assert_eq!(registry.participant_count(&room_id).await, 0);
        assert!(!registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_add_participant_expired_at_exact_instant() {
        // テスト項目: 期限時刻ちょうどの参加も期限切れとして扱われる
        // given (前提条件):
        let (registry, clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        clock.set(NOW + HOUR);

        // when (操作):
        let result = registry
            .add_participant(&room_id("HANGOUT-ab12cd"), participant("c1", "u1", "alice"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinError::RoomExpired(_))));
    }

    #[tokio::test]
    async fn test_add_participant_capacity_exceeded() {
        // テスト項目: 定員 2 のルームに 3 人目は参加できない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 2, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();

        // when (操作):
        let result = registry
            .add_participant(&room_id, participant("c3", "u3", "charlie"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::RoomFull {
                room_id: room_id.clone(),
                max_participants: 2
            })
        );
        assert_eq!(registry.participant_count(&room_id).await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_joins_respect_capacity() {
        // テスト項目: 同時に参加しても定員を超えない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 3, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作): 10 接続が同時に参加を試みる
        let mut handles = Vec::new();
        for i in 0..10 {
            let registry = registry.clone();
            let room_id = room_id.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .add_participant(
                        &room_id,
                        participant(&format!("c{}", i), &format!("u{}", i + 100), "guest"),
                    )
                    .await
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(succeeded, 3);
        assert_eq!(registry.participant_count(&room_id).await, 3);
    }

    #[tokio::test]
    async fn test_host_is_resolved_at_join() {
        // テスト項目: ホストのユーザー ID で参加した接続がホストになる
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作):
        let host = registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(host.participant.role, ParticipantRole::Host);
        let summaries = registry.active_sessions().await;
        assert!(summaries[0].host_connected);
    }

    #[tokio::test]
    async fn test_duplicate_join_is_idempotent() {
        // テスト項目: 同じ接続の再参加では参加者が重複せず、定員チェックもされない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 1, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // when (操作):
        let again = registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(again.rejoined);
        assert_eq!(again.participant.role, ParticipantRole::Host);
        assert_eq!(registry.participant_count(&room_id).await, 1);
    }

    #[tokio::test]
    async fn test_remove_sole_participant_deletes_session() {
        // テスト項目: 唯一の参加者が退出するとセッションが消える
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // when (操作):
        let removed = registry.remove_participant(&room_id, &connection("c1")).await;

        // then (期待する結果):
        assert_eq!(removed.map(|p| p.display_name.into_string()), Some("alice".to_string()));
        assert!(!registry.has_session(&room_id).await);
        assert!(registry.active_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_one_of_two_keeps_session() {
        // テスト項目: 2 人のうち 1 人が退出してもセッションは残る
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();

        // when (操作):
        registry.remove_participant(&room_id, &connection("c1")).await;

        // then (期待する結果):
        assert!(registry.has_session(&room_id).await);
        assert_eq!(registry.participant_count(&room_id).await, 1);
        assert_eq!(
            registry.participant_count(&room_id).await,
            registry.snapshot_participants(&room_id).await.len()
        );
        // ホストが抜けたのでホスト接続はなくなる
        assert!(!registry.active_sessions().await[0].host_connected);
    }

    #[tokio::test]
    async fn test_remove_unknown_participant_is_noop() {
        // テスト項目: 存在しない参加者の削除は何もしない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let other_room = room_id("HANGOUT-ffffff");
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // when (操作):
        let removed = registry.remove_participant(&room_id, &connection("c9")).await;
        let removed_elsewhere = registry
            .remove_participant(&other_room, &connection("c1"))
            .await;

        // then (期待する結果):
        assert!(removed.is_none());
        assert!(removed_elsewhere.is_none());
        assert_eq!(registry.participant_count(&room_id).await, 1);
    }

    #[tokio::test]
    async fn test_rejoin_after_empty_recreates_session() {
        // テスト項目: 空になって削除されたルームにも再び参加できる
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry.remove_participant(&room_id, &connection("c1")).await;

        // when (操作):
        let result = registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(registry.participant_count(&room_id).await, 1);
    }

    #[tokio::test]
    async fn test_close_session_by_non_host() {
        // テスト項目: ホスト以外はセッションを終了できず、参加者はそのまま
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();

        // when (操作):
        let result = registry.close_session(&room_id, &connection("c2")).await;

        // then (期待する結果):
        assert_eq!(result, Err(CloseError::NotHost(room_id.clone())));
        assert_eq!(registry.participant_count(&room_id).await, 2);
    }

    #[tokio::test]
    async fn test_close_session_by_host() {
        // テスト項目: ホストが終了するとセッションが消え、全参加者が返される
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();

        // when (操作):
        let members = registry.close_session(&room_id, &connection("c1")).await;

        // then (期待する結果):
        let members = members.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&connection("c1")));
        assert!(members.contains(&connection("c2")));
        assert!(!registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_close_session_not_found() {
        // テスト項目: 存在しないセッションの終了は SessionNotFound
        let (registry, _clock) = create_registry(vec![]);
        let room_id = room_id("HANGOUT-ab12cd");
        let result = registry.close_session(&room_id, &connection("c1")).await;
        assert_eq!(result, Err(CloseError::SessionNotFound(room_id)));
    }

    #[tokio::test]
    async fn test_end_session_without_host() {
        // テスト項目: end_session はホストの有無に関係なくセッションを削除し、参加者を返す
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();

        // when (操作):
        let members = registry.end_session(&room_id).await;

        // then (期待する結果):
        assert_eq!(members, Some(vec![connection("c2")]));
        assert!(!registry.has_session(&room_id).await);
        assert!(registry.active_sessions().await.is_empty());
        assert_eq!(registry.end_session(&room_id).await, None);
    }

    #[tokio::test]
    async fn test_single_timer_per_session() {
        // テスト項目: 空のルームに続けて参加してもタイマーは 1 つだけ
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作):
        let (first, second) = tokio::join!(
            registry.add_participant(&room_id, participant("c1", "u1", "alice")),
            registry.add_participant(&room_id, participant("c2", "u2", "bob")),
        );

        // then (期待する結果):
        assert!(first.is_ok() && second.is_ok());
        let generation = {
            let sessions = registry.sessions.lock().await;
            let session = sessions.get(&room_id).unwrap();
            assert!(session.timer.is_some());
            session.generation
        };
        let summaries = registry.active_sessions().await;
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].timer_running);
        // 同じルームで作られたセッションは 1 世代だけ
        assert_eq!(generation, 0);
    }

    #[tokio::test]
    async fn test_tick_reports_remaining_time() {
        // テスト項目: tick は残り時間と配信先を返す
        // given (前提条件):
        let (registry, clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        clock.advance(1_000);

        // when (操作):
        let tick = registry.tick(&room_id, 0).await;

        // then (期待する結果):
        assert_eq!(
            tick,
            Tick::Running {
                remaining_millis: HOUR - 1_000,
                recipients: vec![connection("c1")],
            }
        );
    }

    #[tokio::test]
    async fn test_tick_expires_session_even_after_clock_jump() {
        // テスト項目: 時計が期限を大きく過ぎても、次の tick でセッションが削除される
        // given (前提条件):
        let (registry, clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        clock.advance(10 * HOUR);

        // when (操作):
        let tick = registry.tick(&room_id, 0).await;
        let after = registry.tick(&room_id, 0).await;

        // then (期待する結果):
        assert_eq!(tick, Tick::Expired(vec![connection("c1")]));
        assert_eq!(after, Tick::Gone);
        assert!(!registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_tick_ignores_stale_generation() {
        // テスト項目: 作り直されたセッションに古いタイマーの tick は作用しない
        // given (前提条件):
        let (registry, clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();
        registry.remove_participant(&room_id, &connection("c1")).await;
        registry
            .add_participant(&room_id, participant("c2", "u2", "bob"))
            .await
            .unwrap();
        clock.advance(2 * HOUR);

        // when (操作):
        let tick = registry.tick(&room_id, 0).await;

        // then (期待する結果):
        assert_eq!(tick, Tick::Gone);
        assert!(registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_directory_failure_is_reported() {
        // テスト項目: Directory の障害は JoinError::Directory になり、状態は変わらない
        // given (前提条件):
        let mut directory = MockRoomDirectory::new();
        directory
            .expect_find_room()
            .returning(|_| Err(DirectoryError::Unavailable("timeout".to_string())));
        let clock = Arc::new(ManualClock::new(NOW));
        let broadcaster = EventBroadcaster::new(Arc::new(WebSocketMessagePusher::new()));
        let registry = RoomRegistry::new(Arc::new(directory), clock, broadcaster);
        let room_id = room_id("HANGOUT-ab12cd");

        // when (操作):
        let result = registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::Directory(DirectoryError::Unavailable(
                "timeout".to_string()
            )))
        );
        assert!(!registry.has_session(&room_id).await);
    }

    #[tokio::test]
    async fn test_membership_requires_current_session() {
        // テスト項目: セッションにいない接続はメンバー扱いされない
        // given (前提条件):
        let (registry, _clock) = create_registry(vec![room("HANGOUT-ab12cd", "u1", 5, NOW + HOUR)]);
        let room_id = room_id("HANGOUT-ab12cd");
        registry
            .add_participant(&room_id, participant("c1", "u1", "alice"))
            .await
            .unwrap();

        // when (操作) / then (期待する結果):
        assert!(registry.membership(&room_id, &connection("c1")).await.is_some());
        assert!(registry.membership(&room_id, &connection("c2")).await.is_none());
    }
}
