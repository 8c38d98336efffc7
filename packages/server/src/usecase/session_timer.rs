//! Session Timer
//!
//! ルームごとのカウントダウン。1 秒ごとにルームの有効期限から残り時間を計算し直し、
//! `sessionTimer` を配信します。残り時間が 0 になったらセッションを削除して
//! `sessionEnded` を配信し、停止します。
//!
//! タイマーは RoomSession が所有し、Room Registry の外から参照されることはありません。
//! 停止経路は次の 3 つで、セッションの削除と同時に行われるため 1 つしか実行されません。
//!
//! 1. 参加者がいなくなった（`cancel`）
//! 2. ホストがセッションを終了した（`cancel`）
//! 3. タイマー自身が期限切れを検出した（`detach`）

use std::{sync::Weak, time::Duration};

use hangout_shared::time::format_hms;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::domain::{RoomEvent, RoomId};

use super::{
    broadcaster::EventBroadcaster,
    room_registry::{RoomRegistry, Tick},
};

/// Tick period of the countdown.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Spawn the countdown for one session.
    ///
    /// `generation` identifies the session instance, so a timer never acts
    /// on a later session created under the same room id.
    pub(crate) fn start(
        registry: Weak<RoomRegistry>,
        broadcaster: EventBroadcaster,
        room_id: RoomId,
        generation: u64,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            // A suspended process resumes with one tick, not a burst.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };

                match registry.tick(&room_id, generation).await {
                    Tick::Running {
                        remaining_millis,
                        recipients,
                    } => {
                        let event = RoomEvent::SessionTimer {
                            time: format_hms(remaining_millis),
                        };
                        broadcaster.to_connections(recipients, &event).await;
                    }
                    Tick::Expired(recipients) => {
                        tracing::info!("Session for room '{}' expired", room_id);
                        broadcaster
                            .to_connections(recipients, &RoomEvent::SessionEnded)
                            .await;
                        break;
                    }
                    Tick::Gone => break,
                }
            }
            tracing::debug!("Session timer for room '{}' stopped", room_id);
        });

        Self { handle }
    }

    /// Stop the countdown from outside the timer task.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }

    /// Give up ownership without aborting.
    ///
    /// Used on the expiry path, which runs inside the timer task itself and
    /// still has to deliver `sessionEnded`.
    pub(crate) fn detach(self) {
        drop(self.handle);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
