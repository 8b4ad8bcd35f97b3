//! UseCase: ゲーム進行のオーケストレーター
//!
//! 各操作は次の順序で処理する。
//!
//! 1. レジストリのロックを取り、ルームを検証・更新し、タイマーを張り直す
//! 2. 送信すべき通知を Outbox に溜めてロックを解放する
//! 3. 永続化（ベストエフォート）と通知の送信を行う
//!
//! 通知の遅延や失敗がメモリ上の状態とずれを生まないよう、
//! ロックを保持したまま外部 I/O を待つことはしない。

use std::{
    collections::HashSet,
    future::Future,
    ops::RangeInclusive,
    sync::{Arc, PoisonError},
    time::Duration,
};

use jinro_shared::time::Clock;
use rand::Rng;
use tokio::sync::Mutex;

use crate::domain::{
    ContextId, GameSettings, GameStore, Notice, Notifier, NotifyError, PlayerId, Room,
    RoomRegistry, RoomId, StoreError,
};

use super::{
    error::GameError,
    recovery::RecoveryAdapter,
    scheduler::{PhaseScheduler, TimerKind},
};

/// フェーズ進行に関わる固定時間
#[derive(Debug, Clone)]
pub struct PhaseTiming {
    pub discussion: Duration,
    /// 議論終了の何秒前にカウントダウン通知を送るか
    pub countdowns: Vec<Duration>,
    pub extension: Duration,
    pub synthetic_action_delay: RangeInclusive<Duration>,
    pub synthetic_vote_delay: RangeInclusive<Duration>,
    pub result_delay: Duration,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            discussion: Duration::from_secs(180),
            countdowns: vec![
                Duration::from_secs(60),
                Duration::from_secs(30),
                Duration::from_secs(10),
            ],
            extension: Duration::from_secs(60),
            synthetic_action_delay: Duration::from_secs(2)..=Duration::from_secs(5),
            synthetic_vote_delay: Duration::from_secs(1)..=Duration::from_secs(4),
            result_delay: Duration::from_secs(1),
        }
    }
}

enum Delivery {
    Context(ContextId, Notice),
    Player(PlayerId, Notice),
}

/// ロック解放後に送る通知の束
pub(crate) struct Outbox {
    room_id: RoomId,
    gm_id: PlayerId,
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub(crate) fn for_room(room: &Room) -> Self {
        Self {
            room_id: room.room_id.clone(),
            gm_id: room.gm_id.clone(),
            deliveries: Vec::new(),
        }
    }

    pub(crate) fn to_context(&mut self, context: ContextId, notice: Notice) {
        self.deliveries.push(Delivery::Context(context, notice));
    }

    /// 合成参加者宛ての通知は捨てる
    pub(crate) fn to_player(&mut self, player: &PlayerId, notice: Notice) {
        if player.is_synthetic() {
            return;
        }
        self.deliveries.push(Delivery::Player(player.clone(), notice));
    }
}

/// ゲーム進行サービス
///
/// 全ルームの状態と、それを動かすタイマーを所有する。
/// `Clone` は同じ状態への新しいハンドルを作る。
#[derive(Clone)]
pub struct GameService {
    pub(crate) registry: Arc<Mutex<RoomRegistry>>,
    pub(crate) scheduler: Arc<PhaseScheduler>,
    pub(crate) store: Arc<dyn GameStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) timing: Arc<PhaseTiming>,
    quota_warned: Arc<std::sync::Mutex<HashSet<RoomId>>>,
}

impl GameService {
    pub fn new(
        settings: GameSettings,
        store: Arc<dyn GameStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_timing(settings, store, notifier, clock, PhaseTiming::default())
    }

    pub fn with_timing(
        settings: GameSettings,
        store: Arc<dyn GameStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        timing: PhaseTiming,
    ) -> Self {
        Self {
            registry: Arc::new(Mutex::new(RoomRegistry::new(settings))),
            scheduler: Arc::new(PhaseScheduler::new()),
            store,
            notifier,
            clock,
            timing: Arc::new(timing),
            quota_warned: Arc::new(std::sync::Mutex::new(HashSet::new())),
        }
    }

    /// ルームのスナップショットを取得
    pub async fn room(&self, room_id: &RoomId) -> Option<Room> {
        self.registry.lock().await.by_room_id(room_id).cloned()
    }

    /// コンテキストに紐づくルームのスナップショットを取得
    pub async fn room_in_context(&self, context: &ContextId) -> Option<Room> {
        self.registry.lock().await.by_context(context).cloned()
    }

    /// 全ルームのスナップショット（ルーム ID 順）
    pub async fn rooms(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.registry.lock().await.rooms().cloned().collect();
        rooms.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));
        rooms
    }

    pub fn pending_timers(&self, room_id: &RoomId, kind: Option<TimerKind>) -> usize {
        self.scheduler.pending(room_id, kind)
    }

    /// GM コマンドの対象ルームを解決する
    pub(crate) fn command_room<'a>(
        registry: &'a mut RoomRegistry,
        context: &ContextId,
        actor: &PlayerId,
    ) -> Result<&'a mut Room, GameError> {
        let room_id = registry
            .resolve_command_room(context, actor)
            .ok_or(GameError::RoomNotFound)?;
        registry
            .by_room_id_mut(&room_id)
            .ok_or(GameError::RoomNotFound)
    }

    pub(crate) fn require_gm(room: &Room, actor: &PlayerId) -> Result<(), GameError> {
        if room.is_gm(actor) {
            Ok(())
        } else {
            Err(GameError::NotGameMaster)
        }
    }

    /// タイマー発火時のルーム取得
    ///
    /// ルームが消えているか、タイマーを張った後にフェーズが進んでいれば `None`。
    pub(crate) fn timer_room<'a>(
        registry: &'a mut RoomRegistry,
        room_id: &RoomId,
        generation: u64,
    ) -> Option<&'a mut Room> {
        match registry.by_room_id_mut(room_id) {
            Some(room) if room.generation == generation => Some(room),
            Some(_) => {
                tracing::debug!(%room_id, generation, "Ignoring stale timer");
                None
            }
            None => None,
        }
    }

    /// ルームの現在の世代に紐づけてタイマーを張る
    pub(crate) fn arm<F, Fut>(&self, room: &Room, kind: TimerKind, delay: Duration, action: F)
    where
        F: FnOnce(GameService, RoomId, u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = action(self.clone(), room.room_id.clone(), room.generation);
        self.scheduler.arm(&room.room_id, kind, delay, task);
    }

    pub(crate) fn recovery(&self) -> RecoveryAdapter {
        RecoveryAdapter::new(self.store.clone())
    }

    pub(crate) fn now_millis(&self) -> i64 {
        self.clock.now_jst_millis()
    }

    /// 永続化の失敗はログに残すだけで、ゲーム進行は止めない
    pub(crate) async fn persist<F>(&self, operation: &'static str, room_id: &RoomId, write: F)
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        if let Err(error) = write.await {
            tracing::error!(%room_id, operation, %error, "Failed to persist game state");
        }
    }

    /// Outbox の通知を順に送信する
    pub(crate) async fn deliver(&self, outbox: Outbox) {
        let Outbox {
            room_id,
            gm_id,
            deliveries,
        } = outbox;

        for delivery in deliveries {
            let (recipient, kind, result) = match &delivery {
                Delivery::Context(context, notice) => (
                    context.as_str(),
                    notice.kind(),
                    self.notifier.send_to_context(context, notice).await,
                ),
                Delivery::Player(player, notice) => (
                    player.as_str(),
                    notice.kind(),
                    self.notifier.send_to_player(player, notice).await,
                ),
            };

            match result {
                Ok(()) => tracing::debug!(%room_id, recipient, kind, "Notice delivered"),
                Err(NotifyError::QuotaExceeded) => {
                    tracing::warn!(%room_id, recipient, kind, "Message quota exceeded");
                    self.warn_quota_once(&room_id, &gm_id).await;
                }
                Err(error) => {
                    tracing::warn!(%room_id, recipient, kind, %error, "Failed to deliver notice");
                }
            }
        }
    }

    async fn warn_quota_once(&self, room_id: &RoomId, gm_id: &PlayerId) {
        let first = self
            .quota_warned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room_id.clone());
        if !first {
            return;
        }
        if let Err(error) = self
            .notifier
            .send_to_player(gm_id, &Notice::QuotaExceeded)
            .await
        {
            tracing::warn!(%room_id, gm = %gm_id, %error, "Could not tell the GM about the quota");
        }
    }

    /// 終了したルームの後始末
    pub(crate) fn forget_room(&self, room_id: &RoomId) {
        self.quota_warned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(room_id);
    }

    #[cfg(test)]
    pub(crate) fn quota_warned(&self, room_id: &RoomId) -> bool {
        self.quota_warned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(room_id)
    }
}

pub(crate) fn random_delay(range: &RangeInclusive<Duration>) -> Duration {
    let (min, max) = (range.start().as_millis(), range.end().as_millis());
    if min >= max {
        return *range.start();
    }
    let millis = rand::rng().random_range(min..=max);
    Duration::from_millis(millis as u64)
}

/// 候補から一様に 1 つ選ぶ
pub(crate) fn pick_random<T: Clone>(candidates: &[T]) -> Option<T> {
    if candidates.is_empty() {
        return None;
    }
    let index = rand::rng().random_range(0..candidates.len());
    candidates.get(index).cloned()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::MockNotifier;
    use crate::infrastructure::store::InMemoryGameStore;

    #[tokio::test]
    async fn test_quota_exceeded_is_surfaced_to_gm_once() {
        // テスト項目: 送信上限エラーは GM に一度だけ通知される
        // given (前提条件):
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_to_context()
            .returning(|_, _| Err(NotifyError::QuotaExceeded));
        notifier
            .expect_send_to_player()
            .withf(|player, notice| player.as_str() == "gm" && *notice == Notice::QuotaExceeded)
            .times(1)
            .returning(|_, _| Ok(()));
        let service = service_with(Arc::new(InMemoryGameStore::new()), notifier);

        // when (操作):
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();
        service
            .add_dummies(ctx("group"), pid("gm"), 2)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(service.room(&room_id).await.is_some());
    }

    #[tokio::test]
    async fn test_end_game_clears_quota_warning_after_final_notice() {
        // テスト項目: 終了通知でも上限に達したルームの警告記録が終了後に残らない
        // given (前提条件): 送信上限に達したまま募集中のルーム
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_to_context()
            .returning(|_, _| Err(NotifyError::QuotaExceeded));
        notifier
            .expect_send_to_player()
            .withf(|player, notice| player.as_str() == "gm" && *notice == Notice::QuotaExceeded)
            .times(1)
            .returning(|_, _| Ok(()));
        let service = service_with(Arc::new(InMemoryGameStore::new()), notifier);
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();
        assert!(service.quota_warned(&room_id));

        // when (操作):
        service.end_game(ctx("group"), pid("gm")).await.unwrap();

        // then (期待する結果):
        assert!(!service.quota_warned(&room_id));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_unwind_state() {
        // テスト項目: 通知の失敗でルームの状態は巻き戻らない
        // given (前提条件):
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_to_context()
            .returning(|_, _| Err(NotifyError::Transport("connection reset".to_string())));
        notifier
            .expect_send_to_player()
            .returning(|_, _| Err(NotifyError::Transport("connection reset".to_string())));
        let service = service_with(Arc::new(InMemoryGameStore::new()), notifier);

        // when (操作):
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();

        // then (期待する結果):
        let room = service.room(&room_id).await.unwrap();
        assert_eq!(room.participants, vec![pid("gm")]);
    }

    #[test]
    fn test_random_delay_stays_in_range() {
        // テスト項目: ランダム遅延が指定範囲に収まる
        let range = Duration::from_secs(2)..=Duration::from_secs(5);
        for _ in 0..200 {
            let delay = random_delay(&range);
            assert!(range.contains(&delay));
        }
    }

    #[test]
    fn test_pick_random_empty_is_none() {
        // テスト項目: 候補が空なら何も選ばれない
        let empty: Vec<PlayerId> = Vec::new();
        assert_eq!(pick_random(&empty), None);
        assert_eq!(pick_random(&[pid("a")]), Some(pid("a")));
    }
}
