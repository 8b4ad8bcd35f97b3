//! UseCase: 昼（議論）フェーズと投票の開始

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{ContextId, Notice, PlayerId, Room, RoomId, RoomStatus, VoteTarget};

use super::{
    error::GameError,
    scheduler::TimerKind,
    service::{GameService, Outbox, pick_random, random_delay},
};

impl GameService {
    /// 議論終了時刻に合わせてカウントダウンと投票開始のタイマーを張る
    ///
    /// 呼び出し側は事前に `cancel_all` しておくこと。
    pub(crate) fn arm_discussion_timers(&self, room: &Room) {
        let Some(end_at) = room.discussion_end_at else {
            return;
        };
        let now = Instant::now();

        for remaining in self.timing.countdowns.iter().copied() {
            let Some(fire_at) = end_at.checked_sub(remaining) else {
                continue;
            };
            if fire_at <= now {
                continue;
            }
            self.arm(room, TimerKind::Countdown, fire_at - now, move |service, room_id, generation| async move {
                service.announce_countdown(room_id, generation, remaining).await;
            });
        }

        self.arm(
            room,
            TimerKind::DiscussionEnd,
            end_at.saturating_duration_since(now),
            |service, room_id, generation| async move {
                service.close_discussion(room_id, generation).await;
            },
        );
    }

    async fn announce_countdown(&self, room_id: RoomId, generation: u64, remaining: Duration) {
        let outbox = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(
                room.broadcast_target(),
                Notice::Countdown {
                    remaining_seconds: remaining.as_secs(),
                },
            );
            outbox
        };
        self.deliver(outbox).await;
    }

    /// 議論時間の満了
    async fn close_discussion(&self, room_id: RoomId, generation: u64) {
        let outbox = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            if room.status != RoomStatus::Day {
                return;
            }
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(room.broadcast_target(), Notice::DiscussionEnded);
            self.open_voting(room, &mut outbox);
            outbox
        };

        tracing::info!(%room_id, "Discussion time is up; voting started");
        self.deliver(outbox).await;
    }

    /// 議論を早めに終えて投票に移る（GM のみ）
    pub async fn end_discussion(&self, context: ContextId, actor: PlayerId) -> Result<RoomId, GameError> {
        let (room_id, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = Self::command_room(&mut registry, &context, &actor)?;
            Self::require_gm(room, &actor)?;
            if room.status != RoomStatus::Day {
                return Err(GameError::wrong_phase(RoomStatus::Day, room.status));
            }
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(room.broadcast_target(), Notice::DiscussionEnded);
            self.open_voting(room, &mut outbox);
            (room.room_id.clone(), outbox)
        };

        tracing::info!(%room_id, gm = %actor, "Discussion ended early; voting started");
        self.deliver(outbox).await;
        Ok(room_id)
    }

    /// 議論を延長する（GM のみ）。戻り値は延長後の残り時間。
    ///
    /// 終了時刻を過ぎていれば現在時刻から、そうでなければ終了時刻に加算する。
    pub async fn extend_discussion(&self, context: ContextId, actor: PlayerId) -> Result<Duration, GameError> {
        let (room_id, remaining, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = Self::command_room(&mut registry, &context, &actor)?;
            Self::require_gm(room, &actor)?;
            if room.status != RoomStatus::Day {
                return Err(GameError::wrong_phase(RoomStatus::Day, room.status));
            }

            self.scheduler.cancel_all(&room.room_id);
            let now = Instant::now();
            let extension = self.timing.extension;
            let end_at = match room.discussion_end_at {
                Some(end_at) if end_at > now => end_at + extension,
                _ => now + extension,
            };
            room.discussion_end_at = Some(end_at);
            room.rearm();
            self.arm_discussion_timers(room);

            let remaining = end_at.saturating_duration_since(now);
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(
                room.broadcast_target(),
                Notice::DiscussionExtended {
                    remaining_seconds: remaining.as_secs(),
                },
            );
            (room.room_id.clone(), remaining, outbox)
        };

        tracing::info!(%room_id, remaining_secs = remaining.as_secs(), "Discussion extended");
        self.deliver(outbox).await;
        Ok(remaining)
    }

    /// 議論の残り時間（0 未満にはならない）
    pub async fn remaining_time(&self, context: ContextId, actor: PlayerId) -> Result<Duration, GameError> {
        let registry = self.registry.lock().await;
        let room_id = registry
            .resolve_command_room(&context, &actor)
            .ok_or(GameError::RoomNotFound)?;
        let room = registry
            .by_room_id(&room_id)
            .ok_or(GameError::RoomNotFound)?;
        if room.status != RoomStatus::Day {
            return Err(GameError::wrong_phase(RoomStatus::Day, room.status));
        }
        Ok(room
            .discussion_end_at
            .map(|end_at| end_at.saturating_duration_since(Instant::now()))
            .unwrap_or_default())
    }

    /// 投票フェーズに入り、投票用紙を配る
    ///
    /// 合成参加者は少し遅れて自動で投票する。
    fn open_voting(&self, room: &mut Room, outbox: &mut Outbox) {
        self.scheduler.cancel_all(&room.room_id);
        room.enter(RoomStatus::Voting);

        outbox.to_context(room.broadcast_target(), Notice::VotingOpened);
        let voters: Vec<PlayerId> = room
            .role_assignment
            .iter()
            .flat_map(|assignment| assignment.players())
            .cloned()
            .collect();
        for voter in voters.iter().filter(|p| !p.is_synthetic()) {
            outbox.to_player(
                voter,
                Notice::Ballot {
                    room_id: room.room_id.clone(),
                    candidates: voters.iter().filter(|p| *p != voter).cloned().collect(),
                },
            );
        }
        self.arm_synthetic_votes(room);
    }

    /// 役職を持つ合成参加者それぞれに自動投票のタイマーを張る
    pub(crate) fn arm_synthetic_votes(&self, room: &Room) {
        let voters = room
            .role_assignment
            .iter()
            .flat_map(|assignment| assignment.players())
            .filter(|p| p.is_synthetic());
        for voter in voters {
            let delay = random_delay(&self.timing.synthetic_vote_delay);
            let voter = voter.clone();
            self.arm(room, TimerKind::SyntheticVote, delay, move |service, room_id, generation| async move {
                service.vote_as_synthetic(room_id, generation, voter).await;
            });
        }
    }

    /// 合成参加者の投票：自分以外の実プレイヤーからランダム、いなければ平和村
    async fn vote_as_synthetic(&self, room_id: RoomId, generation: u64, voter: PlayerId) {
        let target = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            let candidates: Vec<PlayerId> = room
                .real_participants()
                .filter(|p| **p != voter && room.role_of(p).is_some())
                .cloned()
                .collect();
            pick_random(&candidates).map_or(VoteTarget::NoExpulsion, VoteTarget::Player)
        };

        if let Err(error) = self.vote(room_id.clone(), voter.clone(), target).await {
            tracing::warn!(%room_id, %voter, %error, "Synthetic vote was rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::MockNotifier;
    use crate::infrastructure::store::InMemoryGameStore;
    use crate::usecase::service::test_support::{closed_room, ctx, pid, service, service_with};

    /// 昼フェーズまで進めたルーム（議論開始から 1 秒経過した時点）
    async fn day_room(service: &GameService) -> RoomId {
        let room_id = closed_room(service, 3).await;
        service.assign_roles(room_id.clone(), pid("gm")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(46)).await;
        assert_eq!(service.room(&room_id).await.unwrap().status, RoomStatus::Day);
        room_id
    }

    /// 送信した通知を記録する Notifier
    fn recording_notifier(log: Arc<Mutex<Vec<Notice>>>) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        let context_log = log.clone();
        notifier.expect_send_to_context().returning(move |_, notice| {
            context_log.lock().unwrap().push(notice.clone());
            Ok(())
        });
        notifier.expect_send_to_player().returning(|_, _| Ok(()));
        notifier
    }

    #[tokio::test(start_paused = true)]
    async fn test_day_arms_three_countdowns_and_one_end() {
        // テスト項目: 昼フェーズ開始時にカウントダウン 3 本と終了タイマー 1 本が張られる
        // given (前提条件):
        let service = service();

        // when (操作):
        let room_id = day_room(&service).await;

        // then (期待する結果):
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::Countdown)), 3);
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::DiscussionEnd)), 1);
        let remaining = service.remaining_time(ctx("group"), pid("anyone")).await.unwrap();
        assert_eq!(remaining, Duration::from_secs(179));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_twice_adds_two_increments() {
        // テスト項目: 期限前に 2 回延長すると終了時刻が +120 秒になり、終了タイマーは 1 本だけ
        // given (前提条件):
        let service = service();
        let room_id = day_room(&service).await;
        let original_end = service.room(&room_id).await.unwrap().discussion_end_at.unwrap();

        // when (操作):
        service.extend_discussion(ctx("group"), pid("gm")).await.unwrap();
        let remaining = service.extend_discussion(ctx("group"), pid("gm")).await.unwrap();

        // then (期待する結果):
        let room = service.room(&room_id).await.unwrap();
        assert_eq!(
            room.discussion_end_at.unwrap(),
            original_end + Duration::from_secs(120)
        );
        assert_eq!(remaining, Duration::from_secs(299));
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::DiscussionEnd)), 1);
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::Countdown)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extended_discussion_moves_to_voting_at_new_end() {
        // テスト項目: 延長後は新しい終了時刻で投票に進む
        // given (前提条件):
        let service = service();
        let room_id = day_room(&service).await;
        service.extend_discussion(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        tokio::time::sleep(Duration::from_secs(181)).await;
        let after_original_end = service.room(&room_id).await.unwrap().status;
        tokio::time::sleep(Duration::from_secs(60)).await;

        // then (期待する結果):
        // GM が投票しないので結果発表には進まない
        assert_eq!(after_original_end, RoomStatus::Day);
        assert_eq!(
            service.room(&room_id).await.unwrap().status,
            RoomStatus::Voting
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_discussion_cancels_day_timers() {
        // テスト項目: 議論の早期終了で昼のタイマーが全て取り消され、以後カウントダウンは届かない
        // given (前提条件):
        let log = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(
            Arc::new(InMemoryGameStore::new()),
            recording_notifier(log.clone()),
        );
        let room_id = day_room(&service).await;

        // when (操作):
        let by_guest = service.end_discussion(ctx("group"), pid("guest")).await;
        service.end_discussion(ctx("group"), pid("gm")).await.unwrap();
        let voting = service.room(&room_id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(300)).await;

        // then (期待する結果):
        assert_eq!(by_guest, Err(GameError::NotGameMaster));
        assert_eq!(voting.status, RoomStatus::Voting);
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::Countdown)), 0);
        assert_eq!(service.pending_timers(&room_id, Some(TimerKind::DiscussionEnd)), 0);
        let notices = log.lock().unwrap();
        assert!(!notices.iter().any(|n| matches!(n, Notice::Countdown { .. })));
        let ended = notices
            .iter()
            .filter(|n| matches!(n, Notice::DiscussionEnded))
            .count();
        assert_eq!(ended, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdowns_fire_in_order() {
        // テスト項目: カウントダウン通知が 60・30・10 秒前の順に届く
        // given (前提条件):
        let log = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(
            Arc::new(InMemoryGameStore::new()),
            recording_notifier(log.clone()),
        );
        day_room(&service).await;

        // when (操作):
        tokio::time::sleep(Duration::from_secs(175)).await;

        // then (期待する結果):
        let countdowns: Vec<u64> = log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notice::Countdown { remaining_seconds } => Some(*remaining_seconds),
                _ => None,
            })
            .collect();
        assert_eq!(countdowns, vec![60, 30, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_day_commands_are_rejected_in_other_phases() {
        // テスト項目: 昼以外での延長・残り時間確認はフェーズ違いで拒否される
        // given (前提条件):
        let service = service();
        closed_room(&service, 3).await;

        // when (操作):
        let extend = service.extend_discussion(ctx("group"), pid("gm")).await;
        let remaining = service.remaining_time(ctx("group"), pid("gm")).await;

        // then (期待する結果):
        let expected = GameError::wrong_phase(RoomStatus::Day, RoomStatus::Recruiting);
        assert_eq!(extend, Err(expected.clone()));
        assert_eq!(remaining, Err(expected));
    }
}
