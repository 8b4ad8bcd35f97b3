//! UseCase: 投票と結果発表

use crate::domain::{
    Notice, PlayerId, RoomId, RoomStatus, StoredRoomStatus, TieBreak, VoteRecord, VoteTarget,
    verdict,
};

use super::{
    error::GameError,
    scheduler::TimerKind,
    service::{GameService, Outbox},
};

/// 投票受付後の集計状況
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub votes_cast: usize,
    pub votes_required: usize,
    /// 再投票で前の選択を上書きしたか
    pub replaced: bool,
}

impl GameService {
    /// 投票する（再投票は上書き）
    ///
    /// ルームがメモリにない場合は永続化ストアから復元してから記録する。
    /// 全員の票が揃った瞬間に結果発表を一度だけ予約する。
    pub async fn vote(
        &self,
        room_id: RoomId,
        voter: PlayerId,
        target: VoteTarget,
    ) -> Result<VoteOutcome, GameError> {
        self.ensure_resident(&room_id).await?;

        let (outcome, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = registry
                .by_room_id_mut(&room_id)
                .ok_or(GameError::RoomNotFound)?;
            if room.status != RoomStatus::Voting {
                return Err(GameError::wrong_phase(RoomStatus::Voting, room.status));
            }
            if room.role_of(&voter).is_none() {
                return Err(GameError::RoleNotFound(voter.into_string()));
            }
            if let VoteTarget::Player(player) = &target {
                if *player == voter {
                    return Err(GameError::InvalidTarget(player.to_string()));
                }
                if room.role_of(player).is_none() {
                    return Err(GameError::RoleNotFound(player.to_string()));
                }
            }

            let replaced = room.votes.record(voter.clone(), target.clone()).is_some();
            let outcome = VoteOutcome {
                votes_cast: room.votes.len(),
                votes_required: room.assigned_count(),
                replaced,
            };
            if outcome.votes_cast >= outcome.votes_required && !room.result_scheduled {
                room.result_scheduled = true;
                self.arm(
                    room,
                    TimerKind::ResultAnnouncement,
                    self.timing.result_delay,
                    |service, room_id, generation| async move {
                        service.announce_result(room_id, generation).await;
                    },
                );
                tracing::info!(%room_id, votes = outcome.votes_cast, "All votes are in; result scheduled");
            }

            let mut outbox = Outbox::for_room(room);
            outbox.to_player(
                &voter,
                Notice::VoteAccepted {
                    target: target.clone(),
                },
            );
            (outcome, outbox)
        };

        tracing::debug!(%room_id, %voter, %target, replaced = outcome.replaced, "Vote recorded");
        let record = VoteRecord {
            room_id: room_id.clone(),
            voter,
            target,
            created_at: self.now_millis(),
        };
        self.persist("create_vote_record", &room_id, self.store.create_vote_record(record))
            .await;
        self.deliver(outbox).await;
        Ok(outcome)
    }

    /// ルームがメモリになければ復元して登録する
    async fn ensure_resident(&self, room_id: &RoomId) -> Result<(), GameError> {
        let settings = {
            let registry = self.registry.lock().await;
            if registry.by_room_id(room_id).is_some() {
                return Ok(());
            }
            registry.settings()
        };

        let room = self.recovery().recover(room_id, settings).await?;

        let mut registry = self.registry.lock().await;
        // 復元中に別の投票が先に登録していればそちらを使う
        if registry.by_room_id(room_id).is_none() {
            tracing::info!(%room_id, roles = room.assigned_count(), "Room recovered from the store");
            self.arm_synthetic_votes(&room);
            registry.insert_recovered(room);
        }
        Ok(())
    }

    /// 集計し、勝敗と全員の役職を発表してルームを終了する
    pub(crate) async fn announce_result(&self, room_id: RoomId, generation: u64) {
        let (verdict, outbox) = {
            let mut registry = self.registry.lock().await;
            let Some(room) = Self::timer_room(&mut registry, &room_id, generation) else {
                return;
            };
            if room.status != RoomStatus::Voting {
                return;
            }

            let verdict = room.role_assignment.as_ref().and_then(|assignment| {
                verdict::decide(&room.votes, assignment, &room.field_cards, TieBreak::default())
            });
            self.scheduler.cancel_all(&room_id);
            room.enter(RoomStatus::Finished);

            let mut outbox = Outbox::for_room(room);
            if let Some(verdict) = &verdict {
                outbox.to_context(
                    room.broadcast_target(),
                    Notice::Result {
                        verdict: verdict.clone(),
                    },
                );
            }
            registry.remove(&room_id);
            (verdict, outbox)
        };

        match &verdict {
            Some(verdict) => tracing::info!(
                %room_id,
                winner = ?verdict.winner,
                expelled = ?verdict.expelled().map(PlayerId::as_str),
                "Game finished"
            ),
            None => tracing::warn!(%room_id, "Game finished without any role holders"),
        }
        self.persist(
            "update_room_status",
            &room_id,
            self.store
                .update_room_status(&room_id, StoredRoomStatus::Finished),
        )
        .await;
        self.deliver(outbox).await;
        self.forget_room(&room_id);
    }
}
