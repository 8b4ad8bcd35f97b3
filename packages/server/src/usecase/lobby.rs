//! UseCase: 募集フェーズ（ゲーム開始・参加・ダミー追加・募集締切・強制終了）

use crate::domain::{
    ContextId, Notice, PlayerId, PlayerRecord, Room, RoomId, RoomIdFactory, RoomRecord,
    RoomStatus, StoredRoomStatus, role::MAX_PLAYERS, role::MIN_PLAYERS,
};

use super::{
    error::GameError,
    service::{GameService, Outbox},
};

/// 一度に追加できる合成参加者の上限
const MAX_DUMMIES_PER_REQUEST: usize = MAX_PLAYERS - 1;

const SYNTHETIC_NAMES: [&str; 8] = [
    "Taro", "Hanako", "Kenji", "Yuki", "Sakura", "Daichi", "Ai", "Ren",
];

/// 合成参加者の表示名。名簿を一周したら番号を付ける。
pub fn synthetic_name(index: usize) -> String {
    let base = SYNTHETIC_NAMES[index % SYNTHETIC_NAMES.len()];
    match index / SYNTHETIC_NAMES.len() {
        0 => base.to_string(),
        lap => format!("{base}{lap}"),
    }
}

fn display_name(player: &PlayerId) -> String {
    player
        .is_synthetic()
        .then(|| player.as_str().rsplit('_').next()?.parse::<usize>().ok())
        .flatten()
        .map(synthetic_name)
        .unwrap_or_else(|| player.as_str().to_string())
}

fn player_records(room: &Room) -> Vec<PlayerRecord> {
    room.participants
        .iter()
        .map(|player| PlayerRecord {
            room_id: room.room_id.clone(),
            player_id: player.clone(),
            display_name: display_name(player),
            role: None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { participant_count: usize },
    AlreadyJoined { participant_count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed { participant_count: usize },
    AlreadyClosed,
}

impl GameService {
    /// ゲームを開始し、参加者の募集を始める
    ///
    /// 同じコンテキストで進行中のゲームがあれば拒否する。
    pub async fn start_game(&self, context: ContextId, actor: PlayerId) -> Result<RoomId, GameError> {
        let (record, outbox) = {
            let mut registry = self.registry.lock().await;
            if let Some(existing) = registry.by_context(&context)
                && existing.status != RoomStatus::Finished
            {
                return Err(GameError::GameInProgress {
                    status: existing.status,
                });
            }

            let room = Room::new(
                RoomIdFactory::generate(),
                context.clone(),
                actor.clone(),
                registry.settings(),
            );
            let mut outbox = Outbox::for_room(&room);
            outbox.to_context(
                context.clone(),
                Notice::RecruitmentOpened {
                    room_id: room.room_id.clone(),
                },
            );
            let record = RoomRecord {
                id: room.room_id.clone(),
                status: StoredRoomStatus::Recruiting,
                created_at: self.now_millis(),
                field_cards: Vec::new(),
            };
            registry.insert(&context, room);
            (record, outbox)
        };

        let room_id = record.id.clone();
        tracing::info!(%room_id, %context, gm = %actor, "Recruitment opened");
        self.persist("create_room", &room_id, self.store.create_room(record))
            .await;
        self.deliver(outbox).await;
        Ok(room_id)
    }

    /// GM と合成参加者だけでゲームを用意し、募集を締め切った状態にする
    pub async fn start_test_game(
        &self,
        context: ContextId,
        actor: PlayerId,
        total_players: usize,
    ) -> Result<RoomId, GameError> {
        let total = total_players.clamp(MIN_PLAYERS, MAX_PLAYERS);

        let (record, players, outbox) = {
            let mut registry = self.registry.lock().await;
            if let Some(existing) = registry.by_context(&context)
                && existing.status != RoomStatus::Finished
            {
                return Err(GameError::GameInProgress {
                    status: existing.status,
                });
            }

            let mut room = Room::new(
                RoomIdFactory::generate(),
                context.clone(),
                actor.clone(),
                registry.settings(),
            );
            let names = add_synthetics(&mut room, total - 1);
            room.recruitment_closed = true;

            let mut outbox = Outbox::for_room(&room);
            outbox.to_context(
                context.clone(),
                Notice::DummiesAdded {
                    names,
                    participant_count: room.participants.len(),
                },
            );
            outbox.to_player(
                &actor,
                Notice::AssignmentPrompt {
                    room_id: room.room_id.clone(),
                    participant_count: room.participants.len(),
                },
            );
            let record = RoomRecord {
                id: room.room_id.clone(),
                status: StoredRoomStatus::Recruiting,
                created_at: self.now_millis(),
                field_cards: Vec::new(),
            };
            let players = player_records(&room);
            registry.insert(&context, room);
            (record, players, outbox)
        };

        let room_id = record.id.clone();
        tracing::info!(%room_id, %context, gm = %actor, total, "Test game prepared");
        self.persist("create_room", &room_id, self.store.create_room(record))
            .await;
        self.persist("create_players", &room_id, self.store.create_players(players))
            .await;
        self.deliver(outbox).await;
        Ok(room_id)
    }

    /// 募集中のルームに参加する（再参加は何もしない）
    pub async fn join(&self, room_id: RoomId, actor: PlayerId) -> Result<JoinOutcome, GameError> {
        let mut registry = self.registry.lock().await;
        let room = registry
            .by_room_id_mut(&room_id)
            .ok_or(GameError::RoomNotFound)?;

        if room.status != RoomStatus::Recruiting {
            return Err(GameError::wrong_phase(RoomStatus::Recruiting, room.status));
        }
        if room.is_participant(&actor) {
            return Ok(JoinOutcome::AlreadyJoined {
                participant_count: room.participants.len(),
            });
        }
        if room.recruitment_closed {
            return Err(GameError::RecruitmentClosed);
        }
        if room.remaining_capacity() == 0 {
            return Err(GameError::CapacityExceeded {
                limit: MAX_PLAYERS,
                current: room.participants.len(),
            });
        }

        room.add_participant(actor.clone());
        let participant_count = room.participants.len();
        tracing::info!(%room_id, player = %actor, participant_count, "Player joined");
        Ok(JoinOutcome::Joined { participant_count })
    }

    /// 合成参加者を追加する（GM のみ）
    pub async fn add_dummies(
        &self,
        context: ContextId,
        actor: PlayerId,
        requested: usize,
    ) -> Result<Vec<PlayerId>, GameError> {
        let (added, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = Self::command_room(&mut registry, &context, &actor)?;
            if room.status != RoomStatus::Recruiting {
                return Err(GameError::wrong_phase(RoomStatus::Recruiting, room.status));
            }
            Self::require_gm(room, &actor)?;
            if room.recruitment_closed {
                return Err(GameError::RecruitmentClosed);
            }

            let count = requested.clamp(1, MAX_DUMMIES_PER_REQUEST);
            if count > room.remaining_capacity() {
                return Err(GameError::CapacityExceeded {
                    limit: MAX_PLAYERS,
                    current: room.participants.len(),
                });
            }

            let before = room.participants.len();
            let names = add_synthetics(room, count);
            let added = room.participants[before..].to_vec();

            let mut outbox = Outbox::for_room(room);
            outbox.to_context(
                room.broadcast_target(),
                Notice::DummiesAdded {
                    names,
                    participant_count: room.participants.len(),
                },
            );
            tracing::info!(room_id = %room.room_id, count, "Synthetic participants added");
            (added, outbox)
        };

        self.deliver(outbox).await;
        Ok(added)
    }

    /// 募集を締め切り、参加者を保存して GM に役職配布を促す
    ///
    /// 二度目以降の呼び出しは何もしない。
    pub async fn close_recruitment(
        &self,
        context: ContextId,
        actor: PlayerId,
    ) -> Result<CloseOutcome, GameError> {
        let (room_id, players, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = Self::command_room(&mut registry, &context, &actor)?;
            Self::require_gm(room, &actor)?;
            if room.status != RoomStatus::Recruiting {
                return Err(GameError::wrong_phase(RoomStatus::Recruiting, room.status));
            }
            if room.recruitment_closed {
                tracing::debug!(room_id = %room.room_id, "Recruitment already closed");
                return Ok(CloseOutcome::AlreadyClosed);
            }

            room.recruitment_closed = true;
            let mut outbox = Outbox::for_room(room);
            outbox.to_player(
                &room.gm_id,
                Notice::AssignmentPrompt {
                    room_id: room.room_id.clone(),
                    participant_count: room.participants.len(),
                },
            );
            (room.room_id.clone(), player_records(room), outbox)
        };

        let participant_count = players.len();
        tracing::info!(%room_id, participant_count, "Recruitment closed");
        self.persist("create_players", &room_id, self.store.create_players(players))
            .await;
        self.deliver(outbox).await;
        Ok(CloseOutcome::Closed { participant_count })
    }

    /// ゲームを強制終了する（GM のみ、どのフェーズでも可）
    pub async fn end_game(&self, context: ContextId, actor: PlayerId) -> Result<RoomId, GameError> {
        let (room_id, outbox) = {
            let mut registry = self.registry.lock().await;
            let room = Self::command_room(&mut registry, &context, &actor)?;
            Self::require_gm(room, &actor)?;

            self.scheduler.cancel_all(&room.room_id);
            room.enter(RoomStatus::Finished);
            let mut outbox = Outbox::for_room(room);
            outbox.to_context(room.broadcast_target(), Notice::GameTerminated);
            let room_id = room.room_id.clone();
            registry.remove(&room_id);
            (room_id, outbox)
        };

        tracing::info!(%room_id, gm = %actor, "Game terminated by GM");
        self.persist(
            "update_room_status",
            &room_id,
            self.store
                .update_room_status(&room_id, StoredRoomStatus::Finished),
        )
        .await;
        self.deliver(outbox).await;
        self.forget_room(&room_id);
        Ok(room_id)
    }
}

/// 合成参加者を `count` 人追加し、その表示名を返す
fn add_synthetics(room: &mut Room, count: usize) -> Vec<String> {
    let existing = room.synthetic_count();
    (existing..existing + count)
        .map(|index| {
            room.add_participant(PlayerId::synthetic(&room.room_id, index));
            synthetic_name(index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::MockGameStore;
    use crate::usecase::{
        error::ErrorKind,
        service::test_support::{accepting_store, ctx, pid, service, service_with, silent_notifier},
    };

    #[test]
    fn test_synthetic_name_wraps_with_suffix() {
        // テスト項目: 名簿を一周すると番号付きの名前になる
        assert_eq!(synthetic_name(0), "Taro");
        assert_eq!(synthetic_name(7), "Ren");
        assert_eq!(synthetic_name(8), "Taro1");
    }

    #[tokio::test]
    async fn test_start_game_rejects_second_game_in_context() {
        // テスト項目: 進行中のゲームがあるコンテキストでは新しいゲームを開始できない
        // given (前提条件):
        let service = service();
        service.start_game(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        let result = service.start_game(ctx("group"), pid("other")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GameError::GameInProgress {
                status: RoomStatus::Recruiting
            })
        );
    }

    #[tokio::test]
    async fn test_join_twice_keeps_participant_count() {
        // テスト項目: 同じプレイヤーが二度参加しても参加者数は変わらない
        // given (前提条件):
        let service = service();
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        let first = service.join(room_id.clone(), pid("alice")).await.unwrap();
        let second = service.join(room_id.clone(), pid("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, JoinOutcome::Joined { participant_count: 2 });
        assert_eq!(second, JoinOutcome::AlreadyJoined { participant_count: 2 });
        assert_eq!(service.room(&room_id).await.unwrap().participants.len(), 2);
    }

    #[tokio::test]
    async fn test_join_is_capped_at_eight() {
        // テスト項目: 参加者は 8 人までしか参加できない
        // given (前提条件):
        let service = service();
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();
        service.add_dummies(ctx("group"), pid("gm"), 7).await.unwrap();

        // when (操作):
        let result = service.join(room_id, pid("late")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GameError::CapacityExceeded { limit: 8, current: 8 })
        );
    }

    #[tokio::test]
    async fn test_add_dummies_requires_gm_and_respects_cap() {
        // テスト項目: ダミー追加は GM のみ可能で、上限を超える追加は拒否される
        // given (前提条件):
        let service = service();
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        let by_guest = service.add_dummies(ctx("group"), pid("guest"), 2).await;
        let added = service.add_dummies(ctx("group"), pid("gm"), 3).await.unwrap();
        let too_many = service.add_dummies(ctx("group"), pid("gm"), 5).await;

        // then (期待する結果):
        assert_eq!(by_guest.unwrap_err().kind(), ErrorKind::Unauthorized);
        assert_eq!(added.len(), 3);
        assert!(added.iter().all(PlayerId::is_synthetic));
        assert_eq!(added[0].as_str(), format!("dummy_{room_id}_0"));
        assert_eq!(too_many.unwrap_err().kind(), ErrorKind::Capacity);
        assert_eq!(service.room(&room_id).await.unwrap().participants.len(), 4);
    }

    #[tokio::test]
    async fn test_close_recruitment_twice_persists_once() {
        // テスト項目: 募集締切を二度行っても参加者の保存と配布案内は一度だけ
        // given (前提条件):
        let mut store = accepting_store();
        store.checkpoint();
        store.expect_create_room().returning(|_| Ok(()));
        store.expect_create_players().times(1).returning(|_| Ok(()));
        let mut notifier = silent_notifier();
        notifier.checkpoint();
        notifier.expect_send_to_context().returning(|_, _| Ok(()));
        notifier
            .expect_send_to_player()
            .withf(|_, notice| matches!(notice, Notice::AssignmentPrompt { .. }))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = service_with(Arc::new(store), notifier);
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();
        service.join(room_id.clone(), pid("alice")).await.unwrap();

        // when (操作):
        let first = service.close_recruitment(ctx("group"), pid("gm")).await.unwrap();
        let second = service.close_recruitment(ctx("group"), pid("gm")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, CloseOutcome::Closed { participant_count: 2 });
        assert_eq!(second, CloseOutcome::AlreadyClosed);
    }

    #[tokio::test]
    async fn test_join_after_close_is_rejected() {
        // テスト項目: 募集締切後の参加は拒否される
        // given (前提条件):
        let service = service();
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();
        service.close_recruitment(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        let result = service.join(room_id, pid("alice")).await;

        // then (期待する結果):
        assert_eq!(result, Err(GameError::RecruitmentClosed));
    }

    #[tokio::test]
    async fn test_start_test_game_clamps_total_and_persists_players() {
        // テスト項目: テストゲームは人数を 3〜8 に丸め、参加者を保存する
        // given (前提条件):
        let mut store = MockGameStore::new();
        store.expect_create_room().times(1).returning(|_| Ok(()));
        store
            .expect_create_players()
            .withf(|players| players.len() == 8 && players[1].display_name == "Taro")
            .times(1)
            .returning(|_| Ok(()));
        let service = service_with(Arc::new(store), silent_notifier());

        // when (操作):
        let room_id = service
            .start_test_game(ctx("group"), pid("gm"), 20)
            .await
            .unwrap();

        // then (期待する結果):
        let room = service.room(&room_id).await.unwrap();
        assert_eq!(room.participants.len(), 8);
        assert_eq!(room.synthetic_count(), 7);
        assert!(room.recruitment_closed);
    }

    #[tokio::test]
    async fn test_end_game_removes_room_and_allows_restart() {
        // テスト項目: 強制終了でルームが削除され、同じコンテキストで再開できる
        // given (前提条件):
        let service = service();
        let room_id = service.start_game(ctx("group"), pid("gm")).await.unwrap();

        // when (操作):
        let by_guest = service.end_game(ctx("group"), pid("guest")).await;
        let ended = service.end_game(ctx("group"), pid("gm")).await.unwrap();
        let restarted = service.start_game(ctx("group"), pid("gm")).await;

        // then (期待する結果):
        assert_eq!(by_guest, Err(GameError::NotGameMaster));
        assert_eq!(ended, room_id);
        assert!(service.room(&room_id).await.is_none());
        assert!(restarted.is_ok());
    }

    #[tokio::test]
    async fn test_end_game_without_room_is_not_found() {
        // テスト項目: ルームがなければ強制終了は NotFound
        let service = service();
        let result = service.end_game(ctx("group"), pid("gm")).await;
        assert_eq!(result, Err(GameError::RoomNotFound));
    }
}
