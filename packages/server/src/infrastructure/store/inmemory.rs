//! InMemory GameStore 実装
//!
//! プロセス内にだけ記録を持つ。再起動で消えるため、復元経路を
//! 試すにはファイル実装を使う。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    GameStore, PlayerId, PlayerRecord, Role, RoomId, RoomRecord, StoreError, StoredRoomStatus,
    VoteRecord,
};

use super::snapshot::StoreSnapshot;

/// インメモリ GameStore 実装
#[derive(Debug, Clone, Default)]
pub struct InMemoryGameStore {
    snapshot: Arc<Mutex<StoreSnapshot>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの投票記録（監査用）
    pub async fn votes(&self) -> Vec<VoteRecord> {
        self.snapshot.lock().await.votes.clone()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn create_room(&self, room: RoomRecord) -> Result<(), StoreError> {
        self.snapshot.lock().await.create_room(room);
        Ok(())
    }

    async fn update_room_status(
        &self,
        room_id: &RoomId,
        status: StoredRoomStatus,
    ) -> Result<(), StoreError> {
        self.snapshot.lock().await.update_room_status(room_id, status)
    }

    async fn update_field_cards(
        &self,
        room_id: &RoomId,
        field_cards: Vec<Role>,
    ) -> Result<(), StoreError> {
        self.snapshot
            .lock()
            .await
            .update_field_cards(room_id, field_cards)
    }

    async fn create_players(&self, players: Vec<PlayerRecord>) -> Result<(), StoreError> {
        self.snapshot.lock().await.create_players(players);
        Ok(())
    }

    async fn find_players_by_room(&self, room_id: &RoomId) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self.snapshot.lock().await.players_by_room(room_id))
    }

    async fn find_room_by_id(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, StoreError> {
        Ok(self.snapshot.lock().await.room_by_id(room_id))
    }

    async fn create_vote_record(&self, vote: VoteRecord) -> Result<(), StoreError> {
        self.snapshot.lock().await.create_vote_record(vote);
        Ok(())
    }

    async fn update_player_role(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        role: Role,
    ) -> Result<(), StoreError> {
        self.snapshot
            .lock()
            .await
            .update_player_role(room_id, player_id, role)
    }
}
