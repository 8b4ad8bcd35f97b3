//! JSON ファイル GameStore 実装
//!
//! 全記録を 1 つの JSON ファイルに持つ。書き込みのたびに一時ファイルへ
//! 書き出してから rename する。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    GameStore, PlayerId, PlayerRecord, Role, RoomId, RoomRecord, StoreError, StoredRoomStatus,
    VoteRecord,
};

use super::snapshot::StoreSnapshot;

#[derive(Debug, Clone)]
pub struct FileGameStore {
    path: PathBuf,
    snapshot: Arc<Mutex<StoreSnapshot>>,
}

impl FileGameStore {
    /// ファイルが無ければ空のストアとして開く
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!("game store opened at {}", path.display());
        Ok(Self {
            path,
            snapshot: Arc::new(Mutex::new(snapshot)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 変更を加えてからファイルへ書き出す。失敗したらメモリ上も元に戻す。
    async fn write_with<T>(
        &self,
        apply: impl FnOnce(&mut StoreSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut snapshot = self.snapshot.lock().await;
        let mut next = snapshot.clone();
        let value = apply(&mut next)?;
        self.flush(&next).await?;
        *snapshot = next;
        Ok(value)
    }

    async fn flush(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("game store flushed to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl GameStore for FileGameStore {
    async fn create_room(&self, room: RoomRecord) -> Result<(), StoreError> {
        self.write_with(|s| {
            s.create_room(room);
            Ok(())
        })
        .await
    }

    async fn update_room_status(
        &self,
        room_id: &RoomId,
        status: StoredRoomStatus,
    ) -> Result<(), StoreError> {
        self.write_with(|s| s.update_room_status(room_id, status))
            .await
    }

    async fn update_field_cards(
        &self,
        room_id: &RoomId,
        field_cards: Vec<Role>,
    ) -> Result<(), StoreError> {
        self.write_with(|s| s.update_field_cards(room_id, field_cards))
            .await
    }

    async fn create_players(&self, players: Vec<PlayerRecord>) -> Result<(), StoreError> {
        self.write_with(|s| {
            s.create_players(players);
            Ok(())
        })
        .await
    }

    async fn find_players_by_room(&self, room_id: &RoomId) -> Result<Vec<PlayerRecord>, StoreError> {
        Ok(self.snapshot.lock().await.players_by_room(room_id))
    }

    async fn find_room_by_id(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, StoreError> {
        Ok(self.snapshot.lock().await.room_by_id(room_id))
    }

    async fn create_vote_record(&self, vote: VoteRecord) -> Result<(), StoreError> {
        self.write_with(|s| {
            s.create_vote_record(vote);
            Ok(())
        })
        .await
    }

    async fn update_player_role(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        role: Role,
    ) -> Result<(), StoreError> {
        self.write_with(|s| s.update_player_role(room_id, player_id, role))
            .await
    }
}
