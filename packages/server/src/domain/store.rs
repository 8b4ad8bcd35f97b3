//! GameStore trait 定義
//!
//! 永続化ストアへのインターフェース。書き込みはすべてベストエフォートで、
//! 失敗してもメモリ上のゲーム進行は止めない。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    error::StoreError,
    role::Role,
    value_object::{PlayerId, RoomId, VoteTarget},
};

/// 永続化されるルームの状態（メモリ上のフェーズより粗い）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredRoomStatus {
    Recruiting,
    InGame,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub status: StoredRoomStatus,
    /// JST Unix milliseconds
    pub created_at: i64,
    /// 誰にも配られなかったカード（配布時に保存）
    #[serde(default)]
    pub field_cards: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub display_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub room_id: RoomId,
    pub voter: PlayerId,
    pub target: VoteTarget,
    /// JST Unix milliseconds
    pub created_at: i64,
}

/// GameStore trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_room(&self, room: RoomRecord) -> Result<(), StoreError>;

    async fn update_room_status(
        &self,
        room_id: &RoomId,
        status: StoredRoomStatus,
    ) -> Result<(), StoreError>;

    async fn update_field_cards(
        &self,
        room_id: &RoomId,
        field_cards: Vec<Role>,
    ) -> Result<(), StoreError>;

    async fn create_players(&self, players: Vec<PlayerRecord>) -> Result<(), StoreError>;

    /// 参加者を保存順で返す
    async fn find_players_by_room(&self, room_id: &RoomId) -> Result<Vec<PlayerRecord>, StoreError>;

    async fn find_room_by_id(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, StoreError>;

    async fn create_vote_record(&self, vote: VoteRecord) -> Result<(), StoreError>;

    async fn update_player_role(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        role: Role,
    ) -> Result<(), StoreError>;
}
