//! 投票経路専用のルーム復元
//!
//! 投票は個別チャットから届くため、プロセス再起動後にメモリにない
//! ルームへの投票があり得る。永続化された記録から投票フェーズの
//! ルームを最小限組み立て直す。

use std::sync::Arc;

use crate::domain::{
    GameSettings, GameStore, PlayerRecord, RoleAssignment, Room, RoomId, StoredRoomStatus,
};

use super::error::GameError;

pub struct RecoveryAdapter {
    store: Arc<dyn GameStore>,
}

impl RecoveryAdapter {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// 保存済みのルームと参加者から投票フェーズのルームを再構築する
    ///
    /// ルームが存在しない・終了済み・役職記録が 1 件もない場合は失敗する。
    /// GM は最初に保存された実プレイヤー（いなければ最初のプレイヤー）と推定する。
    pub async fn recover(&self, room_id: &RoomId, settings: GameSettings) -> Result<Room, GameError> {
        let record = self.store.find_room_by_id(room_id).await.map_err(|error| {
            tracing::error!(%room_id, %error, "Failed to load room for recovery");
            GameError::RecoveryFailed
        })?;
        let field_cards = match record {
            Some(record) if record.status != StoredRoomStatus::Finished => record.field_cards,
            Some(_) => {
                tracing::warn!(%room_id, "Vote for a finished room");
                return Err(GameError::RecoveryFailed);
            }
            None => {
                tracing::warn!(%room_id, "Vote for an unknown room");
                return Err(GameError::RecoveryFailed);
            }
        };

        let players = self
            .store
            .find_players_by_room(room_id)
            .await
            .map_err(|error| {
                tracing::error!(%room_id, %error, "Failed to load players for recovery");
                GameError::RecoveryFailed
            })?;

        let gm_id = players
            .iter()
            .find(|player| !player.player_id.is_synthetic())
            .or_else(|| players.first())
            .map(|player| player.player_id.clone())
            .ok_or(GameError::RecoveryFailed)?;

        let assignment = RoleAssignment::from_entries(
            players
                .iter()
                .filter_map(|PlayerRecord { player_id, role, .. }| {
                    role.map(|role| (player_id.clone(), role))
                })
                .collect(),
        );
        if assignment.is_empty() {
            tracing::warn!(%room_id, "No recorded roles; cannot recover");
            return Err(GameError::RecoveryFailed);
        }

        let participants = players.into_iter().map(|player| player.player_id).collect();
        let mut room = Room::recovered(
            room_id.clone(),
            gm_id,
            participants,
            assignment,
            settings,
        );
        room.field_cards = field_cards;
        Ok(room)
    }
}
