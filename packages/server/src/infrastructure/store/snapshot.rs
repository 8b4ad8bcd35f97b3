//! ストアの中身（インメモリ実装とファイル実装で共有）

use serde::{Deserialize, Serialize};

use crate::domain::{
    PlayerId, PlayerRecord, Role, RoomId, RoomRecord, StoreError, StoredRoomStatus, VoteRecord,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub rooms: Vec<RoomRecord>,
    pub players: Vec<PlayerRecord>,
    pub votes: Vec<VoteRecord>,
}

impl StoreSnapshot {
    /// 同じ ID のルームがあれば置き換える
    pub fn create_room(&mut self, room: RoomRecord) {
        match self.rooms.iter_mut().find(|r| r.id == room.id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
    }

    pub fn update_room_status(
        &mut self,
        room_id: &RoomId,
        status: StoredRoomStatus,
    ) -> Result<(), StoreError> {
        let room = self
            .rooms
            .iter_mut()
            .find(|r| r.id == *room_id)
            .ok_or_else(|| StoreError::NotFound(format!("room {room_id}")))?;
        room.status = status;
        Ok(())
    }

    pub fn update_field_cards(
        &mut self,
        room_id: &RoomId,
        field_cards: Vec<Role>,
    ) -> Result<(), StoreError> {
        let room = self
            .rooms
            .iter_mut()
            .find(|r| r.id == *room_id)
            .ok_or_else(|| StoreError::NotFound(format!("room {room_id}")))?;
        room.field_cards = field_cards;
        Ok(())
    }

    /// 同じルーム・プレイヤーの記録があれば置き換える（保存順は維持）
    pub fn create_players(&mut self, players: Vec<PlayerRecord>) {
        for player in players {
            match self
                .players
                .iter_mut()
                .find(|p| p.room_id == player.room_id && p.player_id == player.player_id)
            {
                Some(existing) => *existing = player,
                None => self.players.push(player),
            }
        }
    }

    pub fn players_by_room(&self, room_id: &RoomId) -> Vec<PlayerRecord> {
        self.players
            .iter()
            .filter(|p| p.room_id == *room_id)
            .cloned()
            .collect()
    }

    pub fn room_by_id(&self, room_id: &RoomId) -> Option<RoomRecord> {
        self.rooms.iter().find(|r| r.id == *room_id).cloned()
    }

    pub fn create_vote_record(&mut self, vote: VoteRecord) {
        self.votes.push(vote);
    }

    pub fn update_player_role(
        &mut self,
        room_id: &RoomId,
        player_id: &PlayerId,
        role: Role,
    ) -> Result<(), StoreError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.room_id == *room_id && p.player_id == *player_id)
            .ok_or_else(|| StoreError::NotFound(format!("player {player_id} in room {room_id}")))?;
        player.role = Some(role);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_id() -> RoomId {
        RoomId::new("room_1".to_string()).unwrap()
    }

    fn player(id: &str) -> PlayerRecord {
        PlayerRecord {
            room_id: room_id(),
            player_id: PlayerId::new(id.to_string()).unwrap(),
            display_name: id.to_string(),
            role: None,
        }
    }

    #[test]
    fn test_create_players_keeps_order_and_replaces_duplicates() {
        // テスト項目: 参加者は保存順で返り、同じプレイヤーの再保存は置き換えになる
        // given (前提条件):
        let mut snapshot = StoreSnapshot::default();
        snapshot.create_players(vec![player("b"), player("a")]);

        // when (操作):
        let mut renamed = player("b");
        renamed.display_name = "Bee".to_string();
        snapshot.create_players(vec![renamed, player("c")]);

        // then (期待する結果):
        let players = snapshot.players_by_room(&room_id());
        let ids: Vec<&str> = players.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(players[0].display_name, "Bee");
    }

    #[test]
    fn test_update_missing_records_is_not_found() {
        // テスト項目: 存在しない記録の更新は NotFound
        let mut snapshot = StoreSnapshot::default();
        let status = snapshot.update_room_status(&room_id(), StoredRoomStatus::Finished);
        let role = snapshot.update_player_role(
            &room_id(),
            &PlayerId::new("ghost".to_string()).unwrap(),
            Role::Seer,
        );
        let field = snapshot.update_field_cards(&room_id(), vec![Role::Citizen]);
        assert!(matches!(status, Err(StoreError::NotFound(_))));
        assert!(matches!(field, Err(StoreError::NotFound(_))));
        assert!(matches!(role, Err(StoreError::NotFound(_))));
    }
}
