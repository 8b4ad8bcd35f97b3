//! UseCase: 設定変更（既定値とルームごとの夜時間）

use crate::domain::{ContextId, GameSettings, PlayerId, RoomStatus, room::half_of};

use super::{error::GameError, night::validate_night_duration, service::GameService};

impl GameService {
    /// 以後に作られるルームの既定値を変更する
    ///
    /// `include_thief` を省略すると現在の値を引き継ぐ。進行中のルームには影響しない。
    pub async fn change_defaults(
        &self,
        actor: PlayerId,
        night_seconds: u64,
        include_thief: Option<bool>,
    ) -> Result<GameSettings, GameError> {
        let night = validate_night_duration(night_seconds)?;
        let mut registry = self.registry.lock().await;
        let include_thief = include_thief.unwrap_or(registry.settings().include_thief);
        let settings = GameSettings::with_night_duration(night, include_thief);
        registry.update_settings(settings);
        tracing::info!(%actor, night_secs = night_seconds, include_thief, "Default settings changed");
        Ok(settings)
    }

    /// 募集中のルームの夜時間を変更する（GM のみ）
    pub async fn configure_room(
        &self,
        context: ContextId,
        actor: PlayerId,
        night_seconds: u64,
    ) -> Result<(), GameError> {
        let night = validate_night_duration(night_seconds)?;
        let mut registry = self.registry.lock().await;
        let room = Self::command_room(&mut registry, &context, &actor)?;
        Self::require_gm(room, &actor)?;
        if room.status != RoomStatus::Recruiting {
            return Err(GameError::wrong_phase(RoomStatus::Recruiting, room.status));
        }
        room.night_duration = Some(night);
        room.thief_sub_phase_duration = Some(half_of(night));
        tracing::info!(room_id = %room.room_id, night_secs = night_seconds, "Room night duration changed");
        Ok(())
    }

    pub async fn settings(&self) -> GameSettings {
        self.registry.lock().await.settings()
    }
}
