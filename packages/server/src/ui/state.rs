//! Shared application state.

use crate::usecase::GameService;

pub struct AppState {
    /// GameService（全ルームの状態とタイマーを持つ）
    pub service: GameService,
}
