//! Notifier trait 定義
//!
//! ゲームの状態遷移に伴う外部メッセージ送信のインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    error::NotifyError,
    notice::Notice,
    value_object::{ContextId, PlayerId},
};

/// Notifier trait
///
/// 送信失敗はゲーム状態を巻き戻さない。呼び出し側はログに残すだけでよい。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// グループ（または 1:1 チャット）全体に送信
    async fn send_to_context(&self, context: &ContextId, notice: &Notice)
    -> Result<(), NotifyError>;

    /// プレイヤー個人に送信
    async fn send_to_player(&self, player: &PlayerId, notice: &Notice) -> Result<(), NotifyError>;
}
