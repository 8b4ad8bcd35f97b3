//! ログ出力だけを行う Notifier
//!
//! 送信先エンドポイントが設定されていない場合に使う。

use async_trait::async_trait;

use crate::domain::{ContextId, Notice, Notifier, NotifyError, PlayerId};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_to_context(
        &self,
        context: &ContextId,
        notice: &Notice,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(notice).unwrap_or_default();
        tracing::info!("[notice -> context {}] {}: {}", context, notice.kind(), payload);
        Ok(())
    }

    async fn send_to_player(&self, player: &PlayerId, notice: &Notice) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(notice).unwrap_or_default();
        tracing::info!("[notice -> player {}] {}: {}", player, notice.kind(), payload);
        Ok(())
    }
}
