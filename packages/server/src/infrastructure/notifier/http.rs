//! HTTP push Notifier
//!
//! 通知を JSON にして送信用エンドポイントへ POST する。チャット文面への
//! 変換は送信先（メッセージングアダプタ）の責務。

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::{ContextId, Notice, Notifier, NotifyError, PlayerId};
use crate::infrastructure::dto::{PushRecipient, PushRequest};

#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn push(&self, request: PushRequest<'_>) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("pushed {} to {}", request.notice.kind(), request.to.id);
            return Ok(());
        }
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(NotifyError::QuotaExceeded),
            StatusCode::BAD_REQUEST => Err(NotifyError::InvalidRecipient(request.to.id.to_string())),
            other => Err(NotifyError::Transport(format!(
                "push endpoint responded with {other}"
            ))),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_to_context(
        &self,
        context: &ContextId,
        notice: &Notice,
    ) -> Result<(), NotifyError> {
        self.push(PushRequest {
            to: PushRecipient::context(context),
            notice,
        })
        .await
    }

    async fn send_to_player(&self, player: &PlayerId, notice: &Notice) -> Result<(), NotifyError> {
        self.push(PushRequest {
            to: PushRecipient::player(player),
            notice,
        })
        .await
    }
}
