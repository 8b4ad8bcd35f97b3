//! Domain-level error types.

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} exceeds {max} characters")]
    TooLong { kind: &'static str, max: usize },
}

/// 通知（外部メッセージ送信）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// 送信先が不正（合成参加者など）
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// 月間送信上限に達した
    #[error("message quota exceeded")]
    QuotaExceeded,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// 永続化ストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage I/O failure: {0}")]
    Io(String),

    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
