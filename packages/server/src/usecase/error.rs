//! UseCase 層のエラー型

use std::fmt;

use thiserror::Error;

use crate::domain::RoomStatus;

/// 拒否理由の分類（応答の出し分けに使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    WrongPhase,
    Capacity,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::WrongPhase => "wrong_phase",
            Self::Capacity => "capacity",
        })
    }
}

/// ゲーム操作のエラー
///
/// どのエラーでもルームの状態は変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no active game was found")]
    RoomNotFound,

    #[error("player '{0}' has no assigned role")]
    RoleNotFound(String),

    #[error("cannot target '{0}'")]
    InvalidTarget(String),

    #[error("only the game master can do this")]
    NotGameMaster,

    #[error("your role cannot do this")]
    NotRoleHolder,

    #[error("not allowed during {actual} (expected {expected})")]
    WrongPhase {
        expected: RoomStatus,
        actual: RoomStatus,
    },

    #[error("a game is already in progress (current: {status})")]
    GameInProgress { status: RoomStatus },

    #[error("recruitment is already closed")]
    RecruitmentClosed,

    #[error("recruitment must be closed first")]
    RecruitmentOpen,

    #[error("you have already acted this night")]
    AlreadyActed,

    #[error("at most {limit} participants are allowed (currently {current})")]
    CapacityExceeded { limit: usize, current: usize },

    #[error("{count} players are not supported (3 to 8 only)")]
    UnsupportedPlayerCount { count: usize },

    #[error("night duration must be between {min} and {max} seconds")]
    InvalidSetting { min: u64, max: u64 },

    #[error("the game could not be restored; it may have ended or the server restarted")]
    RecoveryFailed,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound
            | Self::RoleNotFound(_)
            | Self::InvalidTarget(_)
            | Self::RecoveryFailed => ErrorKind::NotFound,
            Self::NotGameMaster | Self::NotRoleHolder => ErrorKind::Unauthorized,
            Self::WrongPhase { .. }
            | Self::GameInProgress { .. }
            | Self::RecruitmentClosed
            | Self::RecruitmentOpen
            | Self::AlreadyActed => ErrorKind::WrongPhase,
            Self::CapacityExceeded { .. }
            | Self::UnsupportedPlayerCount { .. }
            | Self::InvalidSetting { .. } => ErrorKind::Capacity,
        }
    }

    pub(crate) fn wrong_phase(expected: RoomStatus, actual: RoomStatus) -> Self {
        Self::WrongPhase { expected, actual }
    }
}
