//! HTTP API request/response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/intents`. The dispatcher has already classified the
/// chat event; identifiers arrive as raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum IntentRequest {
    StartGame {
        context_id: String,
        actor_id: String,
    },
    StartTestGame {
        context_id: String,
        actor_id: String,
        total_players: Option<usize>,
    },
    Join {
        room_id: String,
        actor_id: String,
    },
    AddDummies {
        context_id: String,
        actor_id: String,
        count: Option<usize>,
    },
    CloseRecruitment {
        context_id: String,
        actor_id: String,
    },
    AssignRoles {
        room_id: String,
        actor_id: String,
    },
    Swap {
        room_id: String,
        actor_id: String,
        target_id: String,
    },
    Divine {
        room_id: String,
        actor_id: String,
        target_id: String,
    },
    /// `target_id` is a player id or `PEACE_VILLAGE`.
    Vote {
        room_id: String,
        actor_id: String,
        target_id: String,
    },
    EndDiscussion {
        context_id: String,
        actor_id: String,
    },
    ExtendDiscussion {
        context_id: String,
        actor_id: String,
    },
    QueryTime {
        context_id: String,
        actor_id: String,
    },
    ChangeDefaults {
        actor_id: String,
        night_seconds: u64,
        include_thief: Option<bool>,
    },
    ConfigureRoom {
        context_id: String,
        actor_id: String,
        night_seconds: u64,
    },
    EndGame {
        context_id: String,
        actor_id: String,
    },
}

/// Rejection body; `error` is the error category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Debug view of a room. Roles are never exposed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub context_id: Option<String>,
    pub gm_id: String,
    pub status: String,
    pub participants: Vec<String>,
    pub recruitment_closed: bool,
    pub night_seconds: u64,
    pub include_thief: bool,
    pub votes_cast: usize,
}
