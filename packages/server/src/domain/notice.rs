//! Outbound notice payloads.
//!
//! The core never renders chat copy; it emits these structured notices and
//! the transport adapter turns them into platform messages.

use serde::Serialize;

use super::{
    role::{Role, RoleDescription},
    value_object::{PlayerId, RoomId, VoteTarget},
    verdict::Verdict,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Notice {
    RecruitmentOpened {
        room_id: RoomId,
    },
    DummiesAdded {
        names: Vec<String>,
        participant_count: usize,
    },
    /// Sent to the GM once recruitment is closed.
    AssignmentPrompt {
        room_id: RoomId,
        participant_count: usize,
    },
    GameStarted {
        participant_count: usize,
        composition: Vec<(Role, usize)>,
        total_cards: usize,
        field_card_count: usize,
    },
    RoleCard {
        role: Role,
        description: RoleDescription,
    },
    NightFallen {
        night_seconds: u64,
    },
    SwapPrompt {
        room_id: RoomId,
        candidates: Vec<PlayerId>,
    },
    SwapResult {
        target_id: PlayerId,
        new_role: Role,
        description: RoleDescription,
    },
    DivinePrompt {
        room_id: RoomId,
        candidates: Vec<PlayerId>,
    },
    DivinationResult {
        target_id: PlayerId,
        is_werewolf: bool,
    },
    DayBegan {
        discussion_seconds: u64,
    },
    Countdown {
        remaining_seconds: u64,
    },
    DiscussionExtended {
        remaining_seconds: u64,
    },
    DiscussionEnded,
    VotingOpened,
    /// Candidates always implicitly include "no-expulsion".
    Ballot {
        room_id: RoomId,
        candidates: Vec<PlayerId>,
    },
    VoteAccepted {
        target: VoteTarget,
    },
    Result {
        verdict: Verdict,
    },
    GameTerminated,
    QuotaExceeded,
}

impl Notice {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RecruitmentOpened { .. } => "recruitment_opened",
            Self::DummiesAdded { .. } => "dummies_added",
            Self::AssignmentPrompt { .. } => "assignment_prompt",
            Self::GameStarted { .. } => "game_started",
            Self::RoleCard { .. } => "role_card",
            Self::NightFallen { .. } => "night_fallen",
            Self::SwapPrompt { .. } => "swap_prompt",
            Self::SwapResult { .. } => "swap_result",
            Self::DivinePrompt { .. } => "divine_prompt",
            Self::DivinationResult { .. } => "divination_result",
            Self::DayBegan { .. } => "day_began",
            Self::Countdown { .. } => "countdown",
            Self::DiscussionExtended { .. } => "discussion_extended",
            Self::DiscussionEnded => "discussion_ended",
            Self::VotingOpened => "voting_opened",
            Self::Ballot { .. } => "ballot",
            Self::VoteAccepted { .. } => "vote_accepted",
            Self::Result { .. } => "result",
            Self::GameTerminated => "game_terminated",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }
}
