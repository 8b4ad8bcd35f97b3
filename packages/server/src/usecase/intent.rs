//! Pre-classified inbound intents and their dispatch onto `GameService`.

use serde::Serialize;

use crate::domain::{ContextId, PlayerId, Role, RoomId, VoteTarget};

use super::{
    error::GameError,
    lobby::{CloseOutcome, JoinOutcome},
    service::GameService,
    voting::VoteOutcome,
};

/// Default size of a test game when none is given.
const DEFAULT_TEST_GAME_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    StartGame {
        context: ContextId,
        actor: PlayerId,
    },
    StartTestGame {
        context: ContextId,
        actor: PlayerId,
        total_players: Option<usize>,
    },
    Join {
        room_id: RoomId,
        actor: PlayerId,
    },
    AddDummies {
        context: ContextId,
        actor: PlayerId,
        count: Option<usize>,
    },
    CloseRecruitment {
        context: ContextId,
        actor: PlayerId,
    },
    AssignRoles {
        room_id: RoomId,
        actor: PlayerId,
    },
    Swap {
        room_id: RoomId,
        actor: PlayerId,
        target: PlayerId,
    },
    Divine {
        room_id: RoomId,
        actor: PlayerId,
        target: PlayerId,
    },
    Vote {
        room_id: RoomId,
        actor: PlayerId,
        target: VoteTarget,
    },
    EndDiscussion {
        context: ContextId,
        actor: PlayerId,
    },
    ExtendDiscussion {
        context: ContextId,
        actor: PlayerId,
    },
    QueryTime {
        context: ContextId,
        actor: PlayerId,
    },
    ChangeDefaults {
        actor: PlayerId,
        night_seconds: u64,
        include_thief: Option<bool>,
    },
    ConfigureRoom {
        context: ContextId,
        actor: PlayerId,
        night_seconds: u64,
    },
    EndGame {
        context: ContextId,
        actor: PlayerId,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame { .. } => "start_game",
            Self::StartTestGame { .. } => "start_test_game",
            Self::Join { .. } => "join",
            Self::AddDummies { .. } => "add_dummies",
            Self::CloseRecruitment { .. } => "close_recruitment",
            Self::AssignRoles { .. } => "assign_roles",
            Self::Swap { .. } => "swap",
            Self::Divine { .. } => "divine",
            Self::Vote { .. } => "vote",
            Self::EndDiscussion { .. } => "end_discussion",
            Self::ExtendDiscussion { .. } => "extend_discussion",
            Self::QueryTime { .. } => "query_time",
            Self::ChangeDefaults { .. } => "change_defaults",
            Self::ConfigureRoom { .. } => "configure_room",
            Self::EndGame { .. } => "end_game",
        }
    }
}

/// What the actor is told when an intent succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IntentOutcome {
    RoomOpened { room_id: RoomId },
    Joined { participant_count: usize },
    AlreadyJoined { participant_count: usize },
    DummiesAdded { player_ids: Vec<PlayerId> },
    RecruitmentClosed { participant_count: usize },
    AlreadyClosed,
    RolesAssigned { participant_count: usize },
    Swapped { new_role: Role },
    Divined { target_id: PlayerId, is_werewolf: bool },
    VoteAccepted { votes_cast: usize, votes_required: usize, replaced: bool },
    DiscussionEnded { room_id: RoomId },
    DiscussionExtended { remaining_seconds: u64 },
    TimeRemaining { remaining_seconds: u64 },
    DefaultsChanged { night_seconds: u64, include_thief: bool },
    RoomConfigured { night_seconds: u64 },
    GameEnded { room_id: RoomId },
}

impl From<JoinOutcome> for IntentOutcome {
    fn from(outcome: JoinOutcome) -> Self {
        match outcome {
            JoinOutcome::Joined { participant_count } => Self::Joined { participant_count },
            JoinOutcome::AlreadyJoined { participant_count } => {
                Self::AlreadyJoined { participant_count }
            }
        }
    }
}

impl From<CloseOutcome> for IntentOutcome {
    fn from(outcome: CloseOutcome) -> Self {
        match outcome {
            CloseOutcome::Closed { participant_count } => {
                Self::RecruitmentClosed { participant_count }
            }
            CloseOutcome::AlreadyClosed => Self::AlreadyClosed,
        }
    }
}

impl From<VoteOutcome> for IntentOutcome {
    fn from(outcome: VoteOutcome) -> Self {
        Self::VoteAccepted {
            votes_cast: outcome.votes_cast,
            votes_required: outcome.votes_required,
            replaced: outcome.replaced,
        }
    }
}

impl GameService {
    /// Routes one intent to its operation.
    pub async fn handle(&self, intent: Intent) -> Result<IntentOutcome, GameError> {
        match intent {
            Intent::StartGame { context, actor } => self
                .start_game(context, actor)
                .await
                .map(|room_id| IntentOutcome::RoomOpened { room_id }),
            Intent::StartTestGame {
                context,
                actor,
                total_players,
            } => self
                .start_test_game(
                    context,
                    actor,
                    total_players.unwrap_or(DEFAULT_TEST_GAME_SIZE),
                )
                .await
                .map(|room_id| IntentOutcome::RoomOpened { room_id }),
            Intent::Join { room_id, actor } => self.join(room_id, actor).await.map(Into::into),
            Intent::AddDummies {
                context,
                actor,
                count,
            } => self
                .add_dummies(context, actor, count.unwrap_or(1))
                .await
                .map(|player_ids| IntentOutcome::DummiesAdded { player_ids }),
            Intent::CloseRecruitment { context, actor } => {
                self.close_recruitment(context, actor).await.map(Into::into)
            }
            Intent::AssignRoles { room_id, actor } => self
                .assign_roles(room_id, actor)
                .await
                .map(|participant_count| IntentOutcome::RolesAssigned { participant_count }),
            Intent::Swap {
                room_id,
                actor,
                target,
            } => self
                .swap(room_id, actor, target)
                .await
                .map(|new_role| IntentOutcome::Swapped { new_role }),
            Intent::Divine {
                room_id,
                actor,
                target,
            } => self
                .divine(room_id, actor, target.clone())
                .await
                .map(|is_werewolf| IntentOutcome::Divined {
                    target_id: target,
                    is_werewolf,
                }),
            Intent::Vote {
                room_id,
                actor,
                target,
            } => self.vote(room_id, actor, target).await.map(Into::into),
            Intent::EndDiscussion { context, actor } => self
                .end_discussion(context, actor)
                .await
                .map(|room_id| IntentOutcome::DiscussionEnded { room_id }),
            Intent::ExtendDiscussion { context, actor } => self
                .extend_discussion(context, actor)
                .await
                .map(|remaining| IntentOutcome::DiscussionExtended {
                    remaining_seconds: remaining.as_secs(),
                }),
            Intent::QueryTime { context, actor } => self
                .remaining_time(context, actor)
                .await
                .map(|remaining| IntentOutcome::TimeRemaining {
                    remaining_seconds: remaining.as_secs(),
                }),
            Intent::ChangeDefaults {
                actor,
                night_seconds,
                include_thief,
            } => self
                .change_defaults(actor, night_seconds, include_thief)
                .await
                .map(|settings| IntentOutcome::DefaultsChanged {
                    night_seconds: settings.night_duration.as_secs(),
                    include_thief: settings.include_thief,
                }),
            Intent::ConfigureRoom {
                context,
                actor,
                night_seconds,
            } => self
                .configure_room(context, actor, night_seconds)
                .await
                .map(|()| IntentOutcome::RoomConfigured { night_seconds }),
            Intent::EndGame { context, actor } => self
                .end_game(context, actor)
                .await
                .map(|room_id| IntentOutcome::GameEnded { room_id }),
        }
    }
}
