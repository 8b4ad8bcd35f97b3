//! Conversion logic between DTOs and domain/usecase types.

use crate::domain::{ContextId, PlayerId, Room, RoomId, ValueObjectError, VoteTarget};
use crate::infrastructure::dto::http as dto;
use crate::usecase::{GameError, Intent};

// ========================================
// DTO → Intent
// ========================================

fn context(raw: String) -> Result<ContextId, ValueObjectError> {
    ContextId::new(raw)
}

fn player(raw: String) -> Result<PlayerId, ValueObjectError> {
    PlayerId::new(raw)
}

fn room(raw: String) -> Result<RoomId, ValueObjectError> {
    RoomId::new(raw)
}

impl TryFrom<dto::IntentRequest> for Intent {
    type Error = ValueObjectError;

    fn try_from(request: dto::IntentRequest) -> Result<Self, Self::Error> {
        use dto::IntentRequest as R;

        Ok(match request {
            R::StartGame {
                context_id,
                actor_id,
            } => Intent::StartGame {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
            R::StartTestGame {
                context_id,
                actor_id,
                total_players,
            } => Intent::StartTestGame {
                context: context(context_id)?,
                actor: player(actor_id)?,
                total_players,
            },
            R::Join { room_id, actor_id } => Intent::Join {
                room_id: room(room_id)?,
                actor: player(actor_id)?,
            },
            R::AddDummies {
                context_id,
                actor_id,
                count,
            } => Intent::AddDummies {
                context: context(context_id)?,
                actor: player(actor_id)?,
                count,
            },
            R::CloseRecruitment {
                context_id,
                actor_id,
            } => Intent::CloseRecruitment {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
            R::AssignRoles { room_id, actor_id } => Intent::AssignRoles {
                room_id: room(room_id)?,
                actor: player(actor_id)?,
            },
            R::Swap {
                room_id,
                actor_id,
                target_id,
            } => Intent::Swap {
                room_id: room(room_id)?,
                actor: player(actor_id)?,
                target: player(target_id)?,
            },
            R::Divine {
                room_id,
                actor_id,
                target_id,
            } => Intent::Divine {
                room_id: room(room_id)?,
                actor: player(actor_id)?,
                target: player(target_id)?,
            },
            R::Vote {
                room_id,
                actor_id,
                target_id,
            } => Intent::Vote {
                room_id: room(room_id)?,
                actor: player(actor_id)?,
                target: VoteTarget::parse(target_id)?,
            },
            R::EndDiscussion {
                context_id,
                actor_id,
            } => Intent::EndDiscussion {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
            R::ExtendDiscussion {
                context_id,
                actor_id,
            } => Intent::ExtendDiscussion {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
            R::QueryTime {
                context_id,
                actor_id,
            } => Intent::QueryTime {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
            R::ChangeDefaults {
                actor_id,
                night_seconds,
                include_thief,
            } => Intent::ChangeDefaults {
                actor: player(actor_id)?,
                night_seconds,
                include_thief,
            },
            R::ConfigureRoom {
                context_id,
                actor_id,
                night_seconds,
            } => Intent::ConfigureRoom {
                context: context(context_id)?,
                actor: player(actor_id)?,
                night_seconds,
            },
            R::EndGame {
                context_id,
                actor_id,
            } => Intent::EndGame {
                context: context(context_id)?,
                actor: player(actor_id)?,
            },
        })
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Room> for dto::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.room_id.to_string(),
            context_id: room.context_id.as_ref().map(ToString::to_string),
            gm_id: room.gm_id.to_string(),
            status: room.status.to_string(),
            participants: room.participants.iter().map(ToString::to_string).collect(),
            recruitment_closed: room.recruitment_closed,
            night_seconds: room.night_duration().as_secs(),
            include_thief: room.include_thief,
            votes_cast: room.votes.len(),
        }
    }
}

impl From<&GameError> for dto::ErrorResponse {
    fn from(error: &GameError) -> Self {
        Self {
            error: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<&ValueObjectError> for dto::ErrorResponse {
    fn from(error: &ValueObjectError) -> Self {
        Self {
            error: "invalid_request".to_string(),
            message: error.to_string(),
        }
    }
}
