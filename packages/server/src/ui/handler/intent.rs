//! Intent endpoint: the dispatcher posts one classified chat event per request
//! and relays the outcome (or rejection) back to the actor.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    infrastructure::dto::{ErrorResponse, IntentRequest},
    ui::state::AppState,
    usecase::{ErrorKind, GameError, Intent, IntentOutcome},
};

type Rejection = (StatusCode, Json<ErrorResponse>);

pub fn status_for(error: &GameError) -> StatusCode {
    match error.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::WrongPhase => StatusCode::CONFLICT,
        ErrorKind::Capacity if matches!(error, GameError::InvalidSetting { .. }) => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Capacity => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub async fn post_intent(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IntentRequest>,
) -> Result<Json<IntentOutcome>, Rejection> {
    let intent = Intent::try_from(request).map_err(|e| {
        tracing::warn!("Malformed intent: {}", e);
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e)))
    })?;

    let name = intent.name();
    match state.service.handle(intent).await {
        Ok(outcome) => {
            tracing::debug!(intent = name, ?outcome, "Intent handled");
            Ok(Json(outcome))
        }
        Err(e) => {
            tracing::warn!(intent = name, kind = %e.kind(), "Intent rejected: {}", e);
            Err((status_for(&e), Json(ErrorResponse::from(&e))))
        }
    }
}
