use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{invitations::RsvpStatus, sessions::CurrentUser},
    queries,
};

#[derive(serde::Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendInvitationsData {
    #[validate(length(min = 1, message = "contactIds cannot be empty"))]
    pub contact_ids: Vec<i64>,
}

pub async fn send_invitations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(payload): Json<SendInvitationsData>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(anyhow::anyhow!("Invalid invitation data: {}", e)))?;

    let event = queries::events::get_event_for_user(&state.db_pool, event_id, user.user_id).await?;
    let invitations = queries::invitations::create_invitations(
        &state.db_pool,
        event.id,
        user.user_id,
        &payload.contact_ids,
    )
    .await?;

    Ok(Json(json!({
        "message": "Invitations sent",
        "invitations": invitations,
    })))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpData {
    pub contact_id: i64,
    pub rsvp_status: RsvpStatus,
    pub response_note: Option<String>,
    pub is_manual_response: Option<bool>,
}

pub async fn update_rsvp(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(payload): Json<RsvpData>,
) -> AppResult<impl IntoResponse> {
    // A response never goes back to pending; that only exists before responding
    if payload.rsvp_status == RsvpStatus::Pending {
        return Err(AppError::Validation(anyhow::anyhow!(
            "rsvpStatus must be attending, maybe or declined"
        )));
    }

    let event = queries::events::get_event_for_user(&state.db_pool, event_id, user.user_id).await?;

    let note = payload
        .response_note
        .map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty());

    let invitation = queries::invitations::record_rsvp(
        &state.db_pool,
        event.id,
        payload.contact_id,
        payload.rsvp_status,
        note,
        payload.is_manual_response.unwrap_or(false),
    )
    .await?;

    Ok(Json(invitation))
}
