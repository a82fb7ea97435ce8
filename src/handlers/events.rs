use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::sessions::CurrentUser,
    queries,
};

#[derive(serde::Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventData {
    #[validate(length(min = 1, message = "Event name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Event address cannot be empty"))]
    pub address: String,
    pub time: DateTime<Utc>,
    pub contact_ids: Option<Vec<i64>>,
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(mut payload): Json<CreateEventData>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(anyhow::anyhow!("Invalid event data: {}", e)))?;

    payload.name = payload.name.trim().to_string();
    payload.address = payload.address.trim().to_string();

    let event = queries::events::insert_event(
        &state.db_pool,
        user.user_id,
        &payload.name,
        &payload.address,
        payload.time,
    )
    .await?;

    // Invitations can be sent right away or later through the dedicated route
    let invitations = match payload.contact_ids {
        Some(ref contact_ids) if !contact_ids.is_empty() => {
            queries::invitations::create_invitations(
                &state.db_pool,
                event.id,
                user.user_id,
                contact_ids,
            )
            .await?
        }
        _ => Vec::new(),
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "event": event,
            "invitations": invitations,
        })),
    ))
}

pub async fn get_all_my_events(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let events = queries::events::list_events_for_user(&state.db_pool, user.user_id).await?;
    Ok(Json(events))
}

pub async fn get_event_rsvps(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let event = queries::events::get_event_for_user(&state.db_pool, event_id, user.user_id).await?;
    let stats = queries::invitations::rsvp_stats(&state.db_pool, event.id).await?;
    let invitations = queries::invitations::list_for_event(&state.db_pool, event.id).await?;

    Ok(Json(json!({
        "event": event,
        "stats": stats,
        "invitations": invitations,
    })))
}
