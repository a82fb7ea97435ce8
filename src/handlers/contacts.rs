use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{app_state::AppState, error::AppResult, models::sessions::CurrentUser, queries};

/// Cross-reference view: every invitation a contact has, across events.
pub async fn get_contact_invitations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(contact_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let contact =
        queries::contacts::get_contact_for_user(&state.db_pool, contact_id, user.user_id).await?;
    let invitations = queries::invitations::list_for_contact(&state.db_pool, contact.id).await?;

    Ok(Json(json!({
        "contact": contact,
        "invitations": invitations,
    })))
}
