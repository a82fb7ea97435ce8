use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    app_state::AppState,
    error::AppError,
    models::sessions::CurrentUser,
    queries,
};

/// Resolve the `Authorization: Bearer` token to a user and stash it in the
/// request extensions. Sessions are issued elsewhere; an unknown or expired
/// token is simply unauthorized.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing bearer token")))?;

    let user_id = queries::users::user_id_for_token(&state.db_pool, &token)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired session")))?;

    req.extensions_mut().insert(CurrentUser { user_id });
    Ok(next.run(req).await)
}
