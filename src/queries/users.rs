use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::users::User,
};

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Failed to fetch user: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))
}

/// Resolve a bearer token to a user id. Sessions are issued by the auth
/// service; expired ones are treated as absent.
pub async fn user_id_for_token(pool: &SqlitePool, token: &str) -> AppResult<Option<i64>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
            .bind(token)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                AppError::InternalServerError(anyhow::anyhow!("Failed to look up session: {}", e))
            })?;
    Ok(row.map(|(user_id,)| user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_session, seed_user, setup_pool};
    use chrono::Duration;

    #[tokio::test]
    async fn valid_tokens_resolve_to_their_user() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        seed_session(&pool, user_id, "token-123").await;

        assert_eq!(
            user_id_for_token(&pool, "token-123").await.unwrap(),
            Some(user_id)
        );
        assert_eq!(user_id_for_token(&pool, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_sessions_are_treated_as_absent() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind("stale")
            .bind(user_id)
            .bind(Utc::now() - Duration::hours(1))
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(user_id_for_token(&pool, "stale").await.unwrap(), None);
    }
}
