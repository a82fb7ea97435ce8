use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::contacts::Contact,
};

pub async fn get_contact_for_user(
    pool: &SqlitePool,
    contact_id: i64,
    user_id: i64,
) -> AppResult<Contact> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ? AND user_id = ?")
        .bind(contact_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to fetch contact: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Contact not found")))
}
