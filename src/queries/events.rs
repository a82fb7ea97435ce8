use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::events::Event,
};

pub async fn insert_event(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    address: &str,
    time: DateTime<Utc>,
) -> AppResult<Event> {
    let result = sqlx::query(
        "INSERT INTO events (name, address, time, user_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(address)
    .bind(time)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Failed to create event: {}", e)))?;

    get_event(pool, result.last_insert_rowid()).await
}

pub async fn get_event(pool: &SqlitePool, event_id: i64) -> AppResult<Event> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
        .bind(event_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to fetch event: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Event not found")))
}

/// Fetch an event only if it belongs to the given user. Events of other
/// users are indistinguishable from missing ones.
pub async fn get_event_for_user(
    pool: &SqlitePool,
    event_id: i64,
    user_id: i64,
) -> AppResult<Event> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ? AND user_id = ?")
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to fetch event: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Event not found")))
}

pub async fn list_events_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Event>> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE user_id = ? ORDER BY time ASC")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to list events: {}", e))
        })
}
