use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::reminders::{EventReminder, RecipientType, ReminderStats, ReminderStatus, ReminderType},
};

pub async fn insert_reminder(
    pool: &SqlitePool,
    event_id: i64,
    user_id: i64,
    reminder_time: DateTime<Utc>,
    reminder_type: ReminderType,
    recipient_type: RecipientType,
    custom_message: Option<String>,
) -> AppResult<EventReminder> {
    let result = sqlx::query(
        "INSERT INTO event_reminders \
         (event_id, user_id, reminder_time, reminder_type, status, recipient_type, custom_message, created_at) \
         VALUES (?, ?, ?, ?, 'pending', ?, ?, ?)",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(reminder_time)
    .bind(reminder_type)
    .bind(recipient_type)
    .bind(custom_message)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to create reminder: {}", e))
    })?;

    get_reminder(pool, result.last_insert_rowid()).await
}

pub async fn get_reminder(pool: &SqlitePool, reminder_id: i64) -> AppResult<EventReminder> {
    sqlx::query_as::<_, EventReminder>("SELECT * FROM event_reminders WHERE id = ?")
        .bind(reminder_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to fetch reminder: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder not found")))
}

pub async fn get_reminder_for_user(
    pool: &SqlitePool,
    reminder_id: i64,
    user_id: i64,
) -> AppResult<EventReminder> {
    sqlx::query_as::<_, EventReminder>("SELECT * FROM event_reminders WHERE id = ? AND user_id = ?")
        .bind(reminder_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to fetch reminder: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reminder not found")))
}

pub async fn list_for_event(pool: &SqlitePool, event_id: i64) -> AppResult<Vec<EventReminder>> {
    sqlx::query_as::<_, EventReminder>(
        "SELECT * FROM event_reminders WHERE event_id = ? ORDER BY reminder_time ASC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Failed to list reminders: {}", e)))
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<EventReminder>> {
    sqlx::query_as::<_, EventReminder>(
        "SELECT * FROM event_reminders WHERE user_id = ? ORDER BY reminder_time ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Failed to list reminders: {}", e)))
}

/// Pending reminders due inside the horizon, for the "upcoming" view.
pub async fn list_upcoming(
    pool: &SqlitePool,
    user_id: i64,
    horizon: DateTime<Utc>,
) -> AppResult<Vec<EventReminder>> {
    sqlx::query_as::<_, EventReminder>(
        "SELECT * FROM event_reminders \
         WHERE user_id = ? AND status = 'pending' AND reminder_time <= ? \
         ORDER BY reminder_time ASC",
    )
    .bind(user_id)
    .bind(horizon)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to list upcoming reminders: {}", e))
    })
}

pub async fn stats_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<ReminderStats> {
    let rows: Vec<(ReminderStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM event_reminders WHERE user_id = ? GROUP BY status",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to compute reminder stats: {}", e))
    })?;

    let mut stats = ReminderStats::default();
    for (status, count) in rows {
        stats.total += count;
        match status {
            ReminderStatus::Pending => stats.pending = count,
            ReminderStatus::Dispatching => stats.dispatching = count,
            ReminderStatus::Sent => stats.sent = count,
            ReminderStatus::Failed => stats.failed = count,
            ReminderStatus::Cancelled => stats.cancelled = count,
        }
    }
    Ok(stats)
}

/// Overwrite the mutable fields of a reminder that is still pending. The
/// status guard is part of the statement so a reminder that got claimed or
/// finished in the meantime is left untouched.
pub async fn update_pending(
    pool: &SqlitePool,
    reminder_id: i64,
    user_id: i64,
    reminder_time: DateTime<Utc>,
    reminder_type: ReminderType,
    recipient_type: RecipientType,
    custom_message: Option<String>,
) -> AppResult<EventReminder> {
    let result = sqlx::query(
        "UPDATE event_reminders \
         SET reminder_time = ?, reminder_type = ?, recipient_type = ?, custom_message = ? \
         WHERE id = ? AND user_id = ? AND status = 'pending'",
    )
    .bind(reminder_time)
    .bind(reminder_type)
    .bind(recipient_type)
    .bind(custom_message)
    .bind(reminder_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to update reminder: {}", e))
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::InvalidState(anyhow::anyhow!(
            "Only pending reminders can be updated"
        )));
    }

    get_reminder(pool, reminder_id).await
}

/// Cancel a reminder that has not finished yet. Cancelling twice is a no-op;
/// the handler rejects sent/failed reminders before calling this.
pub async fn cancel_reminder(pool: &SqlitePool, reminder_id: i64) -> AppResult<()> {
    sqlx::query(
        "UPDATE event_reminders \
         SET status = 'cancelled', claimed_by = NULL, claimed_at = NULL \
         WHERE id = ? AND status IN ('pending', 'dispatching')",
    )
    .bind(reminder_id)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to cancel reminder: {}", e))
    })?;
    Ok(())
}

/// Ids of reminders a scheduler pass should try to claim: pending ones whose
/// time has elapsed, plus claims that went stale because a worker died
/// mid-dispatch.
pub async fn due_candidates(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
) -> AppResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT id FROM event_reminders \
         WHERE (status = 'pending' AND reminder_time <= ?) \
            OR (status = 'dispatching' AND claimed_at <= ?) \
         ORDER BY reminder_time ASC",
    )
    .bind(now)
    .bind(stale_before)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to scan due reminders: {}", e))
    })?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Compare-and-set claim of one due reminder. The predicate is re-checked
/// inside the UPDATE, so of several workers racing on the same reminder
/// exactly one sees an affected row; the others skip it on this pass.
pub async fn try_claim(
    pool: &SqlitePool,
    reminder_id: i64,
    worker_id: &str,
    now: DateTime<Utc>,
    stale_before: DateTime<Utc>,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE event_reminders \
         SET status = 'dispatching', claimed_by = ?, claimed_at = ? \
         WHERE id = ? \
           AND ((status = 'pending' AND reminder_time <= ?) \
             OR (status = 'dispatching' AND claimed_at <= ?))",
    )
    .bind(worker_id)
    .bind(now)
    .bind(reminder_id)
    .bind(now)
    .bind(stale_before)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to claim reminder: {}", e))
    })?;
    Ok(result.rows_affected() == 1)
}

/// Record the dispatch outcome for a claim this worker still holds. Returns
/// false when the claim was lost in the meantime (cancelled by the user, or
/// reclaimed after going stale).
pub async fn mark_sent(
    pool: &SqlitePool,
    reminder_id: i64,
    worker_id: &str,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE event_reminders \
         SET status = 'sent', sent_at = ?, claimed_by = NULL, claimed_at = NULL \
         WHERE id = ? AND status = 'dispatching' AND claimed_by = ?",
    )
    .bind(now)
    .bind(reminder_id)
    .bind(worker_id)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to mark reminder sent: {}", e))
    })?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_failed(
    pool: &SqlitePool,
    reminder_id: i64,
    worker_id: &str,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE event_reminders \
         SET status = 'failed', claimed_by = NULL, claimed_at = NULL \
         WHERE id = ? AND status = 'dispatching' AND claimed_by = ?",
    )
    .bind(reminder_id)
    .bind(worker_id)
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to mark reminder failed: {}", e))
    })?;
    Ok(result.rows_affected() == 1)
}

/// Per-recipient delivery failures are diagnostics, never request errors.
pub async fn record_delivery_failure(
    pool: &SqlitePool,
    reminder_id: i64,
    recipient: &str,
    detail: &str,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO delivery_failures (reminder_id, recipient, detail, failed_at) VALUES (?, ?, ?, ?)",
    )
    .bind(reminder_id)
    .bind(recipient)
    .bind(detail)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to record delivery failure: {}", e))
    })?;
    Ok(())
}
