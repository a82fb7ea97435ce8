use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::invitations::{EventInvitation, RsvpStats, RsvpStatus},
};

/// Create one pending invitation per contact that is not already invited to
/// the event. Contacts that do not belong to the event owner are skipped, and
/// re-inviting an already invited contact is a no-op on that pair, so the
/// whole call is idempotent per contact.
pub async fn create_invitations(
    pool: &SqlitePool,
    event_id: i64,
    user_id: i64,
    contact_ids: &[i64],
) -> AppResult<Vec<EventInvitation>> {
    let mut tx = pool.begin().await.map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Database transaction failed: {}", e))
    })?;

    let now = Utc::now();
    for contact_id in contact_ids {
        // The unique (event_id, contact_id) index absorbs duplicates; the
        // SELECT keeps foreign contacts out.
        sqlx::query(
            "INSERT OR IGNORE INTO event_invitations (event_id, contact_id, rsvp_status, created_at) \
             SELECT ?, id, 'pending', ? FROM contacts WHERE id = ? AND user_id = ?",
        )
        .bind(event_id)
        .bind(now)
        .bind(contact_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to create invitation: {}", e))
        })?;
    }

    tx.commit().await.map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to commit transaction: {}", e))
    })?;

    list_for_event(pool, event_id).await
}

/// Record an RSVP response for an existing invitation. Overwrites any earlier
/// response, last write wins; a response never goes back to pending through
/// this path.
pub async fn record_rsvp(
    pool: &SqlitePool,
    event_id: i64,
    contact_id: i64,
    status: RsvpStatus,
    note: Option<String>,
    manual: bool,
) -> AppResult<EventInvitation> {
    let result = sqlx::query(
        "UPDATE event_invitations \
         SET rsvp_status = ?, responded_at = ?, response_note = ?, is_manual_response = ? \
         WHERE event_id = ? AND contact_id = ?",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(note)
    .bind(manual)
    .bind(event_id)
    .bind(contact_id)
    .execute(pool)
    .await
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Failed to record RSVP: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "No invitation exists for this contact and event"
        )));
    }

    get_invitation(pool, event_id, contact_id).await
}

pub async fn get_invitation(
    pool: &SqlitePool,
    event_id: i64,
    contact_id: i64,
) -> AppResult<EventInvitation> {
    sqlx::query_as::<_, EventInvitation>(
        "SELECT * FROM event_invitations WHERE event_id = ? AND contact_id = ?",
    )
    .bind(event_id)
    .bind(contact_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to fetch invitation: {}", e))
    })?
    .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invitation not found")))
}

pub async fn list_for_event(pool: &SqlitePool, event_id: i64) -> AppResult<Vec<EventInvitation>> {
    sqlx::query_as::<_, EventInvitation>(
        "SELECT * FROM event_invitations WHERE event_id = ? ORDER BY id ASC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to list invitations: {}", e))
    })
}

pub async fn list_for_contact(
    pool: &SqlitePool,
    contact_id: i64,
) -> AppResult<Vec<EventInvitation>> {
    sqlx::query_as::<_, EventInvitation>(
        "SELECT * FROM event_invitations WHERE contact_id = ? ORDER BY id ASC",
    )
    .bind(contact_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to list invitations: {}", e))
    })
}

pub async fn rsvp_stats(pool: &SqlitePool, event_id: i64) -> AppResult<RsvpStats> {
    let rows: Vec<(RsvpStatus, i64)> = sqlx::query_as(
        "SELECT rsvp_status, COUNT(*) FROM event_invitations WHERE event_id = ? GROUP BY rsvp_status",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!("Failed to compute RSVP stats: {}", e))
    })?;

    let mut stats = RsvpStats::default();
    for (status, count) in rows {
        stats.total += count;
        match status {
            RsvpStatus::Pending => stats.pending = count,
            RsvpStatus::Attending => stats.attending = count,
            RsvpStatus::Maybe => stats.maybe = count,
            RsvpStatus::Declined => stats.declined = count,
        }
    }
    Ok(stats)
}
