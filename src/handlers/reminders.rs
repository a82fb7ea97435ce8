use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::{
        reminders::{RecipientType, ReminderStatus, ReminderType},
        sessions::CurrentUser,
    },
    queries,
};

const DEFAULT_UPCOMING_DAYS: i64 = 7;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderData {
    pub reminder_time: Option<DateTime<Utc>>,
    pub reminder_type: Option<ReminderType>,
    pub recipient_type: Option<RecipientType>,
    pub custom_message: Option<String>,
    pub auto_create: Option<bool>,
}

pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
    Json(payload): Json<CreateReminderData>,
) -> AppResult<impl IntoResponse> {
    let event = queries::events::get_event_for_user(&state.db_pool, event_id, user.user_id).await?;
    let now = Utc::now();

    if payload.auto_create.unwrap_or(false) {
        // Default reminder: a day before the event, or right away when the
        // event is closer than that
        let mut reminder_time = event.time - Duration::hours(24);
        if reminder_time <= now {
            reminder_time = now + Duration::minutes(1);
        }
        let reminder = queries::reminders::insert_reminder(
            &state.db_pool,
            event.id,
            user.user_id,
            reminder_time,
            ReminderType::Notification,
            RecipientType::AllInvitees,
            None,
        )
        .await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Default reminder created",
                "reminders": [reminder],
            })),
        ));
    }

    let reminder_time = payload.reminder_time.ok_or_else(|| {
        AppError::Validation(anyhow::anyhow!(
            "reminderTime is required unless autoCreate is set"
        ))
    })?;
    if reminder_time <= now {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Reminder time must be in the future"
        )));
    }

    let custom_message = payload
        .custom_message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    let reminder = queries::reminders::insert_reminder(
        &state.db_pool,
        event.id,
        user.user_id,
        reminder_time,
        payload.reminder_type.unwrap_or(ReminderType::Notification),
        payload
            .recipient_type
            .unwrap_or(RecipientType::AllInvitees),
        custom_message,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Reminder created",
            "reminder": reminder,
        })),
    ))
}

pub async fn get_event_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(event_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let event = queries::events::get_event_for_user(&state.db_pool, event_id, user.user_id).await?;
    let reminders = queries::reminders::list_for_event(&state.db_pool, event.id).await?;

    Ok(Json(json!({
        "event": event,
        "reminders": reminders,
    })))
}

#[derive(serde::Deserialize)]
pub struct ReminderListQuery {
    // Sent either as a bare `?upcoming` flag or as `?upcoming=true`
    pub upcoming: Option<String>,
    pub days: Option<i64>,
}

pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReminderListQuery>,
) -> AppResult<impl IntoResponse> {
    let upcoming = matches!(query.upcoming.as_deref(), Some("") | Some("true") | Some("1"));
    let reminders = if upcoming {
        let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
        if days <= 0 {
            return Err(AppError::Validation(anyhow::anyhow!(
                "days must be a positive number"
            )));
        }
        let horizon = Utc::now() + Duration::days(days);
        queries::reminders::list_upcoming(&state.db_pool, user.user_id, horizon).await?
    } else {
        queries::reminders::list_for_user(&state.db_pool, user.user_id).await?
    };
    let stats = queries::reminders::stats_for_user(&state.db_pool, user.user_id).await?;

    Ok(Json(json!({
        "reminders": reminders,
        "stats": stats,
    })))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderData {
    pub reminder_time: Option<DateTime<Utc>>,
    pub reminder_type: Option<ReminderType>,
    pub recipient_type: Option<RecipientType>,
    pub custom_message: Option<String>,
}

pub async fn update_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(reminder_id): Path<i64>,
    Json(payload): Json<UpdateReminderData>,
) -> AppResult<impl IntoResponse> {
    let existing =
        queries::reminders::get_reminder_for_user(&state.db_pool, reminder_id, user.user_id)
            .await?;
    if existing.status != ReminderStatus::Pending {
        return Err(AppError::InvalidState(anyhow::anyhow!(
            "Only pending reminders can be updated"
        )));
    }

    let reminder_time = payload.reminder_time.unwrap_or(existing.reminder_time);
    if payload.reminder_time.is_some() && reminder_time <= Utc::now() {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Reminder time must be in the future"
        )));
    }

    let custom_message = match payload.custom_message {
        Some(message) => {
            let trimmed = message.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => existing.custom_message.clone(),
    };

    // The statement re-checks the pending status, so a reminder claimed by
    // the scheduler between our read and this write is not modified
    let reminder = queries::reminders::update_pending(
        &state.db_pool,
        reminder_id,
        user.user_id,
        reminder_time,
        payload.reminder_type.unwrap_or(existing.reminder_type),
        payload.recipient_type.unwrap_or(existing.recipient_type),
        custom_message,
    )
    .await?;

    Ok(Json(json!({
        "message": "Reminder updated",
        "reminder": reminder,
    })))
}

pub async fn cancel_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(reminder_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let existing =
        queries::reminders::get_reminder_for_user(&state.db_pool, reminder_id, user.user_id)
            .await?;

    match existing.status {
        // Cancelling twice is fine
        ReminderStatus::Cancelled => {}
        status if status.is_terminal() => {
            return Err(AppError::InvalidState(anyhow::anyhow!(
                "A reminder that was already sent or failed cannot be cancelled"
            )));
        }
        _ => queries::reminders::cancel_reminder(&state.db_pool, reminder_id).await?,
    }

    Ok(Json(json!({ "message": "Reminder cancelled" })))
}
