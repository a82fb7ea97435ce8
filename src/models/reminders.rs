use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery channel handed to the notifier for every recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReminderType {
    Email,
    Sms,
    Notification,
}

/// Lifecycle of a reminder. `Dispatching` is the claim state a scheduler
/// worker holds while sending; `Sent`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Dispatching,
    Sent,
    Failed,
    Cancelled,
}

impl ReminderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed | Self::Cancelled)
    }
}

/// Audience policy, evaluated against live invitation state at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecipientType {
    AllInvitees,
    AttendingOnly,
    CreatorOnly,
}

/*
id INTEGER PRIMARY KEY AUTOINCREMENT,
event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
reminder_time TEXT NOT NULL,
reminder_type TEXT NOT NULL DEFAULT 'notification',
status TEXT NOT NULL DEFAULT 'pending',
recipient_type TEXT NOT NULL DEFAULT 'all_invitees',
custom_message TEXT,
sent_at TEXT,
claimed_by TEXT,
claimed_at TEXT,
created_at TEXT NOT NULL
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventReminder {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub reminder_time: DateTime<Utc>,
    pub reminder_type: ReminderType,
    pub status: ReminderStatus,
    pub recipient_type: RecipientType,
    pub custom_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    // Claim bookkeeping, not part of the wire format
    #[serde(skip_serializing)]
    pub claimed_by: Option<String>,
    #[serde(skip_serializing)]
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Reminder counts by status for the reminders overview page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderStats {
    pub total: i64,
    pub pending: i64,
    pub dispatching: i64,
    pub sent: i64,
    pub failed: i64,
    pub cancelled: i64,
}
