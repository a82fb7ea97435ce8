use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RsvpStatus {
    Pending,
    Attending,
    Maybe,
    Declined,
}

/*
id INTEGER PRIMARY KEY AUTOINCREMENT,
event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
rsvp_status TEXT NOT NULL DEFAULT 'pending',
responded_at TEXT,
response_note TEXT,
is_manual_response INTEGER NOT NULL DEFAULT 0,
created_at TEXT NOT NULL,
UNIQUE (event_id, contact_id)
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventInvitation {
    pub id: i64,
    pub event_id: i64,
    pub contact_id: i64,
    pub rsvp_status: RsvpStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub response_note: Option<String>,
    pub is_manual_response: bool,
    pub created_at: DateTime<Utc>,
}

/// RSVP summary for one event, shown on the event detail page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RsvpStats {
    pub total: i64,
    pub attending: i64,
    pub maybe: i64,
    pub declined: i64,
    pub pending: i64,
}
