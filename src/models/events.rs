use chrono::{DateTime, Utc};
use serde::Serialize;

/*
id INTEGER PRIMARY KEY AUTOINCREMENT,
name TEXT NOT NULL,
address TEXT NOT NULL,
time TEXT NOT NULL,
user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
created_at TEXT NOT NULL
 */
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub time: DateTime<Utc>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
