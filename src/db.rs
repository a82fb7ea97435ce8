use anyhow::{Context, Ok, Result};
use dotenvy::dotenv;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::{env, str::FromStr};

pub async fn connect_to_db() -> Result<SqlitePool> {
    let _ = dotenv(); // optional in production, required vars come from the environment
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:life_schedule.db".to_string());
    let options = SqliteConnectOptions::from_str(&db_url)
        .context("Invalid DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(20) // 20 concurrent connections
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    phone_number TEXT
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    time TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS event_invitations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    contact_id INTEGER NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    rsvp_status TEXT NOT NULL DEFAULT 'pending',
    responded_at TEXT,
    response_note TEXT,
    is_manual_response INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (event_id, contact_id)
);

CREATE TABLE IF NOT EXISTS event_reminders (
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
);

CREATE INDEX IF NOT EXISTS idx_event_reminders_due
    ON event_reminders (status, reminder_time);

CREATE TABLE IF NOT EXISTS delivery_failures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reminder_id INTEGER NOT NULL REFERENCES event_reminders(id) ON DELETE CASCADE,
    recipient TEXT NOT NULL,
    detail TEXT NOT NULL,
    failed_at TEXT NOT NULL
);
"#;

pub async fn init_db(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to initialize database schema")?;
    Ok(())
}
