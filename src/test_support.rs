use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    clock::Clock,
    models::reminders::{RecipientType, ReminderType},
    notifier::Notifier,
    resolver::Recipient,
};

/// Fresh private in-memory database with the full schema. A single pooled
/// connection so every handle sees the same database.
pub async fn setup_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory database");
    crate::db::init_db(&pool).await.expect("schema");
    pool
}

pub async fn seed_user(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query("INSERT INTO users (first_name, last_name, username, email) VALUES (?, ?, ?, ?)")
        .bind(username)
        .bind("Example")
        .bind(username)
        .bind(format!("{}@example.com", username))
        .execute(pool)
        .await
        .expect("seed user")
        .last_insert_rowid()
}

pub async fn seed_session(pool: &SqlitePool, user_id: i64, token: &str) {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(Utc::now() + Duration::days(1))
        .execute(pool)
        .await
        .expect("seed session");
}

pub async fn seed_contact(pool: &SqlitePool, user_id: i64, first_name: &str) -> i64 {
    sqlx::query(
        "INSERT INTO contacts (user_id, first_name, last_name, email, phone_number) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(first_name)
    .bind("Example")
    .bind(format!("{}@example.com", first_name.to_lowercase()))
    .bind("555-0100")
    .execute(pool)
    .await
    .expect("seed contact")
    .last_insert_rowid()
}

pub async fn seed_event(pool: &SqlitePool, user_id: i64, name: &str) -> i64 {
    sqlx::query("INSERT INTO events (name, address, time, user_id, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(name)
        .bind("1 Main St")
        .bind(Utc::now() + Duration::days(2))
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("seed event")
        .last_insert_rowid()
}

pub async fn seed_reminder(
    pool: &SqlitePool,
    event_id: i64,
    user_id: i64,
    reminder_time: DateTime<Utc>,
) -> i64 {
    crate::queries::reminders::insert_reminder(
        pool,
        event_id,
        user_id,
        reminder_time,
        ReminderType::Notification,
        RecipientType::AllInvitees,
        None,
    )
    .await
    .expect("seed reminder")
    .id
}

/// Scriptable notifier: records every delivery and fails for the configured
/// addresses.
#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<(String, ReminderType, String)>>,
    fail_for: HashSet<String>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(address, _, _)| address.clone())
            .collect()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, _, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        channel: ReminderType,
        _subject: &str,
        body: &str,
    ) -> Result<(), anyhow::Error> {
        let label = recipient.label().to_string();
        if self.fail_for.contains(&label) {
            anyhow::bail!("mock delivery failure for {}", label);
        }
        self.sent
            .lock()
            .unwrap()
            .push((label, channel, body.to_string()));
        Ok(())
    }
}

/// Hand-driven clock for scheduler tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
