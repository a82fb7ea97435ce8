use std::{env, sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    clock::Clock,
    dispatch,
    error::AppResult,
    models::reminders::ReminderStatus,
    notifier::Notifier,
    queries,
};

const DEFAULT_POLL_SECS: u64 = 60;
const DEFAULT_CLAIM_TIMEOUT_SECS: i64 = 300;

/// Background worker that delivers due reminders. Several instances may run
/// against the same database: each candidate is claimed with a conditional
/// update before dispatch, so a reminder is sent once under normal
/// operation. A claim abandoned by a crashed worker becomes eligible again
/// after the ownership timeout, trading an occasional duplicate delivery for
/// never losing one.
pub struct Scheduler {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    worker_id: String,
    poll_interval: StdDuration,
    claim_timeout: Duration,
}

impl Scheduler {
    pub fn new(
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        poll_interval: StdDuration,
        claim_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            notifier,
            clock,
            worker_id: Uuid::new_v4().to_string(),
            poll_interval,
            claim_timeout,
        }
    }

    /// Intervals from SCHEDULER_POLL_SECS / SCHEDULER_CLAIM_TIMEOUT_SECS,
    /// with defaults of one minute and five minutes.
    pub fn from_env(pool: SqlitePool, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        let poll_secs = env::var("SCHEDULER_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_SECS);
        let claim_timeout_secs = env::var("SCHEDULER_CLAIM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CLAIM_TIMEOUT_SECS);
        Self::new(
            pool,
            notifier,
            clock,
            StdDuration::from_secs(poll_secs),
            Duration::seconds(claim_timeout_secs),
        )
    }

    pub async fn run(self) {
        tracing::info!(
            worker_id = %self.worker_id,
            poll_secs = self.poll_interval.as_secs(),
            "reminder scheduler started"
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            interval.tick().await;
            match self.tick().await {
                Ok(0) => {}
                Ok(dispatched) => {
                    tracing::info!(dispatched, "scheduler pass finished");
                }
                Err(e) => {
                    // Store errors are transient from the scheduler's point
                    // of view; the next pass retries the same scan.
                    tracing::warn!(error = %e, "scheduler pass failed, will retry");
                }
            }
        }
    }

    /// One scan-claim-dispatch pass. Returns how many reminders reached a
    /// terminal status.
    pub async fn tick(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let stale_before = now - self.claim_timeout;
        let candidates = queries::reminders::due_candidates(&self.pool, now, stale_before).await?;

        let mut dispatched = 0;
        for reminder_id in candidates {
            if !queries::reminders::try_claim(
                &self.pool,
                reminder_id,
                &self.worker_id,
                now,
                stale_before,
            )
            .await?
            {
                // Another worker got there first, or the reminder moved on
                continue;
            }

            let reminder = queries::reminders::get_reminder(&self.pool, reminder_id).await?;
            match dispatch::dispatch_reminder(&self.pool, self.notifier.as_ref(), &reminder).await {
                Ok(outcome) => {
                    let recorded = match outcome.status {
                        ReminderStatus::Sent => {
                            queries::reminders::mark_sent(
                                &self.pool,
                                reminder_id,
                                &self.worker_id,
                                self.clock.now(),
                            )
                            .await?
                        }
                        _ => {
                            queries::reminders::mark_failed(
                                &self.pool,
                                reminder_id,
                                &self.worker_id,
                            )
                            .await?
                        }
                    };
                    if recorded {
                        dispatched += 1;
                        tracing::info!(
                            reminder_id,
                            status = ?outcome.status,
                            delivered = outcome.delivered,
                            failed = outcome.failed,
                            "reminder dispatched"
                        );
                    } else {
                        tracing::warn!(reminder_id, "claim lost before completion was recorded");
                    }
                }
                Err(e) => {
                    // Leave the claim in place; it becomes reclaimable after
                    // the ownership timeout and the reminder is retried.
                    tracing::warn!(
                        reminder_id,
                        error = %e,
                        "dispatch errored, reminder will be retried"
                    );
                }
            }
        }
        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invitations::RsvpStatus;
    use crate::models::reminders::{RecipientType, ReminderType};
    use crate::queries::invitations::{create_invitations, record_rsvp};
    use crate::queries::reminders::{cancel_reminder, get_reminder, insert_reminder};
    use crate::test_support::{
        seed_contact, seed_event, seed_user, setup_pool, ManualClock, MockNotifier,
    };
    use chrono::Utc;

    fn test_scheduler(
        pool: SqlitePool,
        notifier: Arc<MockNotifier>,
        clock: Arc<ManualClock>,
    ) -> Scheduler {
        Scheduler::new(
            pool,
            notifier,
            clock,
            StdDuration::from_secs(1),
            Duration::minutes(5),
        )
    }

    #[tokio::test]
    async fn due_reminder_is_dispatched_exactly_once() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();

        let now = Utc::now();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            now + Duration::hours(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = test_scheduler(pool.clone(), notifier.clone(), clock.clone());

        // Not due yet
        assert_eq!(scheduler.tick().await.unwrap(), 0);
        assert_eq!(notifier.sent_count(), 0);

        clock.advance(Duration::hours(2));
        assert_eq!(scheduler.tick().await.unwrap(), 1);
        assert_eq!(notifier.sent_count(), 1);

        let after = get_reminder(&pool, reminder.id).await.unwrap();
        assert_eq!(after.status, ReminderStatus::Sent);
        assert!(after.sent_at.is_some());

        // A later pass must not send again
        clock.advance(Duration::hours(1));
        assert_eq!(scheduler.tick().await.unwrap(), 0);
        assert_eq!(notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn audience_is_resolved_at_dispatch_time() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        let bob = seed_contact(&pool, user_id, "Bob").await;

        let now = Utc::now();
        insert_reminder(
            &pool,
            event_id,
            user_id,
            now + Duration::minutes(30),
            ReminderType::Email,
            RecipientType::AttendingOnly,
            None,
        )
        .await
        .unwrap();

        // Invitations and the RSVP happen after the reminder already exists
        create_invitations(&pool, event_id, user_id, &[alice, bob])
            .await
            .unwrap();
        record_rsvp(&pool, event_id, alice, RsvpStatus::Attending, None, false)
            .await
            .unwrap();

        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = test_scheduler(pool.clone(), notifier.clone(), clock.clone());

        clock.advance(Duration::hours(1));
        assert_eq!(scheduler.tick().await.unwrap(), 1);
        let delivered = notifier.recipients();
        assert_eq!(delivered, vec!["alice@example.com".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_reminders_are_ignored_even_when_due() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();

        let now = Utc::now();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            now - Duration::minutes(10),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();
        cancel_reminder(&pool, reminder.id).await.unwrap();

        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = test_scheduler(pool.clone(), notifier.clone(), clock.clone());

        assert_eq!(scheduler.tick().await.unwrap(), 0);
        assert_eq!(notifier.sent_count(), 0);
        let after = get_reminder(&pool, reminder.id).await.unwrap();
        assert_eq!(after.status, ReminderStatus::Cancelled);
    }

    #[tokio::test]
    async fn total_delivery_failure_marks_failed() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();

        let now = Utc::now();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            now - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        let notifier = Arc::new(MockNotifier::failing_for(&["alice@example.com"]));
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = test_scheduler(pool.clone(), notifier.clone(), clock.clone());

        assert_eq!(scheduler.tick().await.unwrap(), 1);
        let after = get_reminder(&pool, reminder.id).await.unwrap();
        assert_eq!(after.status, ReminderStatus::Failed);
        assert_eq!(after.sent_at, None);
    }

    #[tokio::test]
    async fn stale_claim_is_picked_up_after_the_timeout() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();

        let now = Utc::now();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            now - Duration::minutes(10),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        // A worker that died holding the claim
        sqlx::query(
            "UPDATE event_reminders SET status = 'dispatching', claimed_by = 'dead-worker', claimed_at = ? WHERE id = ?",
        )
        .bind(now - Duration::minutes(30))
        .bind(reminder.id)
        .execute(&pool)
        .await
        .unwrap();

        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(ManualClock::new(now));
        let scheduler = test_scheduler(pool.clone(), notifier.clone(), clock.clone());

        assert_eq!(scheduler.tick().await.unwrap(), 1);
        assert_eq!(notifier.sent_count(), 1);
        let after = get_reminder(&pool, reminder.id).await.unwrap();
        assert_eq!(after.status, ReminderStatus::Sent);
    }
}
