use futures_util::future::join_all;
use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{
        events::Event,
        reminders::{EventReminder, ReminderStatus},
    },
    notifier::Notifier,
    queries, resolver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub status: ReminderStatus,
    pub delivered: usize,
    pub failed: usize,
}

/// Send one claimed reminder to its audience and aggregate the per-recipient
/// results. The audience is resolved here, at dispatch time. Individual
/// failures are recorded as diagnostics and do not keep the reminder from
/// reaching `sent`; only a total failure marks it `failed`. There is no
/// per-recipient retry inside an attempt.
pub async fn dispatch_reminder(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    reminder: &EventReminder,
) -> AppResult<DispatchOutcome> {
    let event = queries::events::get_event(pool, reminder.event_id).await?;
    let recipients = resolver::resolve(
        pool,
        &event,
        reminder.recipient_type,
        reminder.reminder_type,
    )
    .await?;

    if recipients.is_empty() {
        // Nothing to do is not a failure
        tracing::debug!(reminder_id = reminder.id, "reminder has no recipients");
        return Ok(DispatchOutcome {
            status: ReminderStatus::Sent,
            delivered: 0,
            failed: 0,
        });
    }

    let subject = format!("Reminder: {}", event.name);
    let body = render_message(reminder, &event);

    let sends = recipients
        .iter()
        .map(|recipient| notifier.send(recipient, reminder.reminder_type, &subject, &body));
    let results = join_all(sends).await;

    let mut delivered = 0;
    let mut failed = 0;
    for (recipient, result) in recipients.iter().zip(results) {
        match result {
            Ok(()) => delivered += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    reminder_id = reminder.id,
                    recipient = recipient.label(),
                    error = %e,
                    "delivery failed for recipient"
                );
                queries::reminders::record_delivery_failure(
                    pool,
                    reminder.id,
                    recipient.label(),
                    &e.to_string(),
                )
                .await?;
            }
        }
    }

    let status = if delivered == 0 {
        ReminderStatus::Failed
    } else {
        ReminderStatus::Sent
    };
    Ok(DispatchOutcome {
        status,
        delivered,
        failed,
    })
}

fn render_message(reminder: &EventReminder, event: &Event) -> String {
    if let Some(message) = reminder
        .custom_message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
    {
        return message.to_string();
    }
    format!(
        "Don't forget: {} at {} on {}.",
        event.name,
        event.address,
        event.time.format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reminders::{RecipientType, ReminderType};
    use crate::queries::invitations::create_invitations;
    use crate::queries::reminders::insert_reminder;
    use crate::test_support::{seed_contact, seed_event, seed_user, setup_pool, MockNotifier};
    use chrono::{Duration, Utc};

    async fn delivery_failures(pool: &SqlitePool, reminder_id: i64) -> Vec<(String, String)> {
        sqlx::query_as("SELECT recipient, detail FROM delivery_failures WHERE reminder_id = ?")
            .bind(reminder_id)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn all_successful_sends_mark_sent() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        let bob = seed_contact(&pool, user_id, "Bob").await;
        create_invitations(&pool, event_id, user_id, &[alice, bob])
            .await
            .unwrap();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            Utc::now() - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        let notifier = MockNotifier::new();
        let outcome = dispatch_reminder(&pool, &notifier, &reminder).await.unwrap();
        assert_eq!(outcome.status, ReminderStatus::Sent);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(notifier.sent_count(), 2);
    }

    #[tokio::test]
    async fn partial_failure_still_sends_but_is_recorded() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        let bob = seed_contact(&pool, user_id, "Bob").await;
        create_invitations(&pool, event_id, user_id, &[alice, bob])
            .await
            .unwrap();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            Utc::now() - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        let notifier = MockNotifier::failing_for(&["bob@example.com"]);
        let outcome = dispatch_reminder(&pool, &notifier, &reminder).await.unwrap();
        assert_eq!(outcome.status, ReminderStatus::Sent);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, 1);

        let failures = delivery_failures(&pool, reminder.id).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "bob@example.com");
    }

    #[tokio::test]
    async fn total_failure_marks_failed() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            Utc::now() - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            None,
        )
        .await
        .unwrap();

        let notifier = MockNotifier::failing_for(&["alice@example.com"]);
        let outcome = dispatch_reminder(&pool, &notifier, &reminder).await.unwrap();
        assert_eq!(outcome.status, ReminderStatus::Failed);
        assert_eq!(outcome.delivered, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(delivery_failures(&pool, reminder.id).await.len(), 1);
    }

    #[tokio::test]
    async fn zero_recipients_counts_as_sent() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        // No invitations at all
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            Utc::now() - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AttendingOnly,
            None,
        )
        .await
        .unwrap();

        let notifier = MockNotifier::new();
        let outcome = dispatch_reminder(&pool, &notifier, &reminder).await.unwrap();
        assert_eq!(outcome.status, ReminderStatus::Sent);
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn custom_message_overrides_the_template() {
        let pool = setup_pool().await;
        let user_id = seed_user(&pool, "ada").await;
        let event_id = seed_event(&pool, user_id, "Dinner").await;
        let alice = seed_contact(&pool, user_id, "Alice").await;
        create_invitations(&pool, event_id, user_id, &[alice])
            .await
            .unwrap();
        let reminder = insert_reminder(
            &pool,
            event_id,
            user_id,
            Utc::now() - Duration::minutes(1),
            ReminderType::Email,
            RecipientType::AllInvitees,
            Some("Bring a bottle!".to_string()),
        )
        .await
        .unwrap();

        let notifier = MockNotifier::new();
        dispatch_reminder(&pool, &notifier, &reminder).await.unwrap();
        let bodies = notifier.bodies();
        assert_eq!(bodies, vec!["Bring a bottle!".to_string()]);
    }
}
