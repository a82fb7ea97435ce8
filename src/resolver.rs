use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{
        contacts::Contact,
        events::Event,
        reminders::{RecipientType, ReminderType},
    },
    queries,
};

/// One delivery target computed for a reminder. `address` is already picked
/// for the channel (email address, phone number, or an opaque push
/// reference); a recipient without one still counts as part of the audience
/// and surfaces as a per-recipient delivery failure.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub display_name: String,
    pub address: Option<String>,
}

impl Recipient {
    /// Stable label for logs and failure diagnostics.
    pub fn label(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.display_name)
    }
}

/// Compute the audience for a reminder. This is a live query over the
/// current invitation state, never a snapshot: an RSVP recorded after the
/// reminder was created still moves the contact in or out of the
/// `attending_only` audience.
pub async fn resolve(
    pool: &SqlitePool,
    event: &Event,
    recipient_type: RecipientType,
    channel: ReminderType,
) -> AppResult<Vec<Recipient>> {
    match recipient_type {
        RecipientType::CreatorOnly => {
            // Routes to the owning user directly, not to a contact row
            let owner = queries::users::get_user(pool, event.user_id).await?;
            let address = match channel {
                ReminderType::Email => owner.email.clone(),
                ReminderType::Sms => None,
                ReminderType::Notification => Some(format!("user:{}", owner.id)),
            };
            Ok(vec![Recipient {
                display_name: owner.display_name(),
                address,
            }])
        }
        RecipientType::AllInvitees => {
            let contacts = invited_contacts(pool, event.id, false).await?;
            Ok(to_recipients(contacts, channel))
        }
        RecipientType::AttendingOnly => {
            let contacts = invited_contacts(pool, event.id, true).await?;
            Ok(to_recipients(contacts, channel))
        }
    }
}

async fn invited_contacts(
    pool: &SqlitePool,
    event_id: i64,
    attending_only: bool,
) -> AppResult<Vec<Contact>> {
    let sql = if attending_only {
        "SELECT c.* FROM contacts c \
         JOIN event_invitations i ON i.contact_id = c.id \
         WHERE i.event_id = ? AND i.rsvp_status = 'attending' \
         ORDER BY c.id ASC"
    } else {
        "SELECT c.* FROM contacts c \
         JOIN event_invitations i ON i.contact_id = c.id \
         WHERE i.event_id = ? \
         ORDER BY c.id ASC"
    };
    sqlx::query_as::<_, Contact>(sql)
        .bind(event_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!("Failed to resolve recipients: {}", e))
        })
}

fn to_recipients(contacts: Vec<Contact>, channel: ReminderType) -> Vec<Recipient> {
    contacts
        .into_iter()
        .map(|contact| {
            let address = match channel {
                ReminderType::Email => contact.email.clone(),
                ReminderType::Sms => contact.phone_number.clone(),
                ReminderType::Notification => Some(format!("contact:{}", contact.id)),
            };
            Recipient {
                display_name: contact.display_name(),
                address,
            }
        })
        .collect()
}
