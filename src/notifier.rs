use std::env;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::{models::reminders::ReminderType, resolver::Recipient};

/// Hand-off point to the notification transport. Implementations must be
/// safe to call repeatedly for the same reminder: a scheduler worker that
/// crashed mid-dispatch is retried, so a duplicate delivery is possible and
/// accepted, while a silently dropped one is not.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &Recipient,
        channel: ReminderType,
        subject: &str,
        body: &str,
    ) -> Result<(), anyhow::Error>;
}

/// SMTP-backed notifier for the email channel. The sms and notification
/// channels have no transport wired up in this deployment; they are logged
/// and treated as handed off.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build from SMTP_* environment variables. Returns `None` when
    /// SMTP_SERVER is unset so callers can fall back to log-only delivery.
    pub fn from_env() -> Result<Option<Self>, anyhow::Error> {
        let smtp_server = match env::var("SMTP_SERVER") {
            Ok(server) => server,
            Err(_) => return Ok(None),
        };
        let smtp_port: u16 = env::var("SMTP_PORT")
            .context("Missing SMTP_PORT env var")?
            .parse()
            .context("SMTP_PORT must be a valid u16 integer")?;
        let smtp_username = env::var("SMTP_USERNAME").context("Missing SMTP_USERNAME env var")?;
        let smtp_password = env::var("SMTP_PASSWORD").context("Missing SMTP_PASSWORD env var")?;
        let smtp_from = env::var("SMTP_FROM").context("Missing SMTP_FROM env var")?;

        let from = smtp_from
            .parse::<Mailbox>()
            .context("Invalid SMTP_FROM email address")?;

        let creds = Credentials::new(smtp_username, smtp_password);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_server)
            .context("Failed to create SMTP relay")?
            .port(smtp_port)
            .credentials(creds)
            .build();

        Ok(Some(Self { mailer, from }))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        channel: ReminderType,
        subject: &str,
        body: &str,
    ) -> Result<(), anyhow::Error> {
        match channel {
            ReminderType::Email => {
                let address = recipient
                    .address
                    .as_deref()
                    .ok_or_else(|| anyhow!("Recipient has no email address"))?;
                let to_mailbox = address
                    .trim()
                    .parse::<Mailbox>()
                    .context("Invalid recipient email address")?;

                let email = Message::builder()
                    .from(self.from.clone())
                    .to(to_mailbox)
                    .subject(subject)
                    .header(lettre::message::header::ContentType::TEXT_PLAIN)
                    .body(body.to_string())
                    .context("Failed to build email message")?;

                self.mailer
                    .send(email)
                    .await
                    .map_err(|e| anyhow!("Failed to send email: {}", e))?;
                Ok(())
            }
            ReminderType::Sms | ReminderType::Notification => {
                tracing::info!(
                    recipient = recipient.label(),
                    channel = ?channel,
                    "no transport configured for channel, delivery logged only"
                );
                Ok(())
            }
        }
    }
}

/// Development fallback when SMTP is not configured: every delivery is a log
/// line.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        channel: ReminderType,
        subject: &str,
        _body: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(
            recipient = recipient.label(),
            channel = ?channel,
            subject,
            "delivery logged (no transport configured)"
        );
        Ok(())
    }
}
