//! Contact-form notifications.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::core::models::NewContact;
use crate::errors::PortfolioError;

#[async_trait]
pub trait ContactNotifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    async fn notify(&self, contact: &NewContact) -> Result<(), PortfolioError>;
}

/// Picks the SMTP notifier when a sender account is fully configured.
#[must_use]
pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn ContactNotifier> {
    match (&config.sender_email, &config.sender_password) {
        (Some(sender), Some(password)) => Arc::new(SmtpNotifier {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            sender: sender.clone(),
            password: password.clone(),
        }),
        _ => {
            info!("SMTP sender not configured, contact notifications will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

/// Upper bound on how long a request waits for its notification.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends the notification on its own task and waits for it at most
/// `timeout`. The handler must not return before the send completes: Lambda
/// freezes the process once the response is out. Failures and timeouts are
/// logged and never reach the HTTP caller.
///
/// Returns whether the notification was delivered.
pub async fn deliver_with_timeout(
    notifier: Arc<dyn ContactNotifier>,
    contact: NewContact,
    timeout: Duration,
) -> bool {
    let handle = tokio::spawn(async move { notifier.notify(&contact).await });

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(()))) => true,
        Ok(Ok(Err(e))) => {
            error!("Failed to send contact notification: {}", e);
            false
        }
        Ok(Err(e)) => {
            error!("Contact notification task failed: {}", e);
            false
        }
        Err(_) => {
            warn!(?timeout, "Contact notification timed out");
            false
        }
    }
}

#[must_use]
pub fn notification_subject(contact: &NewContact) -> String {
    format!("New Portfolio Contact: {}", contact.name)
}

#[must_use]
pub fn notification_body(contact: &NewContact) -> String {
    format!(
        "New contact message received:\n\nName: {}\nEmail: {}\nMessage: {}\n\nReceived at: {}\n",
        contact.name,
        contact.email,
        contact.message,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Emails the site owner (the sender account itself) over STARTTLS.
pub struct SmtpNotifier {
    server: String,
    port: u16,
    sender: String,
    password: String,
}

#[async_trait]
impl ContactNotifier for SmtpNotifier {
    async fn notify(&self, contact: &NewContact) -> Result<(), PortfolioError> {
        let mailbox = self
            .sender
            .parse::<lettre::message::Mailbox>()
            .map_err(|e| PortfolioError::Notification(format!("sender address: {e}")))?;

        let message = Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(notification_subject(contact))
            .header(ContentType::TEXT_PLAIN)
            .body(notification_body(contact))
            .map_err(|e| PortfolioError::Notification(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)
            .map_err(|e| PortfolioError::Notification(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| PortfolioError::Notification(e.to_string()))?;

        info!(to = %self.sender, "Contact notification email sent");
        Ok(())
    }
}

/// Stand-in used when no SMTP account is configured.
pub struct LogNotifier;

#[async_trait]
impl ContactNotifier for LogNotifier {
    async fn notify(&self, contact: &NewContact) -> Result<(), PortfolioError> {
        #[cfg(feature = "debug-logs")]
        info!(
            subject = %notification_subject(contact),
            "Contact notification (not emailed):\n{}",
            notification_body(contact)
        );

        #[cfg(not(feature = "debug-logs"))]
        info!(
            subject = %notification_subject(contact),
            "Contact notification not emailed: [... body masked, enable debug-logs feature to view ...]"
        );

        Ok(())
    }
}
