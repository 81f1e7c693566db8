use std::sync::Arc;

use tracing::info;

use crate::core::models::NewContact;
use crate::errors::PortfolioError;
use crate::infrastructure::persistence::Storage;
use crate::notify::{ContactNotifier, NOTIFICATION_TIMEOUT, deliver_with_timeout};

/// Persists a validated submission, then sends the notification with a
/// bounded wait. Nothing is sent when the write fails, and a failed
/// notification does not fail the submission.
///
/// # Errors
///
/// Returns an error if the contact could not be stored.
pub async fn submit_contact(
    storage: &Storage,
    notifier: Arc<dyn ContactNotifier>,
    contact: NewContact,
) -> Result<String, PortfolioError> {
    let id = storage.record_contact(contact.clone()).await?;
    info!(contact_id = %id, mode = %storage.mode(), "Contact message stored");

    deliver_with_timeout(notifier, contact, NOTIFICATION_TIMEOUT).await;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::infrastructure::persistence::InMemoryStore;

    struct ChannelNotifier(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl ContactNotifier for ChannelNotifier {
        async fn notify(&self, contact: &NewContact) -> Result<(), PortfolioError> {
            let _ = self.0.send(contact.email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn notification_is_sent_before_submission_returns() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let storage = Storage::new(Arc::new(InMemoryStore::new()));
        let contact = NewContact {
            name: "Ada".into(),
            email: "ada@x.com".into(),
            message: "hi".into(),
        };

        submit_contact(&storage, Arc::new(ChannelNotifier(tx)), contact)
            .await
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), "ada@x.com");
        assert_eq!(storage.contacts().await.unwrap().len(), 1);
    }
}
