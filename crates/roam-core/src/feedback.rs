//! Append-only visitor feedback.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;

use roam_db::KvStore;
use roam_db::StoreError;
use roam_db::collections::feedbacks::{load_feedbacks, save_feedbacks};
use roam_db::models::Feedback;

use crate::events::{ChangeEvent, EventBus};
use crate::trip::repository::MAX_CONFLICT_RETRIES;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Format a timestamp the way a US-English locale prints a date.
pub fn locale_date(at: &DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

/// Build a feedback record stamped with `now`.
pub fn new_feedback(
    name: &str,
    message: &str,
    now: DateTime<Local>,
) -> Result<Feedback, FeedbackError> {
    if name.trim().is_empty() {
        return Err(FeedbackError::EmptyName);
    }
    if message.trim().is_empty() {
        return Err(FeedbackError::EmptyMessage);
    }
    Ok(Feedback {
        name: name.to_owned(),
        message: message.to_owned(),
        date: locale_date(&now),
        submitted_at: now.with_timezone(&Utc),
    })
}

#[derive(Clone)]
pub struct FeedbackRepository {
    store: Arc<dyn KvStore>,
    events: EventBus,
}

impl FeedbackRepository {
    pub fn new(store: Arc<dyn KvStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Append a feedback entry dated from the system clock.
    pub async fn submit(&self, name: &str, message: &str) -> Result<Feedback, FeedbackError> {
        let feedback = new_feedback(name, message, Local::now())?;

        let mut retries = 0;
        loop {
            let loaded = load_feedbacks(self.store.as_ref()).await?;
            let mut items = loaded.items;
            items.push(feedback.clone());

            match save_feedbacks(self.store.as_ref(), &items, loaded.version).await {
                Ok(_) => break,
                Err(e) if e.is_conflict() && retries < MAX_CONFLICT_RETRIES => {
                    retries += 1;
                    tracing::warn!(retries, error = %e, "feedback write conflicted, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(name = %feedback.name, "feedback submitted");
        self.events.emit(ChangeEvent::FeedbackSubmitted);
        Ok(feedback)
    }

    /// Every entry, oldest first.
    pub async fn list(&self) -> Result<Vec<Feedback>, FeedbackError> {
        Ok(load_feedbacks(self.store.as_ref()).await?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roam_db::store::MemoryStore;

    fn repo() -> FeedbackRepository {
        FeedbackRepository::new(Arc::new(MemoryStore::new()), EventBus::new())
    }

    #[test]
    fn locale_date_has_no_padding() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(locale_date(&at), "3/7/2024");
    }

    #[test]
    fn blank_fields_are_rejected() {
        let now = Local::now();
        assert!(matches!(
            new_feedback(" ", "hi", now),
            Err(FeedbackError::EmptyName)
        ));
        assert!(matches!(
            new_feedback("Asha", "", now),
            Err(FeedbackError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn submissions_are_appended_in_order() {
        let repo = repo();
        repo.submit("Asha", "Loved the Goa plan").await.unwrap();
        repo.submit("Ben", "Add more museums").await.unwrap();

        let all = repo.list().await.unwrap();
        let names: Vec<&str> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Asha", "Ben"]);
        assert!(!all[0].date.is_empty());
    }

    #[tokio::test]
    async fn submit_emits_event() {
        let repo = repo();
        let mut rx = repo.events.subscribe();
        repo.submit("Asha", "hello").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), ChangeEvent::FeedbackSubmitted);
    }
}
