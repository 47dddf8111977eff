//! Single-slot notification mailbox per station
//!
//! `put` overwrites any unread message; `take_if_present` removes what it
//! returns in one store operation, so of two racing readers only one
//! gets the message.

use crate::{required_key, EngineError, EngineResult};
use chrono::{DateTime, Utc};
use flood_core::{keys, set_json, KvStore, PendingNotification, StoreError};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Mailbox {
    store: Arc<dyn KvStore>,
}

impl Mailbox {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn put(&self, station: &str, message: &str) -> EngineResult<PendingNotification> {
        self.put_at(station, message, Utc::now()).await
    }

    pub async fn put_at(
        &self,
        station: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<PendingNotification> {
        let key = required_key(station)?;
        if message.trim().is_empty() {
            return Err(EngineError::Validation("message required".into()));
        }
        let pending = PendingNotification {
            message: message.to_string(),
            timestamp: now,
        };
        set_json(&*self.store, &keys::notify(&key), &pending).await?;
        info!(station = %key, "notification queued");
        Ok(pending)
    }

    pub async fn take_if_present(
        &self,
        station: &str,
    ) -> EngineResult<Option<PendingNotification>> {
        let key = required_key(station)?;
        let Some(raw) = self.store.take(&keys::notify(&key)).await? else {
            return Ok(None);
        };
        let pending: PendingNotification = serde_json::from_value(raw).map_err(StoreError::from)?;
        info!(station = %key, "notification delivered");
        Ok(Some(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flood_store::MemoryStore;

    fn mailbox() -> Mailbox {
        Mailbox::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_delivered_at_most_once() {
        let mailbox = mailbox();
        mailbox.put("Gent", "hello").await.unwrap();

        let first = mailbox.take_if_present("Gent").await.unwrap();
        assert_eq!(first.unwrap().message, "hello");
        for _ in 0..3 {
            assert!(mailbox.take_if_present("Gent").await.unwrap().is_none());
        }

        mailbox.put("Gent", "again").await.unwrap();
        assert_eq!(
            mailbox.take_if_present("gent").await.unwrap().unwrap().message,
            "again"
        );
    }

    #[tokio::test]
    async fn test_put_overwrites_unread() {
        let mailbox = mailbox();
        mailbox.put("Doornik", "first").await.unwrap();
        mailbox.put("Doornik", "second").await.unwrap();
        let msg = mailbox.take_if_present("Doornik").await.unwrap().unwrap();
        assert_eq!(msg.message, "second");
        assert!(mailbox.take_if_present("Doornik").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stations_are_separate() {
        let mailbox = mailbox();
        mailbox.put("Gent", "for gent").await.unwrap();
        assert!(mailbox.take_if_present("Antwerpen").await.unwrap().is_none());
        assert!(mailbox.take_if_present("Gent").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_readers_get_one_delivery() {
        let mailbox = mailbox();
        for round in 0..200 {
            mailbox.put("Gent", &format!("round {round}")).await.unwrap();
            let readers: Vec<_> = (0..2)
                .map(|_| {
                    let mailbox = mailbox.clone();
                    tokio::spawn(async move { mailbox.take_if_present("Gent").await })
                })
                .collect();

            let mut delivered = 0;
            for reader in readers {
                if reader.await.unwrap().unwrap().is_some() {
                    delivered += 1;
                }
            }
            assert_eq!(delivered, 1, "round {round}");
        }
    }

    #[tokio::test]
    async fn test_rejects_blank_input() {
        let mailbox = mailbox();
        assert!(matches!(
            mailbox.put("Gent", "   ").await,
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            mailbox.put("", "hi").await,
            Err(EngineError::Validation(_))
        ));
    }
}
