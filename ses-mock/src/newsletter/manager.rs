use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::registry::{AddressFilter, AddressRecord, AddressRegistry};

/// Row of the subscriber listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub email_address: String,
    pub category: String,
}

/// Manages newsletter subscriptions
pub struct NewsletterManager {
    registry: Arc<AddressRegistry>,
}

impl NewsletterManager {
    pub fn new(registry: Arc<AddressRegistry>) -> Self {
        Self { registry }
    }

    /// Subscribe `address` to `category`, creating its record when needed
    pub async fn subscribe(&self, address: &str, category: &str) -> Result<AddressRecord> {
        let record = self
            .registry
            .update(address, |r| r.subscribe(category))
            .await?;
        info!("{} subscribed to {}", address, category);
        Ok(record)
    }

    /// Unsubscribe a known address; unknown addresses are `NotFound`
    pub async fn unsubscribe(&self, address: &str) -> Result<AddressRecord> {
        let record = self
            .registry
            .update_existing(address, |r| r.unsubscribe())
            .await?;
        info!("{} unsubscribed", address);
        Ok(record)
    }

    /// Every subscribed address with its category
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let records = self.registry.list(AddressFilter::Subscribed).await?;
        Ok(records
            .into_iter()
            .map(|r| Subscriber {
                email_address: r.address,
                category: r.category,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SesError;
    use crate::storage::MemoryStorage;

    fn manager() -> (NewsletterManager, Arc<AddressRegistry>) {
        let registry = Arc::new(AddressRegistry::new(Arc::new(MemoryStorage::new())));
        (NewsletterManager::new(Arc::clone(&registry)), registry)
    }

    #[tokio::test]
    async fn test_subscribe_and_list() {
        let (manager, _) = manager();

        manager.subscribe("a@example.com", "Tech").await.unwrap();
        manager.subscribe("b@example.com", "Business").await.unwrap();

        let subscribers = manager.list_subscribers().await.unwrap();
        assert_eq!(
            subscribers,
            vec![
                Subscriber {
                    email_address: "a@example.com".to_string(),
                    category: "Tech".to_string(),
                },
                Subscriber {
                    email_address: "b@example.com".to_string(),
                    category: "Business".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_resubscribe_changes_category() {
        let (manager, _) = manager();

        manager.subscribe("a@example.com", "Tech").await.unwrap();
        manager.subscribe("a@example.com", "Sports").await.unwrap();

        let subscribers = manager.list_subscribers().await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].category, "Sports");
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let (manager, registry) = manager();

        manager.subscribe("a@example.com", "Tech").await.unwrap();
        manager.unsubscribe("a@example.com").await.unwrap();

        assert!(manager.list_subscribers().await.unwrap().is_empty());

        // Record survives with the subscription cleared
        let record = registry.find("a@example.com").await.unwrap().unwrap();
        assert!(!record.subscribed);
        assert!(record.category.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_is_not_found() {
        let (manager, _) = manager();
        let result = manager.unsubscribe("nobody@example.com").await;
        assert!(matches!(result, Err(SesError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_subscription_does_not_touch_block_state() {
        let (manager, registry) = manager();

        registry
            .update("a@example.com", |r| r.block("spam"))
            .await
            .unwrap();
        manager.subscribe("a@example.com", "Tech").await.unwrap();
        manager.unsubscribe("a@example.com").await.unwrap();

        let record = registry.find("a@example.com").await.unwrap().unwrap();
        assert!(record.is_blocked());
    }
}
