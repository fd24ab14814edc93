//! In-memory subscription store.
//!
//! Used by the test suite and by the `memory` store backend for local
//! development. Data is lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::error::{StoreError, StoreOperation};
use super::storage::{SubscriptionStore, ensure_not_empty};
use super::types::{NewSubscription, Subscription, SubscriptionUpdate};

/// In-memory subscription store.
///
/// Wraps data in `Arc` for cheap cloning, so a test can keep a handle while
/// the application owns another.
#[derive(Default, Clone)]
pub struct InMemorySubscriptionStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    records: RwLock<Vec<Record>>,
    next_seq: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    closed: AtomicBool,
}

struct Record {
    seq: usize,
    subscription: Subscription,
}

impl InMemorySubscriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create` calls, including failed ones.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `update` calls (cancel goes through update).
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.inner.update_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored record, in insertion order.
    pub async fn all(&self) -> Vec<Subscription> {
        self.inner
            .records
            .read()
            .await
            .iter()
            .map(|r| r.subscription.clone())
            .collect()
    }

    fn check_writes(&self, operation: StoreOperation) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend(operation, "injected write failure"));
        }
        Ok(())
    }

    fn check_reads(&self, operation: StoreOperation) -> Result<(), StoreError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend(operation, "injected read failure"));
        }
        Ok(())
    }

    async fn for_user_newest_first(&self, user_id: &str) -> Vec<Subscription> {
        let records = self.inner.records.read().await;
        let mut matching: Vec<&Record> = records
            .iter()
            .filter(|r| r.subscription.user_id == user_id)
            .collect();
        matching.sort_by(|a, b| {
            b.subscription
                .created_at
                .cmp(&a.subscription.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        matching.into_iter().map(|r| r.subscription.clone()).collect()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, StoreError> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writes(StoreOperation::Create)?;

        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let stored = subscription.into_subscription(id, Some(now), Some(now));

        self.inner.records.write().await.push(Record {
            seq,
            subscription: stored.clone(),
        });

        Ok(stored)
    }

    async fn get_active_for_user(&self, user_id: &str) -> Result<Option<Subscription>, StoreError> {
        self.check_reads(StoreOperation::Get)?;

        Ok(self
            .for_user_newest_first(user_id)
            .await
            .into_iter()
            .find(Subscription::is_active))
    }

    async fn update(&self, id: &str, update: SubscriptionUpdate) -> Result<(), StoreError> {
        self.inner.update_calls.fetch_add(1, Ordering::SeqCst);
        ensure_not_empty(&update)?;
        self.check_writes(StoreOperation::Update)?;

        let mut records = self.inner.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.subscription.id == id)
            .ok_or_else(|| StoreError::NotFound {
                operation: StoreOperation::Update,
                id: id.to_string(),
            })?;

        update.apply_to(&mut record.subscription);
        record.subscription.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.check_reads(StoreOperation::List)?;
        Ok(self.for_user_newest_first(user_id).await)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Payment, PaymentStatus};
    use crate::subscriptions::SubscriptionStatus;

    fn new_subscription(user_id: &str, plan_id: &str) -> NewSubscription {
        let payment = Payment {
            id: format!("ch_{plan_id}"),
            amount: 49.99,
            currency: "ZAR".to_string(),
            status: PaymentStatus::Successful,
            metadata: None,
        };
        NewSubscription::for_payment(&payment, user_id, plan_id, Utc::now())
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = InMemorySubscriptionStore::new();
        let sub = store.create(new_subscription("u1", "premium")).await.unwrap();

        assert!(!sub.id.is_empty());
        assert!(sub.created_at.is_some());
        assert_eq!(sub.created_at, sub.updated_at);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_active_returns_newest() {
        let store = InMemorySubscriptionStore::new();
        store.create(new_subscription("u1", "basic")).await.unwrap();
        let newest = store.create(new_subscription("u1", "premium")).await.unwrap();
        store.create(new_subscription("u2", "basic")).await.unwrap();

        let found = store.get_active_for_user("u1").await.unwrap().unwrap();
        assert_eq!(found.id, newest.id);
        assert!(store.get_active_for_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_skips_record_in_active_lookup() {
        let store = InMemorySubscriptionStore::new();
        let older = store.create(new_subscription("u1", "basic")).await.unwrap();
        let newer = store.create(new_subscription("u1", "premium")).await.unwrap();

        store.cancel(&newer.id).await.unwrap();

        let found = store.get_active_for_user("u1").await.unwrap().unwrap();
        assert_eq!(found.id, older.id);

        let history = store.list_for_user("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer.id);
        assert_eq!(history[0].status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let store = InMemorySubscriptionStore::new();

        let err = store
            .update("missing", SubscriptionUpdate::status(SubscriptionStatus::Expired))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = store.cancel("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to cancel subscription");

        let err = store.update("missing", SubscriptionUpdate::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate { .. }));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemorySubscriptionStore::new();
        store.fail_writes(true);

        let err = store.create(new_subscription("u1", "basic")).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to create subscription");
        assert_eq!(store.create_calls(), 1);
        assert!(store.all().await.is_empty());

        store.fail_reads(true);
        let err = store.list_for_user("u1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to list subscriptions");
    }

    #[tokio::test]
    async fn test_close() {
        let store = InMemorySubscriptionStore::new();
        assert!(!store.is_closed());
        store.close().await.unwrap();
        assert!(store.is_closed());
    }
}
