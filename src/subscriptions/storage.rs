//! Storage trait for subscription records.

use async_trait::async_trait;

use super::error::{StoreError, StoreOperation};
use super::types::{NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate};

/// Trait for persisting subscriptions.
///
/// Implementations assign identifiers and `createdAt`/`updatedAt` timestamps.
/// Records are never hard-deleted; they change only through [`update`] and
/// [`cancel`].
///
/// [`update`]: SubscriptionStore::update
/// [`cancel`]: SubscriptionStore::cancel
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persist a new subscription and return it with store-assigned fields.
    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, StoreError>;

    /// The most recently created `active` subscription for a user.
    ///
    /// Uniqueness is not enforced; older active records are ignored.
    async fn get_active_for_user(&self, user_id: &str) -> Result<Option<Subscription>, StoreError>;

    /// Apply a partial update and refresh `updatedAt`.
    async fn update(&self, id: &str, update: SubscriptionUpdate) -> Result<(), StoreError>;

    /// Mark a subscription as cancelled.
    async fn cancel(&self, id: &str) -> Result<(), StoreError> {
        self.update(id, SubscriptionUpdate::status(SubscriptionStatus::Cancelled))
            .await
            .map_err(|e| e.during(StoreOperation::Cancel))
    }

    /// All subscriptions for a user, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;

    /// Release backend resources. Called once on shutdown.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Reject empty updates before they reach a backend.
pub(crate) fn ensure_not_empty(update: &SubscriptionUpdate) -> Result<(), StoreError> {
    if update.is_empty() {
        return Err(StoreError::InvalidUpdate {
            operation: StoreOperation::Update,
            detail: "update contains no fields".to_string(),
        });
    }
    Ok(())
}
