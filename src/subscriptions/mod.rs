//! Subscription records and their persistence.
//!
//! A subscription is created only as a side effect of a successful payment
//! and grants 30 days of access to a plan.

pub mod error;
pub mod firestore;
pub mod memory;
pub mod storage;
pub mod types;

pub use error::{StoreError, StoreOperation};
pub use firestore::{FirestoreConfig, FirestoreSetupError, FirestoreSubscriptionStore};
pub use memory::InMemorySubscriptionStore;
pub use storage::SubscriptionStore;
pub use types::{
    NewSubscription, SUBSCRIPTION_PERIOD_DAYS, Subscription, SubscriptionStatus,
    SubscriptionUpdate,
};
