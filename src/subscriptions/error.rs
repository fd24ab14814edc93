//! Subscription store errors.

/// Store operation an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Create,
    Get,
    Update,
    Cancel,
    List,
}

impl StoreOperation {
    /// Message surfaced to API callers.
    #[must_use]
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Create => "Failed to create subscription",
            Self::Get => "Failed to get subscription",
            Self::Update => "Failed to update subscription",
            Self::Cancel => "Failed to cancel subscription",
            Self::List => "Failed to list subscriptions",
        }
    }
}

/// Errors returned by a [`SubscriptionStore`](super::SubscriptionStore).
///
/// `Display` is the caller-facing message; the backend detail is kept apart
/// and exposed through [`StoreError::detail`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("{}", operation.failure_message())]
    Backend {
        operation: StoreOperation,
        detail: String,
    },

    #[error("{}", operation.failure_message())]
    NotFound { operation: StoreOperation, id: String },

    #[error("{}", operation.failure_message())]
    InvalidUpdate {
        operation: StoreOperation,
        detail: String,
    },
}

impl StoreError {
    pub fn backend(operation: StoreOperation, detail: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn operation(&self) -> StoreOperation {
        match self {
            Self::Backend { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::InvalidUpdate { operation, .. } => *operation,
        }
    }

    /// Backend detail for logs and the `error` field of failure responses.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Backend { detail, .. } | Self::InvalidUpdate { detail, .. } => detail.clone(),
            Self::NotFound { id, .. } => format!("subscription {id} not found"),
        }
    }

    /// Re-tag an error raised by a lower-level operation.
    #[must_use]
    pub fn during(self, operation: StoreOperation) -> Self {
        match self {
            Self::Backend { detail, .. } => Self::Backend { operation, detail },
            Self::NotFound { id, .. } => Self::NotFound { operation, id },
            Self::InvalidUpdate { detail, .. } => Self::InvalidUpdate { operation, detail },
        }
    }
}
