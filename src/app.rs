use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::gateway::PaymentGateway;
use crate::subscriptions::SubscriptionStore;

/// Application context for dependency injection and shared state
///
/// Holds the payment gateway client and the subscription store as trait
/// objects, so handlers are independent of the concrete backends. Both are
/// read-only after startup.
#[derive(Clone)]
pub struct AppContext {
    pub gateway: Arc<dyn PaymentGateway>,
    pub store: Arc<dyn SubscriptionStore>,
}

impl AppContext {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { gateway, store }
    }

    /// Builder pattern for constructing AppContext
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

/// Builder for AppContext with fluent API
#[must_use = "builder does nothing until you call build()"]
#[derive(Default)]
pub struct AppContextBuilder {
    gateway: Option<Arc<dyn PaymentGateway>>,
    store: Option<Arc<dyn SubscriptionStore>>,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the payment gateway client
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the subscription store
    pub fn with_store(mut self, store: Arc<dyn SubscriptionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the context.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a dependency was not provided.
    pub fn build(self) -> Result<AppContext> {
        let gateway = self
            .gateway
            .ok_or_else(|| AppError::config("payment gateway not configured"))?;
        let store = self
            .store
            .ok_or_else(|| AppError::config("subscription store not configured"))?;

        Ok(AppContext { gateway, store })
    }
}
