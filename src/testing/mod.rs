//! Testing utilities
//!
//! - [`Scenario`]: in-process HTTP requests against an axum router
//! - [`MockGateway`]: scriptable payment gateway
//! - [`test_router`]: the full application wired to test doubles
//! - [`router_with_config`]: the same, with a custom [`Config`]
//!
//! # Example
//!
//! ```rust,ignore
//! use yoco_subscriptions::subscriptions::InMemorySubscriptionStore;
//! use yoco_subscriptions::testing::{self, MockGateway};
//!
//! #[tokio::test]
//! async fn health() {
//!     let app = testing::test_router(MockGateway::new(), InMemorySubscriptionStore::new());
//!     testing::get(app, "/health").execute().await.assert_ok();
//! }
//! ```

mod mock_gateway;
mod scenario;

pub use mock_gateway::MockGateway;
pub use scenario::{Scenario, ScenarioAssert, get, options, post};

use axum::Router;
use std::sync::Arc;

use crate::app::AppContext;
use crate::config::{Config, ConfigBuilder, StoreBackend};
use crate::core::App;
use crate::payments::PaymentsModule;
use crate::subscriptions::InMemorySubscriptionStore;

/// Configuration suitable for in-process tests.
pub fn test_config() -> Config {
    ConfigBuilder::new()
        .with_gateway_secret("sk_test_00000000000000000000")
        .with_store_backend(StoreBackend::Memory)
        .build()
        .expect("test configuration is valid")
}

/// The full application router, with every middleware layer, wired to the
/// given test doubles.
pub fn test_router(gateway: MockGateway, store: InMemorySubscriptionStore) -> Router {
    router_with_config(test_config(), gateway, store)
}

/// Like [`test_router`], with a caller-supplied configuration.
pub fn router_with_config(
    config: Config,
    gateway: MockGateway,
    store: InMemorySubscriptionStore,
) -> Router {
    let context = AppContext::new(Arc::new(gateway), Arc::new(store));
    App::new(config, context)
        .register_module(PaymentsModule)
        .into_router()
}
