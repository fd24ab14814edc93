//! yoco-subscriptions - card payments through Yoco with 30-day subscriptions
//!
//! A small axum service that verifies a tokenised card charge with the Yoco
//! API and, when the charge succeeds for a known user and plan, records a
//! 30-day subscription in Cloud Firestore.
//!
//! # Features
//!
//! - **Gateway**: Yoco charge client with bounded retry on transient failures
//! - **Subscriptions**: Firestore REST store, plus an in-memory store
//! - **HTTP**: verification and lookup endpoints with a uniform JSON envelope
//! - **Middleware**: CORS, security headers, timeouts, request IDs and tracing
//! - **Testing**: in-process scenario harness and a scriptable mock gateway
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yoco_subscriptions::{App, AppContext, ConfigBuilder};
//! use yoco_subscriptions::gateway::YocoClient;
//! use yoco_subscriptions::payments::PaymentsModule;
//! use yoco_subscriptions::subscriptions::InMemorySubscriptionStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     yoco_subscriptions::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let gateway = YocoClient::with_default_config(std::env::var("YOCO_SECRET_KEY")?)?;
//!     let context = AppContext::new(Arc::new(gateway), Arc::new(InMemorySubscriptionStore::new()));
//!
//!     App::new(config, context)
//!         .register_module(PaymentsModule)
//!         .serve()
//!         .await
//! }
//! ```

mod app;
mod config;
mod core;
pub mod cors;
mod error;
pub mod gateway;
pub mod health;
mod http;
mod middleware;
pub mod payments;
pub mod security;
pub mod subscriptions;
pub mod testing;
pub mod timeout;
mod utils;
pub mod validation;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use config::{
    Config, ConfigBuilder, GatewayConfig, LoggingConfig, ServerConfig, StoreBackend, StoreConfig,
};
pub use core::App;
pub use cors::{CorsConfig, CorsConfigBuilder};
pub use error::{AppError, ErrorResponse, Result};
pub use health::{HealthResponse, HealthStatus};
pub use http::{ApiResponse, JsonResponse, RouteModule};
pub use middleware::{MakeRequestUuid, REQUEST_ID_HEADER};
pub use security::SecurityConfig;
pub use timeout::TimeoutConfig;
pub use validation::{ValidatedJson, ValidationError, validate_json};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: log filter (e.g. "info", "yoco_subscriptions=debug")
/// - `LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from the logging section of the configuration
///
/// `RUST_LOG` still wins over the configured level when it is set.
pub fn init_tracing_with_config(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    install_subscriber(env_filter, config.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    // try_init: a second call (tests, embedding) keeps the first subscriber
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
