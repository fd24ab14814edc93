//! Cross-Origin Resource Sharing (CORS) middleware.
//!
//! Allows the configured web frontends to call the API with credentials.

mod config;
mod layer;

pub use config::{CorsConfig, CorsConfigBuilder, DEFAULT_ALLOWED_ORIGIN};
pub use layer::build_cors_layer;
