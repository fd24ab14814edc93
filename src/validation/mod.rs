//! Request validation using the `validator` crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use yoco_subscriptions::validation::{ValidatedJson, ValidationError};
//! use validator::Validate;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Validate)]
//! struct RenameRequest {
//!     #[validate(length(min = 1))]
//!     name: String,
//! }
//!
//! async fn rename(
//!     payload: Result<ValidatedJson<RenameRequest>, ValidationError>,
//! ) -> yoco_subscriptions::Result<axum::Json<serde_json::Value>> {
//!     let ValidatedJson(req) = payload?;
//!     Ok(axum::Json(serde_json::json!({"name": req.name})))
//! }
//! ```

mod error;
mod extractor;

pub use error::ValidationError;
pub use extractor::{ValidatedJson, validate_json};
pub use validator;
