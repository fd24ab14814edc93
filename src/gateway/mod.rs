//! Payment gateway client.
//!
//! Verifies one-time card charges against the Yoco online payments API and
//! fetches existing charges by ID.
//!
//! # Example
//!
//! ```rust,ignore
//! use yoco_subscriptions::gateway::{ChargeRequest, PaymentGateway, YocoClient};
//!
//! let client = YocoClient::with_default_config(secret_key)?;
//! let payment = client.verify_payment(&ChargeRequest {
//!     token: "tok_abc".to_string(),
//!     amount: 49.99,
//!     currency: "ZAR".to_string(),
//!     metadata: None,
//! }).await?;
//! ```

pub mod client;
pub mod error;
pub mod live_client;
pub mod types;

pub use client::PaymentGateway;
pub use error::{GatewayError, GatewayOperation};
pub use live_client::{DEFAULT_API_URL, InvalidSecretKeyError, YocoClient, YocoClientConfig};
pub use types::{
    ChargeRequest, Payment, PaymentMetadata, PaymentStatus, from_minor_units, to_minor_units,
};
