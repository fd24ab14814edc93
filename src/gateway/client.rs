//! The gateway seam used by the request flow.

use async_trait::async_trait;

use super::error::GatewayError;
use super::types::{ChargeRequest, Payment};

/// Outbound access to the payment provider.
///
/// Implemented by [`YocoClient`](super::YocoClient) in production and by
/// [`MockGateway`](crate::testing::MockGateway) in tests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge a tokenised card and report the outcome.
    ///
    /// A declined charge that the provider still reports with a 2xx status
    /// comes back as `Ok` with [`PaymentStatus::Failed`](super::PaymentStatus::Failed).
    async fn verify_payment(&self, request: &ChargeRequest) -> Result<Payment, GatewayError>;

    /// Fetch an existing charge by its provider ID.
    async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError>;
}
