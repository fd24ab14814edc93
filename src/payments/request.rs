use serde::Deserialize;
use validator::Validate;

use crate::gateway::{ChargeRequest, PaymentMetadata};
use crate::validation::ValidationError;

/// Body of `POST /api/payments/verify`.
///
/// Every field is optional at the serde level so a missing field is reported
/// as a validation failure instead of a deserialization error. A zero amount
/// counts as missing. Amounts above one million are refused so the minor-unit
/// conversion stays exact.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(
        required(message = "token is required"),
        length(min = 1, message = "token is required")
    )]
    pub token: Option<String>,

    #[validate(
        required(message = "amount is required"),
        range(
            exclusive_min = 0.0,
            max = 1_000_000.0,
            message = "amount must be greater than 0 and at most 1000000"
        )
    )]
    pub amount: Option<f64>,

    #[validate(
        required(message = "currency is required"),
        length(min = 1, message = "currency is required")
    )]
    pub currency: Option<String>,

    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
}

impl TryFrom<VerifyPaymentRequest> for ChargeRequest {
    type Error = ValidationError;

    fn try_from(request: VerifyPaymentRequest) -> Result<Self, Self::Error> {
        let VerifyPaymentRequest {
            token,
            amount,
            currency,
            metadata,
        } = request;

        match (token, amount, currency) {
            (Some(token), Some(amount), Some(currency)) => Ok(ChargeRequest {
                token,
                amount,
                currency,
                metadata,
            }),
            (token, amount, currency) => {
                let mut error = ValidationError::new("Validation failed");
                if token.is_none() {
                    error = error.with_field("token", "token is required");
                }
                if amount.is_none() {
                    error = error.with_field("amount", "amount is required");
                }
                if currency.is_none() {
                    error = error.with_field("currency", "currency is required");
                }
                Err(error)
            }
        }
    }
}
