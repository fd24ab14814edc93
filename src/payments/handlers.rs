use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use super::flow::{VerifyOutcome, verify_and_subscribe};
use super::request::VerifyPaymentRequest;
use crate::app::AppContext;
use crate::error::{AppError, Result};
use crate::gateway::{ChargeRequest, Payment};
use crate::http::{ApiResponse, JsonResponse};
use crate::subscriptions::Subscription;
use crate::validation::{ValidatedJson, ValidationError};

const MISSING_PAYMENT_INFO: &str = "Missing required payment information";

/// Body of a processed verification.
///
/// `success` reports that the request was processed; `payment_accepted`
/// reports whether the charge itself succeeded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub data: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    pub payment_accepted: bool,
}

impl From<VerifyOutcome> for VerifyPaymentResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        match outcome {
            VerifyOutcome::Subscribed {
                payment,
                subscription,
            } => Self {
                success: true,
                message: "Payment verified and subscription created successfully".to_string(),
                payment_accepted: payment.is_successful(),
                data: payment,
                subscription: Some(subscription),
            },
            VerifyOutcome::Verified { payment } => Self {
                success: true,
                message: "Payment verified successfully".to_string(),
                payment_accepted: payment.is_successful(),
                data: payment,
                subscription: None,
            },
        }
    }
}

impl IntoResponse for VerifyPaymentResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `POST /api/payments/verify`
pub async fn verify_payment(
    State(ctx): State<AppContext>,
    payload: std::result::Result<ValidatedJson<VerifyPaymentRequest>, ValidationError>,
) -> Result<VerifyPaymentResponse> {
    let ValidatedJson(request) = payload.map_err(|e| e.with_message(MISSING_PAYMENT_INFO))?;
    let charge =
        ChargeRequest::try_from(request).map_err(|e| e.with_message(MISSING_PAYMENT_INFO))?;

    let outcome =
        verify_and_subscribe(ctx.gateway.as_ref(), ctx.store.as_ref(), &charge, Utc::now())
            .await?;

    Ok(outcome.into())
}

/// `GET /api/payments/{payment_id}`
pub async fn get_payment(
    State(ctx): State<AppContext>,
    Path(payment_id): Path<String>,
) -> JsonResponse<Payment> {
    let payment_id = required_param(&payment_id, "Payment ID is required")?;

    let payment = ctx
        .gateway
        .get_payment(payment_id)
        .await
        .map_err(|e| AppError::from(e).with_message("Failed to retrieve payment"))?;

    Ok(ApiResponse::success_with_message(
        payment,
        "Payment retrieved successfully",
    ))
}

/// `GET /api/subscriptions/{user_id}`
///
/// A user without an active subscription is not an error: `data` is `null`.
pub async fn get_user_subscription(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> JsonResponse<Option<Subscription>> {
    let user_id = required_param(&user_id, "User ID is required")?;

    let subscription = ctx
        .store
        .get_active_for_user(user_id)
        .await
        .map_err(|e| AppError::from(e).with_message("Failed to retrieve subscription"))?;

    let message = if subscription.is_some() {
        "Subscription found"
    } else {
        "No active subscription found"
    };

    Ok(ApiResponse::success_with_message(subscription, message))
}

/// `GET /api/subscriptions/{user_id}/history`
pub async fn list_user_subscriptions(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> JsonResponse<Vec<Subscription>> {
    let user_id = required_param(&user_id, "User ID is required")?;

    let subscriptions = ctx
        .store
        .list_for_user(user_id)
        .await
        .map_err(|e| AppError::from(e).with_message("Failed to list subscriptions"))?;

    Ok(ApiResponse::success_with_message(
        subscriptions,
        "Subscriptions retrieved successfully",
    ))
}

fn required_param<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(message));
    }
    Ok(value)
}
