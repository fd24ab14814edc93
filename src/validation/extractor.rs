use axum::{Json, extract::Request};
use serde::Deserialize;
use validator::Validate;

use super::error::ValidationError;

/// Wrapper for validated JSON data
///
/// Deserializes the body as JSON and runs its `Validate` rules. Malformed
/// JSON, a wrong content type and failed rules all reject with a
/// [`ValidationError`].
///
/// Take `Result<ValidatedJson<T>, ValidationError>` in a handler to choose
/// the caller-facing message yourself.
pub struct ValidatedJson<T>(pub T);

impl<T, S> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ValidationError::new("Invalid JSON").with_field("body", e.body_text()))?;

        validate_json(value)
    }
}

/// Validate already-deserialized data and wrap it.
pub fn validate_json<T: Validate>(value: T) -> Result<ValidatedJson<T>, ValidationError> {
    value
        .validate()
        .map_err(|errors| ValidationError::from_errors(&errors))?;
    Ok(ValidatedJson(value))
}
