use serde_json::Value;
use std::collections::BTreeMap;

/// A request body that failed to parse or validate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Field name to the messages of its failed rules.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, error: impl Into<String>) -> Self {
        self.fields.entry(field.into()).or_default().push(error.into());
        self
    }

    /// Replace the top-level message, keeping field errors.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub(crate) fn from_errors(errors: &validator::ValidationErrors) -> Self {
        let mut error = Self::new("Validation failed");
        for (field, field_errors) in errors.field_errors() {
            for e in field_errors {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                error = error.with_field(field.to_string(), msg);
            }
        }
        error
    }

    /// Field errors as a JSON object, if there are any.
    pub fn details(&self) -> Option<Value> {
        if self.fields.is_empty() {
            return None;
        }
        serde_json::to_value(&self.fields).ok()
    }
}

impl axum::response::IntoResponse for ValidationError {
    fn into_response(self) -> axum::response::Response {
        crate::error::AppError::from(self).into_response()
    }
}
