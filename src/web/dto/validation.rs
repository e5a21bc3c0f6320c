//! Validated JSON extraction and field validators.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

/// JSON extractor that runs `validator` rules on the body.
///
/// Malformed JSON is a 400; rule violations are a 422 with per-field details.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;
        Ok(ValidatedJson(value))
    }
}

/// Reject control characters other than line breaks and tabs.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| matches!(c, '\n' | '\r' | '\t');
    if value.chars().any(|c| c.is_control() && !allowed(c)) {
        return Err(ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Reject values that are only whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank").with_message("Must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_control_chars() {
        assert!(no_control_chars("/stock=AAPL").is_ok());
        assert!(no_control_chars("two\nlines\tand tab").is_ok());
        assert!(no_control_chars("nul\x00").is_err());
        assert!(no_control_chars("esc\x1b[2J").is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hi").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t\n").is_err());
    }
}
