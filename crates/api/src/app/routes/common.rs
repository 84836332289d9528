//! Helpers shared by the controllers.

use stockroom_core::{DomainError, Params, RecordLookup, Validator};

use crate::app::errors::ApiError;

/// Path ids are positive integers; anything else matches no record.
pub fn path_id(raw: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound);
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

pub async fn validate(
    validator: Validator,
    params: &Params,
    lookup: &dyn RecordLookup,
) -> Result<(), ApiError> {
    validator.validate(params, lookup).await?;
    Ok(())
}

// Readers for fields a validator has already accepted.

pub fn text(params: &Params, key: &str) -> Result<String, ApiError> {
    params.text(key).ok_or_else(|| unreadable(key))
}

pub fn integer(params: &Params, key: &str) -> Result<i64, ApiError> {
    params.integer(key).ok_or_else(|| unreadable(key))
}

pub fn number(params: &Params, key: &str) -> Result<f64, ApiError> {
    params.number(key).ok_or_else(|| unreadable(key))
}

/// Optional numeric stock; the fractional part is dropped.
pub fn stock(params: &Params) -> i64 {
    params.number("stock").map_or(0, |s| s.trunc() as i64)
}

fn unreadable(key: &str) -> ApiError {
    ApiError::Domain(DomainError::validation(format!("unreadable parameter: {key}")))
}
