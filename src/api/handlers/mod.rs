//! Request handlers, one module per resource

pub mod doctors;
pub mod health;
pub mod patients;
pub mod templates;
pub mod transcription;

use crate::api::error::ApiError;
use std::str::FromStr;

/// Parse a path id, reporting the identifier's own validation message
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(ApiError::validation)
}
