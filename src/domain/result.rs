//! Result type alias for NextMed

use super::errors::NextMedError;

/// Result type alias for NextMed operations
///
/// # Examples
///
/// ```
/// use nextmed::domain::result::Result;
/// use nextmed::domain::errors::NextMedError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(NextMedError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, NextMedError>;
