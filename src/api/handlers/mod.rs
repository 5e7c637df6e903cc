pub mod health;
pub mod metrics;
pub mod stats;
pub mod trades;

use crate::errors::AppError;

/// Pull a required, non-blank query/body field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("{field} is required"))),
    }
}
