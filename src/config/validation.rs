//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation of client settings (clap handles syntax)
//! - Validate value ranges (timeouts > 0, gas > 0)
//! - Check that polling fits inside the confirmation bound
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientSettings → Result<(), Vec<ValidationError>>
//! - Runs before any network activity

use std::fmt;
use std::time::Duration;

use crate::config::schema::ClientSettings;

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn non_zero(field: &'static str, value: Duration, errors: &mut Vec<ValidationError>) {
    if value.is_zero() {
        errors.push(ValidationError {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
}

/// Check settings for values that would make the client misbehave.
pub fn validate_settings(settings: &ClientSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.max_gas_amount == 0 {
        errors.push(ValidationError {
            field: "max_gas_amount",
            reason: "must be greater than zero".to_string(),
        });
    }
    if settings.expiration_secs == 0 {
        errors.push(ValidationError {
            field: "expiration_secs",
            reason: "must be greater than zero".to_string(),
        });
    }

    non_zero("request_timeout", settings.request_timeout, &mut errors);
    non_zero("confirm_timeout", settings.confirm_timeout, &mut errors);
    non_zero("poll_interval", settings.poll_interval, &mut errors);

    if settings.poll_interval > settings.confirm_timeout {
        errors.push(ValidationError {
            field: "poll_interval",
            reason: format!(
                "{:?} exceeds the confirmation timeout of {:?}",
                settings.poll_interval, settings.confirm_timeout
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
