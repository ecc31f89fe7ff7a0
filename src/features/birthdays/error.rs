//! Error types for the birthdays feature
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Domain error enum split out of the store module

use thiserror::Error;

/// Errors produced by birthday storage, parsing, and scheduling.
#[derive(Debug, Error)]
pub enum BirthdayError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("scheduling failed: {0}")]
    Scheduling(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("persistence failed: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl BirthdayError {
    /// True for errors caused by bad user input rather than a fault in
    /// the bot or its environment. Validation errors are answered with a
    /// format hint instead of an apology.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BirthdayError::InvalidDate(_)
                | BirthdayError::InvalidTime(_)
                | BirthdayError::UnknownTimezone(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BirthdayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_flagged() {
        assert!(BirthdayError::InvalidDate("junk".into()).is_validation());
        assert!(BirthdayError::InvalidTime("25:00".into()).is_validation());
        assert!(BirthdayError::UnknownTimezone("Mars/Olympus".into()).is_validation());
    }

    #[test]
    fn test_operational_errors_are_not_validation() {
        assert!(!BirthdayError::Scheduling("no valid instant".into()).is_validation());
        assert!(!BirthdayError::Delivery("channel gone".into()).is_validation());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!BirthdayError::Persistence(io).is_validation());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = BirthdayError::UnknownTimezone("America/Atlantis".into());
        assert_eq!(err.to_string(), "unknown timezone: America/Atlantis");
    }
}
