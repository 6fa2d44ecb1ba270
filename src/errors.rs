//! Error handling for the election system

/// Result type alias for the election system
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the election system
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying SQLite/sqlx failures
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A candidate already holds this ballot number (active or not)
    #[error("Ballot number {ballot_number} is already registered")]
    DuplicateBallotNumber { ballot_number: i64 },

    /// A voter with this identifier is already registered
    #[error("Voter identifier {identifier} is already registered")]
    DuplicateIdentifier { identifier: String },

    /// No candidate row with this id
    #[error("Candidate {id} not found")]
    CandidateNotFound { id: i64 },

    /// Validation errors
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Voting-specific errors
    #[error("Voting error: {message}")]
    Voting { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new voting error
    pub fn voting(message: impl Into<String>) -> Self {
        Self::Voting {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for uniqueness violations reported by SQLite
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Storage(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            Self::DuplicateBallotNumber { .. } | Self::DuplicateIdentifier { .. } => true,
            _ => false,
        }
    }
}

/// Convenience macros for creating specific error types
#[macro_export]
macro_rules! voting_error {
    ($msg:expr) => {
        $crate::Error::voting($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::voting(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($field:expr, $msg:expr) => {
        $crate::Error::validation($field, $msg)
    };
    ($field:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::Error::validation($field, format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let voting_err = Error::voting("test voting error");
        assert!(matches!(voting_err, Error::Voting { .. }));

        let validation_err = Error::validation("name", "must not be blank");
        assert!(matches!(validation_err, Error::Validation { .. }));
        assert_eq!(
            validation_err.to_string(),
            "Validation failed for name: must not be blank"
        );

        let config_err = Error::configuration("bad value");
        assert!(matches!(config_err, Error::Configuration { .. }));
    }

    #[test]
    fn test_error_macros() {
        let voting_err = voting_error!("tally for candidate {} not updated", 7);
        match voting_err {
            Error::Voting { message } => assert!(message.contains('7')),
            _ => panic!("Expected voting error"),
        }

        let validation_err = validation_error!("ballot_number", "{} is out of range", 5);
        assert!(matches!(validation_err, Error::Validation { .. }));
    }

    #[test]
    fn test_duplicate_errors_count_as_unique_violations() {
        assert!(Error::DuplicateBallotNumber { ballot_number: 10 }.is_unique_violation());
        assert!(
            Error::DuplicateIdentifier {
                identifier: "12345678901".to_string()
            }
            .is_unique_violation()
        );
        assert!(!Error::CandidateNotFound { id: 1 }.is_unique_violation());
    }
}
