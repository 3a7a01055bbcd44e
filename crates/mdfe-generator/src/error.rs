//! Error types for INI generation

/// Errors raised while mapping a manifest or event into INI
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// A required field was absent or blank
    #[error("missing required field: {field}")]
    MissingField {
        /// Field name
        field: String,
    },

    /// A field was present but unusable
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Event type code is not six digits
    #[error("invalid event code '{code}'")]
    InvalidEventCode {
        /// Code as supplied
        code: String,
    },
}

impl GenerateError {
    /// Create missing-field error
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create invalid-field error
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for generation
pub type Result<T> = std::result::Result<T, GenerateError>;
