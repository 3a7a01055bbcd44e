//! Error types for template validation

use mdfe_ini::IniError;

/// Errors raised while loading the template or reading a candidate
#[derive(Debug, Clone, thiserror::Error)]
pub enum TemplateError {
    /// Candidate INI text was empty
    #[error("candidate ini content is empty")]
    EmptyCandidate,

    /// Template or candidate failed to parse
    #[error("ini parse failed: {0}")]
    Ini(#[from] IniError),

    /// A placeholder section name produced an unusable pattern
    #[error("invalid section pattern '{name}': {source}")]
    InvalidPattern {
        /// Template section name
        name: String,
        /// Regex compilation failure
        #[source]
        source: regex::Error,
    },
}

impl TemplateError {
    /// Create invalid-pattern error
    #[must_use]
    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }
}

/// Result alias for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
