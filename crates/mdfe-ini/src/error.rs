//! Error types for the INI codec

/// Structural errors raised while parsing or building INI documents
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
    /// Input was empty or contained only whitespace
    #[error("ini content is empty")]
    EmptyInput,

    /// A key/value line appeared before any `[SECTION]` header
    #[error("line {line} is outside of any section")]
    LineOutsideSection {
        /// 1-based line number in the source text
        line: usize,
    },

    /// A section was created with a blank name
    #[error("section name must not be empty")]
    EmptySectionName,
}

impl IniError {
    /// Create line-outside-section error
    #[inline]
    #[must_use]
    pub fn outside_section(line: usize) -> Self {
        Self::LineOutsideSection { line }
    }
}

/// Result alias for codec operations
pub type Result<T> = std::result::Result<T, IniError>;
