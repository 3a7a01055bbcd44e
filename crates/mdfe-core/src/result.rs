//! Typed outcome of provider (bridge) operations
//!
//! Every public bridge operation returns a [`ProviderResult`]; faults are
//! converted at the boundary and never escape as panics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No error
    #[default]
    None,
    /// Malformed INI or missing required fields
    Validation,
    /// Signing certificate problem
    Certificate,
    /// Engine or transport I/O failure
    Transmission,
    /// Engine call succeeded but the authority refused the request
    AuthorityRejection,
    /// Document distribution feed failure
    Distribution,
    /// Referenced document does not exist
    NotFound,
    /// Operation not available in this build
    NotImplemented,
    /// Unexpected fault
    Internal,
    /// Unclassified
    Unknown,
}

impl ErrorKind {
    /// Stable identifier for logs and metadata
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Validation => "validation",
            Self::Certificate => "certificate",
            Self::Transmission => "transmission",
            Self::AuthorityRejection => "authority_rejection",
            Self::Distribution => "distribution",
            Self::NotFound => "not_found",
            Self::NotImplemented => "not_implemented",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable operation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult<T> {
    success: bool,
    data: Option<T>,
    error: ErrorKind,
    message: Option<String>,
    metadata: Option<IndexMap<String, String>>,
}

impl<T> ProviderResult<T> {
    /// Successful result carrying `data`
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: ErrorKind::None,
            message: None,
            metadata: None,
        }
    }

    /// Failed result.
    ///
    /// `ErrorKind::None` is coerced to `Unknown` and a blank message is
    /// replaced by the kind name, so a failure always classifies and
    /// always explains itself.
    #[must_use]
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        let kind = if kind == ErrorKind::None {
            ErrorKind::Unknown
        } else {
            kind
        };
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("{kind} failure");
        }
        Self {
            success: false,
            data: None,
            error: kind,
            message: Some(message),
            metadata: None,
        }
    }

    /// Copy with one more metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether the operation succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Payload, present on success
    #[inline]
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consume into payload
    #[inline]
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Error classification (`None` on success)
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> ErrorKind {
        self.error
    }

    /// Failure message
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Metadata value by key
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key).map(String::as_str)
    }

    /// All metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> Option<&IndexMap<String, String>> {
        self.metadata.as_ref()
    }

    /// Map the payload, keeping status and metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderResult<U> {
        ProviderResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            message: self.message,
            metadata: self.metadata,
        }
    }
}
