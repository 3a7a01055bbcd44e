//! Error types for the engine bridge

use crate::config::ConfigError;
use crate::native::NativeStatus;
use crate::store::StoreError;
use mdfe_core::{ErrorKind, LifecycleError};
use mdfe_generator::GenerateError;
use std::fmt;

/// Native call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeStep {
    /// Engine start-up
    Initialize,
    /// Name / version lookup
    Info,
    /// Document or event load
    Load,
    /// Signature
    Sign,
    /// Schema validation
    Validate,
    /// Document submission
    Submit,
    /// Query by key
    Query,
    /// Query by receipt
    Receipt,
    /// Service status
    Status,
    /// Event submission
    Event,
    /// Distribution feed
    Distribution,
    /// PDF rendering
    Render,
    /// Access-key generation
    Key,
}

impl NativeStep {
    /// Classification of a failure at this step
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::Load | Self::Validate => ErrorKind::Validation,
            Self::Sign => ErrorKind::Certificate,
            Self::Submit | Self::Query | Self::Receipt | Self::Status | Self::Event => {
                ErrorKind::Transmission
            }
            Self::Distribution => ErrorKind::Distribution,
            Self::Initialize | Self::Info | Self::Render | Self::Key => ErrorKind::Internal,
        }
    }

    /// Stable identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Info => "info",
            Self::Load => "load",
            Self::Sign => "sign",
            Self::Validate => "validate",
            Self::Submit => "submit",
            Self::Query => "query",
            Self::Receipt => "receipt",
            Self::Status => "status",
            Self::Event => "event",
            Self::Distribution => "distribution",
            Self::Render => "render",
            Self::Key => "key",
        }
    }
}

impl fmt::Display for NativeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bridge errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Native call returned a non-zero status
    #[error("{step} failed: {message}")]
    Native {
        /// Failing step
        step: NativeStep,
        /// Raw status
        status: NativeStatus,
        /// Engine message, never blank
        message: String,
    },

    /// The authority answered with a refusal code
    #[error("authority rejected the request: {code} - {reason}")]
    Rejected {
        /// `cStat`
        code: String,
        /// `xMotivo`
        reason: String,
        /// Response text
        raw: String,
    },

    /// Pre-submission field checks failed
    #[error("manifest failed validation: {0}")]
    Invalid(String),

    /// Generation failed
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// Illegal lifecycle move
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Configuration could not be provisioned
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persistence collaborator failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Referenced entity is absent
    #[error("{0} not found")]
    NotFound(String),

    /// File access failed
    #[error("{context}: {source}")]
    Io {
        /// What was being accessed
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Blocking task panicked or was cancelled
    #[error("engine task failed: {0}")]
    Join(String),
}

impl EngineError {
    /// Native failure; a blank message falls back to the status code
    #[must_use]
    pub fn native(step: NativeStep, status: NativeStatus, message: impl Into<String>) -> Self {
        let mut message = message.into().trim().to_string();
        if message.is_empty() {
            message = format!("native status {status}");
        }
        Self::Native {
            step,
            status,
            message,
        }
    }

    /// Create not-found error
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create I/O error with context
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Classification used in the returned [`mdfe_core::ProviderResult`]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Native { step, .. } => step.kind(),
            Self::Rejected { .. } => ErrorKind::AuthorityRejection,
            Self::Invalid(_) | Self::Generate(_) | Self::Lifecycle(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Config(_) | Self::Store(_) | Self::Io { .. } | Self::Join(_) => ErrorKind::Internal,
        }
    }
}

/// Result alias for bridge internals
pub type Result<T> = std::result::Result<T, EngineError>;
