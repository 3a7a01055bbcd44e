//! Document lifecycle
//!
//! ```text
//! Draft ──► Transmitted ──► Authorized ──► Cancelled
//!   ▲            │               └───────► Closed
//!   └────────────┘ (authority rejection, retryable)
//! ```
//!
//! Cancelled and Closed are terminal. Inclusion events on an authorized
//! document are recorded in history without changing the state.

mod history;
mod tracker;

pub use history::{HistoryLog, LoggedEntry, StatusHistoryEntry, MAX_REASON_LEN, MAX_STATUS_LEN};
pub use tracker::{LifecycleTracker, TransitionNote};

use crate::manifest::ManifestStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// History labels persisted with each entry
pub mod status {
    //! Status label constants
    /// Not yet sent
    pub const DRAFT: &str = "RASCUNHO";
    /// Sent, awaiting authority
    pub const TRANSMITTED: &str = "TRANSMITIDA";
    /// Authorized
    pub const AUTHORIZED: &str = "AUTORIZADO";
    /// Refused by the authority
    pub const REJECTED: &str = "REJEITADA";
    /// Cancelled
    pub const CANCELLED: &str = "CANCELADO";
    /// Closed
    pub const CLOSED: &str = "ENCERRADO";
    /// Transmission fault
    pub const TRANSMISSION_ERROR: &str = "ERRO_TRANSMISSAO";
    /// Conductor inclusion event registered
    pub const CONDUCTOR_INCLUDED: &str = "CONDUTOR_INCLUIDO";
    /// Referenced-document inclusion event registered
    pub const DOCUMENT_INCLUDED: &str = "DFE_INCLUIDO";
}

/// Top-level document state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Editable, not authorized
    Draft,
    /// Submitted, awaiting outcome
    Transmitted,
    /// Authorized by the authority
    Authorized,
    /// Cancelled (terminal)
    Cancelled,
    /// Closed (terminal)
    Closed,
}

impl LifecycleState {
    /// Derive the state from persisted flags
    #[must_use]
    pub fn from_status(status: &ManifestStatus) -> Self {
        if status.cancelled {
            Self::Cancelled
        } else if status.closed {
            Self::Closed
        } else if status.authorized {
            Self::Authorized
        } else {
            Self::Draft
        }
    }

    /// Label recorded in history when a transition lands here.
    /// `None` for transitions that leave no history row.
    #[must_use]
    pub const fn history_label(self) -> Option<&'static str> {
        match self {
            Self::Draft | Self::Transmitted => None,
            Self::Authorized => Some(status::AUTHORIZED),
            Self::Cancelled => Some(status::CANCELLED),
            Self::Closed => Some(status::CLOSED),
        }
    }

    /// No transition leaves this state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition not in the allowed table
    #[error("illegal lifecycle transition {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: LifecycleState,
        /// Requested state
        to: LifecycleState,
    },

    /// Operation requires a different current state
    #[error("document is {actual}, expected {expected}")]
    UnexpectedState {
        /// Required state
        expected: LifecycleState,
        /// Actual state
        actual: LifecycleState,
    },

    /// Stored history failed hash-chain verification
    #[error("history integrity violation at entry {index}")]
    IntegrityViolation {
        /// Index of the first bad entry
        index: usize,
    },
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: LifecycleState) -> &'static [LifecycleState] {
    use LifecycleState::{Authorized, Cancelled, Closed, Draft, Transmitted};
    match from {
        Draft => &[Transmitted],
        Transmitted => &[Authorized, Draft],
        Authorized => &[Cancelled, Closed],
        Cancelled | Closed => &[],
    }
}

/// Check a transition against the table
pub fn validate_transition(from: LifecycleState, to: LifecycleState) -> Result<(), LifecycleError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition { from, to })
    }
}
