//! MDFe Core
//!
//! Shared domain model for the manifest subsystem.
//!
//! - [`manifest`]: read-only manifest projection supplied by persistence
//! - [`result`]: [`ProviderResult`] and [`ErrorKind`], returned by every
//!   bridge operation
//! - [`lifecycle`]: state machine plus hash-chained status history
//! - [`validation`]: pre-generation field checks
//! - [`amount`], [`uf`], [`document`]: fixed-point decimals, UF codes and
//!   CPF/CNPJ check digits

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod amount;
pub mod document;
pub mod lifecycle;
pub mod manifest;
pub mod result;
pub mod uf;
pub mod validation;

pub use amount::{AmountParseError, Decimal2};
pub use lifecycle::{
    LifecycleError, LifecycleState, LifecycleTracker, StatusHistoryEntry, TransitionNote,
};
pub use manifest::{DocumentKind, Environment, ManifestAggregate, ManifestId, ManifestStatus};
pub use result::{ErrorKind, ProviderResult};
pub use validation::{FieldError, ManifestFieldValidator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with manifests
    pub use crate::amount::Decimal2;
    pub use crate::lifecycle::{LifecycleState, LifecycleTracker, TransitionNote};
    pub use crate::manifest::{ManifestAggregate, ManifestId};
    pub use crate::result::{ErrorKind, ProviderResult};
}
