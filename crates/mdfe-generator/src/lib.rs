//! MDFe INI Generation
//!
//! - [`ManifestGenerator`]: manifest aggregate → document INI
//! - [`EventIniGenerator`]: cancellation, closure and inclusion events
//!
//! Both produce text consumed by the native engine's `load_ini` /
//! `load_event_ini` calls.
//!
//! # Example
//!
//! ```rust
//! use chrono::DateTime;
//! use mdfe_generator::{EventContext, EventIniGenerator, EventRequest};
//!
//! let context = EventContext {
//!     uf: "SP".into(),
//!     cnpj_cpf: "11222333000181".into(),
//!     access_key: "3".repeat(44),
//!     protocol: Some("935240000000001".into()),
//! };
//! let at = DateTime::parse_from_rfc3339("2024-05-10T10:00:00-03:00").unwrap();
//! let request = EventRequest::cancellation(context, at, "Carga nao embarcada");
//! let ini = EventIniGenerator::new().generate(&request).unwrap();
//! assert!(ini.starts_with("[EVENTO]\nidLote=1\n"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod event;
pub mod format;
pub mod manifest;

pub use error::{GenerateError, Result};
pub use event::{codes, params, EventContext, EventIniGenerator, EventRequest};
pub use manifest::ManifestGenerator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for INI generation
    pub use crate::error::GenerateError;
    pub use crate::event::{EventContext, EventIniGenerator, EventRequest};
    pub use crate::manifest::ManifestGenerator;
}
