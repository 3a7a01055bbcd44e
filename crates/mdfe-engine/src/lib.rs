//! MDFe Engine Bridge
//!
//! Async, lifecycle-aware access to the vendor transmission engine.
//!
//! - [`native`]: the [`NativeEngine`] call surface and [`ResponseBuffer`]
//! - [`handle`]: [`EngineHandle`] / [`EngineLease`], the process-wide
//!   serialization point
//! - [`init`]: one-time configuration provisioning and start-up
//! - [`config`]: [`EngineConfig`], rendered to the engine's INI file
//! - [`response`]: typed parsing of engine responses
//! - [`store`]: the [`ManifestStore`] persistence collaborator
//! - [`bridge`]: [`EngineBridge`], the operations callers use
//!
//! The vendor library is linked only with the `acbr-native` feature
//! ([`ffi::AcbrEngine`]). Without it, [`stub::UnavailableEngine`] answers
//! every call with a typed failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use mdfe_engine::prelude::*;
//! use mdfe_engine::stub::UnavailableEngine;
//! # async fn run(store: std::sync::Arc<dyn ManifestStore>) {
//! let bridge = EngineBridge::builder(EngineHandle::new(UnavailableEngine), store)
//!     .config(EngineConfig::default())
//!     .build();
//! let status = bridge.service_status().await;
//! assert!(!status.is_success());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod bridge;
pub mod config;
pub mod error;
#[cfg(feature = "acbr-native")]
pub mod ffi;
pub mod handle;
pub mod init;
pub mod native;
pub mod response;
pub mod store;
pub mod stub;

pub use bridge::{EngineBridge, EngineBridgeBuilder, EngineInfo, ServiceStatus};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, NativeStep, Result};
pub use handle::{EngineHandle, EngineLease};
pub use init::InitGuard;
pub use native::{KeyRequest, NativeEngine, NativeStatus, ResponseBuffer};
pub use response::{
    AuthorityResponse, DistributionResponse, EventResponse, QueryResponse, ServiceStatusResponse,
    SubmitResponse,
};
pub use store::{Authorization, ManifestStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine for this build: the linked library with `acbr-native`, the
/// unavailable stub otherwise
#[must_use]
pub fn default_engine() -> Box<dyn NativeEngine> {
    #[cfg(feature = "acbr-native")]
    {
        Box::new(ffi::AcbrEngine::new())
    }
    #[cfg(not(feature = "acbr-native"))]
    {
        Box::new(stub::UnavailableEngine)
    }
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::bridge::{EngineBridge, EngineInfo, ServiceStatus};
    pub use crate::config::EngineConfig;
    pub use crate::handle::EngineHandle;
    pub use crate::native::KeyRequest;
    pub use crate::response::AuthorityResponse;
    pub use crate::store::ManifestStore;
}
