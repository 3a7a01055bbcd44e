//! One-time engine initialization

use crate::config::EngineConfig;
use crate::error::Result;
use crate::handle::EngineHandle;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

static PROCESS_WIDE: Lazy<InitGuard> = Lazy::new(InitGuard::new);

/// Double-checked initialization flag.
///
/// The first caller provisions the configuration artifact and starts the
/// engine; later callers only observe the flag. A failed attempt leaves
/// the flag unset so the next caller retries.
#[derive(Debug, Default)]
pub struct InitGuard {
    initialized: AtomicBool,
    lock: Mutex<()>,
}

impl InitGuard {
    /// Private guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard shared by the whole process
    #[must_use]
    pub fn process_wide() -> &'static Self {
        &PROCESS_WIDE
    }

    /// Whether initialization has completed
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Initialize once. Returns `true` when this call did the work.
    pub fn ensure(&self, handle: &EngineHandle, config: &EngineConfig) -> Result<bool> {
        if self.is_initialized() {
            return Ok(false);
        }

        let _guard = self.lock.lock();
        if self.initialized.load(Ordering::Acquire) {
            return Ok(false);
        }

        let config_path = config.provision()?;
        let mut lease = handle.lease();
        lease.initialize(&config_path, &config.crypt_key)?;
        let name = lease.name().unwrap_or_default();
        let version = lease.version().unwrap_or_default();
        drop(lease);

        self.initialized.store(true, Ordering::Release);
        tracing::info!(engine = %name, version = %version, "native engine initialized");
        Ok(true)
    }
}
