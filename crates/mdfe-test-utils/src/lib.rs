//! Testing utilities for the MDFe workspace
//!
//! Shared fixtures, a scriptable recording engine and an in-memory store.

#![allow(missing_docs)]

pub mod engine;
pub mod fixtures;
pub mod store;

pub use engine::RecordingEngine;
pub use store::InMemoryStore;

use mdfe_engine::EngineConfig;
use std::path::Path;

/// Engine configuration rooted in a scratch directory
pub fn test_config(dir: &Path) -> EngineConfig {
    EngineConfig {
        base_path: dir.join("MDFeFiles"),
        ..EngineConfig::default()
    }
}
