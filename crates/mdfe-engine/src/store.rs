//! Persistence collaborator
//!
//! The bridge reads manifests and writes back authority identifiers, flags
//! and history rows through [`ManifestStore`]. Storage itself lives
//! outside this workspace.

use chrono::{DateTime, FixedOffset, Utc};
use mdfe_core::{ManifestAggregate, ManifestId, StatusHistoryEntry};
use serde::{Deserialize, Serialize};

/// Store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No manifest with this id
    #[error("manifest {0} not found")]
    NotFound(ManifestId),

    /// Backend failure
    #[error("store backend failed: {0}")]
    Backend(String),
}

/// Data written back after an authorized submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// 44-digit access key
    pub access_key: Option<String>,
    /// Authorization protocol
    pub protocol: Option<String>,
    /// Submission receipt
    pub receipt: Option<String>,
    /// Authorized XML
    pub authorized_xml: Option<String>,
    /// Authority reception timestamp, when parseable
    pub authorized_at: Option<DateTime<FixedOffset>>,
    /// When the bridge sent the document
    pub transmitted_at: DateTime<Utc>,
}

/// Persistence operations used by the bridge
#[async_trait::async_trait]
pub trait ManifestStore: Send + Sync {
    /// Manifest by id
    async fn load(&self, id: ManifestId) -> Result<Option<ManifestAggregate>, StoreError>;

    /// Manifest by access key
    async fn find_by_key(&self, access_key: &str) -> Result<Option<ManifestAggregate>, StoreError>;

    /// Mark transmitted and authorized
    async fn record_authorization(
        &self,
        id: ManifestId,
        authorization: Authorization,
    ) -> Result<(), StoreError>;

    /// Mark cancelled
    async fn record_cancellation(&self, id: ManifestId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Mark closed
    async fn record_closure(&self, id: ManifestId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Append one status-history row
    async fn append_history(&self, id: ManifestId, entry: StatusHistoryEntry) -> Result<(), StoreError>;
}
