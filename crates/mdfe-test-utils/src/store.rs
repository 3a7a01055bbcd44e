//! In-memory [`ManifestStore`]

use chrono::{DateTime, Utc};
use mdfe_core::{ManifestAggregate, ManifestId, StatusHistoryEntry};
use mdfe_engine::{Authorization, ManifestStore, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Manifests and history rows kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    manifests: Mutex<HashMap<ManifestId, ManifestAggregate>>,
    history: Mutex<HashMap<ManifestId, Vec<StatusHistoryEntry>>>,
    refuse_writes: AtomicBool,
}

impl InMemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `manifests`
    pub fn with(manifests: impl IntoIterator<Item = ManifestAggregate>) -> Self {
        let store = Self::new();
        for manifest in manifests {
            store.insert(manifest);
        }
        store
    }

    /// Add or replace a manifest
    pub fn insert(&self, manifest: ManifestAggregate) {
        self.manifests.lock().insert(manifest.id, manifest);
    }

    /// Snapshot of a stored manifest
    pub fn get(&self, id: ManifestId) -> Option<ManifestAggregate> {
        self.manifests.lock().get(&id).cloned()
    }

    /// History rows appended so far, oldest first
    pub fn history(&self, id: ManifestId) -> Vec<StatusHistoryEntry> {
        self.history.lock().get(&id).cloned().unwrap_or_default()
    }

    /// Make every write fail with a backend error until switched off
    pub fn refuse_writes(&self, refuse: bool) {
        self.refuse_writes.store(refuse, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes refused".into()));
        }
        Ok(())
    }

    fn update(&self, id: ManifestId, f: impl FnOnce(&mut ManifestAggregate)) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut manifests = self.manifests.lock();
        let manifest = manifests.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        f(manifest);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ManifestStore for InMemoryStore {
    async fn load(&self, id: ManifestId) -> Result<Option<ManifestAggregate>, StoreError> {
        Ok(self.get(id))
    }

    async fn find_by_key(&self, access_key: &str) -> Result<Option<ManifestAggregate>, StoreError> {
        Ok(self
            .manifests
            .lock()
            .values()
            .find(|m| m.status.access_key.as_deref() == Some(access_key))
            .cloned())
    }

    async fn record_authorization(
        &self,
        id: ManifestId,
        authorization: Authorization,
    ) -> Result<(), StoreError> {
        self.update(id, |m| {
            m.status.transmitted = true;
            m.status.authorized = true;
            m.status.access_key = authorization.access_key;
            m.status.protocol = authorization.protocol;
            m.status.receipt = authorization.receipt;
            m.status.authorized_xml = authorization.authorized_xml;
            m.status.authorized_at = authorization.authorized_at;
        })
    }

    async fn record_cancellation(&self, id: ManifestId, _at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update(id, |m| m.status.cancelled = true)
    }

    async fn record_closure(&self, id: ManifestId, _at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update(id, |m| m.status.closed = true)
    }

    async fn append_history(&self, id: ManifestId, entry: StatusHistoryEntry) -> Result<(), StoreError> {
        self.check_writable()?;
        self.history.lock().entry(id).or_default().push(entry);
        Ok(())
    }
}
