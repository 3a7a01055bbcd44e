use super::LifecycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Longest stored status label
pub const MAX_STATUS_LEN: usize = 40;
/// Longest stored reason
pub const MAX_REASON_LEN: usize = 200;

/// One row of a document's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Status label (see [`super::status`])
    pub status: String,
    /// Free-text reason
    pub reason: Option<String>,
    /// Who triggered the change
    pub responsible: Option<String>,
    /// Correlation id of the originating operation
    pub trace_id: Option<String>,
    /// When the row was recorded (UTC)
    pub recorded_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    /// Create entry stamped now
    #[must_use]
    pub fn new(status: &str) -> Self {
        Self {
            status: truncate(status, MAX_STATUS_LEN),
            reason: None,
            responsible: None,
            trace_id: None,
            recorded_at: Utc::now(),
        }
    }

    /// Attach reason (truncated to [`MAX_REASON_LEN`])
    #[must_use]
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason.map(|r| truncate(&r, MAX_REASON_LEN));
        self
    }

    /// Attach responsible identity
    #[must_use]
    pub fn with_responsible(mut self, responsible: Option<String>) -> Self {
        self.responsible = responsible;
        self
    }

    /// Attach trace id
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// History entry with its position in the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEntry {
    /// The recorded entry
    pub entry: StatusHistoryEntry,
    /// Hash of the previous logged entry (zeros for the first)
    pub prev_hash: [u8; 32],
    /// Hash over this entry and `prev_hash`
    pub hash: [u8; 32],
}

impl LoggedEntry {
    /// Hex form of [`LoggedEntry::hash`]
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Append-only, hash-chained history of one document
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<LoggedEntry>,
}

impl HistoryLog {
    /// Append an entry, chaining it to the previous one
    pub fn append(&mut self, entry: StatusHistoryEntry) -> &LoggedEntry {
        let prev_hash = self.entries.last().map_or([0u8; 32], |e| e.hash);
        let hash = compute_hash(&entry, &prev_hash);
        self.entries.push(LoggedEntry {
            entry,
            prev_hash,
            hash,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Entries in append order
    #[must_use]
    pub fn entries(&self) -> &[LoggedEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute the chain and report the first broken link
    pub fn verify_integrity(&self) -> Result<(), LifecycleError> {
        let mut prev = [0u8; 32];
        for (index, logged) in self.entries.iter().enumerate() {
            if logged.prev_hash != prev || logged.hash != compute_hash(&logged.entry, &prev) {
                return Err(LifecycleError::IntegrityViolation { index });
            }
            prev = logged.hash;
        }
        Ok(())
    }
}

fn compute_hash(entry: &StatusHistoryEntry, prev_hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.status.as_bytes());
    hasher.update([0]);
    for field in [&entry.reason, &entry.responsible, &entry.trace_id] {
        if let Some(text) = field {
            hasher.update([1]);
            hasher.update(text.as_bytes());
        }
        hasher.update([0]);
    }
    hasher.update(entry.recorded_at.timestamp_micros().to_le_bytes());
    hasher.update(prev_hash);
    hasher.finalize().into()
}
