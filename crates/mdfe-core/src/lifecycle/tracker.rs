use super::history::{HistoryLog, LoggedEntry, StatusHistoryEntry};
use super::{status, validate_transition, LifecycleError, LifecycleState};
use crate::manifest::ManifestId;
use dashmap::DashMap;

#[derive(Debug)]
struct DocumentRecord {
    state: LifecycleState,
    log: HistoryLog,
}

impl DocumentRecord {
    fn new(state: LifecycleState) -> Self {
        Self {
            state,
            log: HistoryLog::default(),
        }
    }
}

/// Context stored alongside a history row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionNote {
    /// Free-text reason
    pub reason: Option<String>,
    /// Who triggered the change
    pub responsible: Option<String>,
    /// Correlation id
    pub trace_id: Option<String>,
}

impl TransitionNote {
    /// Note with only a reason
    #[must_use]
    pub fn reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Set trace id
    #[must_use]
    pub fn traced(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Set responsible identity
    #[must_use]
    pub fn by(mut self, responsible: Option<String>) -> Self {
        self.responsible = responsible;
        self
    }

    fn into_entry(self, label: &str) -> StatusHistoryEntry {
        StatusHistoryEntry::new(label)
            .with_reason(self.reason)
            .with_responsible(self.responsible)
            .with_trace_id(self.trace_id)
    }
}

/// Per-document state machine plus append-only history.
///
/// Documents not yet seen start in [`LifecycleState::Draft`]; use
/// [`LifecycleTracker::register`] to seed a state loaded from storage.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    documents: DashMap<ManifestId, DocumentRecord>,
}

impl LifecycleTracker {
    /// Create empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document's state if it is not tracked yet; returns the
    /// tracked state (existing state wins)
    pub fn register(&self, id: ManifestId, state: LifecycleState) -> LifecycleState {
        self.documents
            .entry(id)
            .or_insert_with(|| DocumentRecord::new(state))
            .state
    }

    /// Current state
    #[must_use]
    pub fn state(&self, id: ManifestId) -> Option<LifecycleState> {
        self.documents.get(&id).map(|r| r.state)
    }

    /// Fail unless the document is currently `expected`
    pub fn require(&self, id: ManifestId, expected: LifecycleState) -> Result<(), LifecycleError> {
        let actual = self.state(id).unwrap_or(LifecycleState::Draft);
        if actual == expected {
            Ok(())
        } else {
            Err(LifecycleError::UnexpectedState { expected, actual })
        }
    }

    /// Apply a transition. Returns the history row when the target state
    /// records one (Authorized, Cancelled, Closed).
    pub fn transition(
        &self,
        id: ManifestId,
        to: LifecycleState,
        note: TransitionNote,
    ) -> Result<Option<StatusHistoryEntry>, LifecycleError> {
        let mut record = self
            .documents
            .entry(id)
            .or_insert_with(|| DocumentRecord::new(LifecycleState::Draft));

        validate_transition(record.state, to)?;
        tracing::debug!(manifest_id = %id, from = %record.state, to = %to, "lifecycle transition");
        record.state = to;

        Ok(to
            .history_label()
            .map(|label| record.log.append(note.into_entry(label)).entry.clone()))
    }

    /// Record an authority rejection. The state is not advanced; an
    /// in-flight transmission falls back to Draft.
    pub fn record_rejection(
        &self,
        id: ManifestId,
        code: &str,
        reason: &str,
        note: TransitionNote,
    ) -> StatusHistoryEntry {
        let mut record = self
            .documents
            .entry(id)
            .or_insert_with(|| DocumentRecord::new(LifecycleState::Draft));

        if record.state == LifecycleState::Transmitted {
            record.state = LifecycleState::Draft;
        }
        tracing::info!(manifest_id = %id, cstat = %code, "authority rejection recorded");

        let note = TransitionNote {
            reason: Some(format!("{code} - {reason}")),
            ..note
        };
        record.log.append(note.into_entry(status::REJECTED)).entry.clone()
    }

    /// Record a post-authorization event without a state change
    pub fn record_event(
        &self,
        id: ManifestId,
        label: &str,
        note: TransitionNote,
    ) -> Result<StatusHistoryEntry, LifecycleError> {
        let mut record = self
            .documents
            .entry(id)
            .or_insert_with(|| DocumentRecord::new(LifecycleState::Draft));

        if record.state != LifecycleState::Authorized {
            return Err(LifecycleError::UnexpectedState {
                expected: LifecycleState::Authorized,
                actual: record.state,
            });
        }
        Ok(record.log.append(note.into_entry(label)).entry.clone())
    }

    /// Read-only copy of the ordered history
    #[must_use]
    pub fn history(&self, id: ManifestId) -> Vec<StatusHistoryEntry> {
        self.documents
            .get(&id)
            .map(|r| r.log.entries().iter().map(|l| l.entry.clone()).collect())
            .unwrap_or_default()
    }

    /// History including hash-chain links
    #[must_use]
    pub fn logged(&self, id: ManifestId) -> Vec<LoggedEntry> {
        self.documents
            .get(&id)
            .map(|r| r.log.entries().to_vec())
            .unwrap_or_default()
    }

    /// Verify one document's hash chain
    pub fn verify_integrity(&self, id: ManifestId) -> Result<(), LifecycleError> {
        self.documents
            .get(&id)
            .map_or(Ok(()), |r| r.log.verify_integrity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: ManifestId = ManifestId(7);

    fn authorize(tracker: &LifecycleTracker) {
        tracker
            .transition(ID, LifecycleState::Transmitted, TransitionNote::default())
            .unwrap();
        tracker
            .transition(ID, LifecycleState::Authorized, TransitionNote::reason("Protocolo: 1"))
            .unwrap();
    }

    #[test]
    fn only_labelled_transitions_append() {
        let tracker = LifecycleTracker::new();
        let entry = tracker
            .transition(ID, LifecycleState::Transmitted, TransitionNote::default())
            .unwrap();
        assert!(entry.is_none());
        assert!(tracker.history(ID).is_empty());

        let entry = tracker
            .transition(ID, LifecycleState::Authorized, TransitionNote::reason("Protocolo: 1"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, status::AUTHORIZED);
        assert_eq!(tracker.history(ID).len(), 1);
    }

    #[test]
    fn rejection_keeps_state_and_appends_once() {
        let tracker = LifecycleTracker::new();
        authorize(&tracker);

        tracker.record_rejection(ID, "218", "Ja cancelado", TransitionNote::default());

        assert_eq!(tracker.state(ID), Some(LifecycleState::Authorized));
        let history = tracker.history(ID);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].status, status::REJECTED);
        assert_eq!(history[1].reason.as_deref(), Some("218 - Ja cancelado"));
    }

    #[test]
    fn rejection_during_transmission_returns_to_draft() {
        let tracker = LifecycleTracker::new();
        tracker
            .transition(ID, LifecycleState::Transmitted, TransitionNote::default())
            .unwrap();
        tracker.record_rejection(ID, "539", "Duplicidade", TransitionNote::default());
        assert_eq!(tracker.state(ID), Some(LifecycleState::Draft));
    }

    #[test]
    fn events_require_authorization() {
        let tracker = LifecycleTracker::new();
        assert!(tracker
            .record_event(ID, status::CONDUCTOR_INCLUDED, TransitionNote::default())
            .is_err());

        authorize(&tracker);
        tracker
            .record_event(ID, status::CONDUCTOR_INCLUDED, TransitionNote::default())
            .unwrap();
        assert_eq!(tracker.state(ID), Some(LifecycleState::Authorized));
        assert_eq!(tracker.history(ID).len(), 2);
        assert!(tracker.verify_integrity(ID).is_ok());
    }

    #[test]
    fn register_does_not_override() {
        let tracker = LifecycleTracker::new();
        assert_eq!(tracker.register(ID, LifecycleState::Authorized), LifecycleState::Authorized);
        assert_eq!(tracker.register(ID, LifecycleState::Draft), LifecycleState::Authorized);
        assert!(tracker.require(ID, LifecycleState::Authorized).is_ok());
    }
}
