use std::collections::HashMap;

use shared::domain::CallId;
use shared::protocol::ReplyOutcome;
use tokio::sync::oneshot;

use crate::error::SessionError;

/// One responder awaiting a specific call's reply.
#[derive(Debug)]
pub(crate) struct PendingEntry {
    responder: oneshot::Sender<ReplyOutcome>,
}

impl PendingEntry {
    pub(crate) fn new(responder: oneshot::Sender<ReplyOutcome>) -> Self {
        Self { responder }
    }

    /// Consumes the entry. The receiving handle may already be gone,
    /// in which case the outcome is discarded.
    pub(crate) fn resolve(self, outcome: ReplyOutcome) {
        let _ = self.responder.send(outcome);
    }
}

/// Correlation table: in-flight call id to the entry awaiting its reply.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: HashMap<CallId, PendingEntry>,
}

impl PendingTable {
    pub(crate) fn register(&mut self, id: CallId, entry: PendingEntry) -> Result<(), SessionError> {
        if self.entries.contains_key(&id) {
            return Err(SessionError::CallIdReused(id));
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: CallId) -> Option<PendingEntry> {
        self.entries.remove(&id)
    }

    pub(crate) fn drain(&mut self) -> Vec<PendingEntry> {
        self.entries.drain().map(|(_, entry)| entry).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
