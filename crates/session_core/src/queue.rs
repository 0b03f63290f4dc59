use std::collections::VecDeque;

use serde_json::Value;
use shared::domain::CallId;
use shared::protocol::ReplyOutcome;
use tokio::sync::oneshot;

/// A call that has an id but has not reached the engine yet.
#[derive(Debug)]
pub(crate) struct QueuedCall {
    pub(crate) id: CallId,
    pub(crate) action: String,
    pub(crate) payload: Value,
    pub(crate) responder: Option<oneshot::Sender<ReplyOutcome>>,
}

/// FIFO buffer for calls made before the engine signals readiness.
#[derive(Debug)]
pub(crate) struct OutboundQueue {
    calls: VecDeque<QueuedCall>,
    capacity: usize,
}

impl OutboundQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            calls: VecDeque::new(),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, call: QueuedCall) {
        self.calls.push_back(call);
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedCall> {
        self.calls.pop_front()
    }

    pub(crate) fn clear(&mut self) -> Vec<QueuedCall> {
        self.calls.drain(..).collect()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.calls.len() >= self.capacity
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}
