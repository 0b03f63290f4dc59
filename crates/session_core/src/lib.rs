//! Correlation layer between a host and an opaque computational engine.
//!
//! Calls go out through a single fire-and-forget [`Engine::submit`];
//! replies come back later through [`Session::handle_reply`]. The
//! session matches each reply to the call that caused it and resolves
//! the caller's [`CallHandle`] exactly once. Until the engine
//! acknowledges the bootstrap handshake, outbound calls buffer in a
//! FIFO queue and flush, in order, when the acknowledgement arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use shared::domain::{CallId, SessionId};
use shared::protocol::{EngineReply, OutboundCall, ReplyOutcome, HANDSHAKE_ACTION};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

pub mod engine;
pub mod error;
pub mod handle;
mod pending;
mod queue;

pub use engine::Engine;
pub use error::SessionError;
pub use handle::CallHandle;

use pending::{PendingEntry, PendingTable};
use queue::{OutboundQueue, QueuedCall};

/// Default bound on the pre-readiness outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Calls buffered while the handshake is outstanding beyond this
    /// count are rejected with [`SessionError::QueueFull`].
    pub queue_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

struct SessionState {
    ready: bool,
    draining: bool,
    closed: bool,
    next_call_id: u64,
    handshake_id: CallId,
    pending: PendingTable,
    queue: OutboundQueue,
}

impl SessionState {
    fn allocate_id(&mut self) -> CallId {
        let id = CallId(self.next_call_id);
        self.next_call_id += 1;
        id
    }
}

/// One host-side session against one engine instance. Owns the
/// correlation table and the outbound queue for its whole lifetime.
pub struct Session {
    session_id: SessionId,
    engine: Arc<dyn Engine>,
    inner: Mutex<SessionState>,
}

impl Session {
    /// Starts a session against `engine`, issuing the bootstrap
    /// handshake `{action: "Initial", id: 1}` immediately. The gate
    /// stays closed until the handshake's reply comes back through
    /// [`Session::handle_reply`]; the returned handle resolves with
    /// that reply.
    pub fn connect(engine: Arc<dyn Engine>, bootstrap: Value) -> (Arc<Self>, CallHandle) {
        Self::connect_with_options(engine, bootstrap, SessionOptions::default())
    }

    pub fn connect_with_options(
        engine: Arc<dyn Engine>,
        bootstrap: Value,
        options: SessionOptions,
    ) -> (Arc<Self>, CallHandle) {
        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let session = Arc::new(Self {
            session_id,
            engine,
            inner: Mutex::new(SessionState {
                ready: false,
                draining: false,
                closed: false,
                next_call_id: 1,
                handshake_id: CallId(0),
                pending: PendingTable::default(),
                queue: OutboundQueue::new(options.queue_capacity),
            }),
        });
        let (tx, rx) = oneshot::channel();
        let handshake_id = {
            let mut state = session.state();
            let id = state.allocate_id();
            state.handshake_id = id;
            if let Err(err) = state.pending.register(id, PendingEntry::new(tx)) {
                error!(session_id = session_id.0, %err, "handshake registration failed");
            }
            id
        };
        info!(
            session_id = session_id.0,
            call_id = handshake_id.0,
            "issuing engine handshake"
        );
        session.engine.submit(OutboundCall {
            action: HANDSHAKE_ACTION.to_string(),
            payload: bootstrap,
            id: handshake_id,
        });
        let handle = CallHandle::new(handshake_id, rx);
        (session, handle)
    }

    /// Sends one action to the engine and returns an awaitable handle
    /// for its reply. Never blocks: the call dispatches immediately
    /// once the gate is open, and queues FIFO otherwise.
    pub fn send(
        &self,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<CallHandle, SessionError> {
        let (tx, rx) = oneshot::channel();
        let (id, direct) = self.route(action.into(), payload, Some(tx))?;
        if let Some(call) = direct {
            self.dispatch(call)?;
        }
        Ok(CallHandle::new(id, rx))
    }

    /// Fire-and-forget variant: no pending entry is recorded, so the
    /// eventual reply (if any) is discarded on arrival.
    pub fn send_background(
        &self,
        action: impl Into<String>,
        payload: Value,
    ) -> Result<CallId, SessionError> {
        let (id, direct) = self.route(action.into(), payload, None)?;
        if let Some(call) = direct {
            self.dispatch(call)?;
        }
        Ok(id)
    }

    /// Inbound entry point: the host runtime calls this for every
    /// message the engine pushes back. Boundary garbage is absorbed
    /// here; nothing escalates to callers of [`Session::send`].
    pub fn handle_reply(&self, reply: EngineReply) {
        let Some(task_id) = reply.task_id else {
            warn!(
                session_id = self.session_id.0,
                "discarding engine reply without task_id"
            );
            return;
        };
        let outcome = ReplyOutcome {
            payload: reply.payload,
            error: reply.error,
        };
        let (entry, open_gate) = {
            let mut state = self.state();
            if state.closed {
                debug!(
                    session_id = self.session_id.0,
                    call_id = task_id.0,
                    "discarding reply after close"
                );
                return;
            }
            let entry = state.pending.remove(task_id);
            let open_gate = entry.is_some() && task_id == state.handshake_id && !state.ready;
            if open_gate {
                state.ready = true;
                state.draining = true;
            }
            (entry, open_gate)
        };
        match entry {
            Some(entry) => entry.resolve(outcome),
            None => {
                debug!(
                    session_id = self.session_id.0,
                    call_id = task_id.0,
                    "discarding unmatched engine reply"
                );
                return;
            }
        }
        if open_gate {
            info!(
                session_id = self.session_id.0,
                queued = self.queued_calls(),
                "engine ready, draining outbound queue"
            );
            self.drain();
        }
    }

    /// Tears the session down. Every queued or in-flight handle
    /// resolves with [`SessionError::SessionClosed`]; later sends fail
    /// with the same error and later replies are dropped.
    pub fn close(&self) {
        let (queued, pending) = {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.queue.clear(), state.pending.drain())
        };
        info!(
            session_id = self.session_id.0,
            queued = queued.len(),
            pending = pending.len(),
            "session closed"
        );
        // Dropping the responders wakes every outstanding handle with
        // SessionClosed.
        drop(queued);
        drop(pending);
    }

    pub fn id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    pub fn pending_calls(&self) -> usize {
        self.state().pending.len()
    }

    pub fn queued_calls(&self) -> usize {
        self.state().queue.len()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Decides under the lock whether a call dispatches now or queues.
    // While a drain is in progress new calls queue behind the items
    // already draining, keeping FIFO order across the readiness
    // boundary.
    fn route(
        &self,
        action: String,
        payload: Value,
        responder: Option<oneshot::Sender<ReplyOutcome>>,
    ) -> Result<(CallId, Option<QueuedCall>), SessionError> {
        let mut state = self.state();
        if state.closed {
            return Err(SessionError::SessionClosed);
        }
        if state.ready && !state.draining {
            let id = state.allocate_id();
            return Ok((
                id,
                Some(QueuedCall {
                    id,
                    action,
                    payload,
                    responder,
                }),
            ));
        }
        if state.queue.is_full() {
            return Err(SessionError::QueueFull {
                capacity: state.queue.capacity(),
            });
        }
        let id = state.allocate_id();
        state.queue.push(QueuedCall {
            id,
            action,
            payload,
            responder,
        });
        debug!(
            session_id = self.session_id.0,
            call_id = id.0,
            queued = state.queue.len(),
            "call queued awaiting readiness"
        );
        Ok((id, None))
    }

    // Single funnel to the engine: records the pending entry, then
    // submits. The engine is invoked outside the state lock so an
    // engine that replies synchronously can re-enter the session.
    fn dispatch(&self, call: QueuedCall) -> Result<(), SessionError> {
        let QueuedCall {
            id,
            action,
            payload,
            responder,
        } = call;
        if let Some(tx) = responder {
            let mut state = self.state();
            if state.closed {
                return Err(SessionError::SessionClosed);
            }
            state.pending.register(id, PendingEntry::new(tx))?;
        }
        debug!(
            session_id = self.session_id.0,
            call_id = id.0,
            action = %action,
            "dispatching call"
        );
        self.engine.submit(OutboundCall {
            action,
            payload,
            id,
        });
        Ok(())
    }

    // Exhaustive FIFO drain: keeps popping the head until the queue is
    // empty, including items enqueued re-entrantly while draining.
    fn drain(&self) {
        loop {
            let next = {
                let mut state = self.state();
                match state.queue.pop() {
                    Some(call) => call,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            match self.dispatch(next) {
                Ok(()) => {}
                Err(SessionError::SessionClosed) => {
                    debug!(
                        session_id = self.session_id.0,
                        "drain interrupted by close"
                    );
                }
                Err(err) => {
                    error!(
                        session_id = self.session_id.0,
                        %err,
                        "failed to dispatch queued call"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
