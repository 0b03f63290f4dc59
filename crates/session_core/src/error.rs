use shared::domain::CallId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The id allocator handed out an id that is still pending. Never
    /// expected in correct operation.
    #[error("call id {0:?} is already pending")]
    CallIdReused(CallId),

    /// The pre-readiness queue hit its cap; the call was not accepted.
    #[error("outbound queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The session was torn down, or the call raced with teardown.
    #[error("session closed")]
    SessionClosed,
}
