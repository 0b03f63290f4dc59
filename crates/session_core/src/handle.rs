use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use shared::domain::CallId;
use shared::protocol::ReplyOutcome;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::SessionError;

/// Awaitable handle for one in-flight call, resolved at most once by
/// the matching engine reply. Awaiting yields the reply's outcome;
/// `Err(SessionClosed)` means the session was torn down before a reply
/// arrived. Dropping the handle is allowed; the reply is then
/// discarded on arrival.
#[derive(Debug)]
pub struct CallHandle {
    id: CallId,
    rx: oneshot::Receiver<ReplyOutcome>,
}

impl CallHandle {
    pub(crate) fn new(id: CallId, rx: oneshot::Receiver<ReplyOutcome>) -> Self {
        Self { id, rx }
    }

    /// Id the session assigned to this call.
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Non-blocking probe for hosts that poll instead of awaiting.
    pub fn try_outcome(&mut self) -> Option<Result<ReplyOutcome, SessionError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(Ok(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(SessionError::SessionClosed)),
        }
    }
}

impl Future for CallHandle {
    type Output = Result<ReplyOutcome, SessionError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|res| res.map_err(|_| SessionError::SessionClosed))
    }
}
