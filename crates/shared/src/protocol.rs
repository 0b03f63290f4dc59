use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::CallId;

/// Action name of the bootstrap call issued once at session start.
pub const HANDSHAKE_ACTION: &str = "Initial";

/// One host-to-engine request. The session assigns `id`; `action` and
/// `payload` pass through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCall {
    pub action: String,
    pub payload: Value,
    pub id: CallId,
}

/// One engine-to-host message. A reply without `task_id` cannot be
/// correlated and is dropped by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<CallId>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// What a resolved call handle yields. Engine-side failures travel in
/// `error` as data, never as a thrown fault.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub payload: Value,
    pub error: Option<Value>,
}

impl ReplyOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
