use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadAction,
    Validation,
    EngineFailure,
    Internal,
}

/// Conventional shape for a structured error carried in a reply's
/// `error` field. The session never interprets it; engines and hosts
/// that want structure over the opaque error value agree on this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyError {
    pub code: ErrorCode,
    pub message: String,
}

impl ReplyError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct EngineException {
    pub code: ErrorCode,
    pub message: String,
}

impl EngineException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<EngineException> for ReplyError {
    fn from(value: EngineException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
