use serde_json::json;

use crate::domain::CallId;
use crate::error::{EngineException, ErrorCode, ReplyError};
use crate::protocol::{EngineReply, OutboundCall};

#[test]
fn outbound_call_serializes_with_flat_fields() {
    let call = OutboundCall {
        action: "echo".to_string(),
        payload: json!([1, 2]),
        id: CallId(7),
    };
    let value = serde_json::to_value(&call).unwrap();
    assert_eq!(value, json!({"action": "echo", "payload": [1, 2], "id": 7}));
}

#[test]
fn engine_reply_tolerates_missing_task_id_and_error() {
    let reply: EngineReply = serde_json::from_value(json!({"payload": "x"})).unwrap();
    assert!(reply.task_id.is_none());
    assert_eq!(reply.payload, json!("x"));
    assert!(reply.error.is_none());

    let reply: EngineReply = serde_json::from_value(json!({})).unwrap();
    assert!(reply.task_id.is_none());
    assert!(reply.payload.is_null());
}

#[test]
fn engine_reply_round_trips_task_id_and_error() {
    let reply = EngineReply {
        task_id: Some(CallId(3)),
        payload: json!(null),
        error: Some(json!({"code": "engine_failure", "message": "boom"})),
    };
    let value = serde_json::to_value(&reply).unwrap();
    assert_eq!(
        value,
        json!({"task_id": 3, "payload": null, "error": {"code": "engine_failure", "message": "boom"}})
    );
    let back: EngineReply = serde_json::from_value(value).unwrap();
    assert_eq!(back.task_id, Some(CallId(3)));
    assert!(back.error.is_some());
}

#[test]
fn engine_exception_converts_to_reply_error_payload() {
    let err = EngineException::new(ErrorCode::BadAction, "unknown action 'nope'");
    let payload = serde_json::to_value(ReplyError::from(err)).unwrap();
    assert_eq!(payload["code"], json!("bad_action"));
    assert_eq!(payload["message"], json!("unknown action 'nope'"));
}
