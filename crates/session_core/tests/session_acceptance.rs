//! End-to-end acceptance: a session talking to an engine across real
//! channel boundaries, with replies delivered from a separate task.

use std::sync::Arc;

use serde_json::{json, Value};
use session_core::{Engine, Session, SessionError};
use shared::error::{ErrorCode, ReplyError};
use shared::protocol::{EngineReply, OutboundCall, HANDSHAKE_ACTION};
use tokio::sync::mpsc;

struct ChannelEngine {
    tx: mpsc::UnboundedSender<OutboundCall>,
}

impl Engine for ChannelEngine {
    fn submit(&self, call: OutboundCall) {
        let _ = self.tx.send(call);
    }
}

#[tokio::test]
async fn handshake_queue_and_replies_flow_end_to_end() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (session, handshake) =
        Session::connect(Arc::new(ChannelEngine { tx }), json!({"bootstrap": true}));

    // Sent before the engine has acknowledged the handshake.
    let first = session.send("alpha", json!(1)).unwrap();
    let second = session.send("beta", json!(2)).unwrap();
    assert!(!session.is_ready());

    let responder = {
        let session = session.clone();
        tokio::spawn(async move {
            while let Some(call) = rx.recv().await {
                session.handle_reply(EngineReply {
                    task_id: Some(call.id),
                    payload: json!({"echo": call.action}),
                    error: None,
                });
            }
        })
    };

    assert_eq!(
        handshake.await.unwrap().payload,
        json!({"echo": HANDSHAKE_ACTION})
    );
    assert_eq!(first.await.unwrap().payload, json!({"echo": "alpha"}));
    assert_eq!(second.await.unwrap().payload, json!({"echo": "beta"}));
    assert!(session.is_ready());
    assert_eq!(session.pending_calls(), 0);
    assert_eq!(session.queued_calls(), 0);

    session.close();
    responder.abort();
}

#[tokio::test]
async fn engine_errors_arrive_as_data_not_faults() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (session, handshake) = Session::connect(Arc::new(ChannelEngine { tx }), Value::Null);

    let responder = {
        let session = session.clone();
        tokio::spawn(async move {
            while let Some(call) = rx.recv().await {
                let error = (call.action == "explode").then(|| {
                    serde_json::to_value(ReplyError::new(
                        ErrorCode::EngineFailure,
                        "engine exploded",
                    ))
                    .unwrap_or_default()
                });
                session.handle_reply(EngineReply {
                    task_id: Some(call.id),
                    payload: Value::Null,
                    error,
                });
            }
        })
    };

    handshake.await.unwrap();
    let outcome = session.send("explode", Value::Null).unwrap().await.unwrap();
    assert!(outcome.is_error());
    let error = outcome.error.unwrap();
    assert_eq!(error["code"], json!("engine_failure"));
    assert_eq!(error["message"], json!("engine exploded"));

    responder.abort();
}

#[tokio::test]
async fn closing_mid_flight_fails_outstanding_work() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (session, handshake) = Session::connect(Arc::new(ChannelEngine { tx }), Value::Null);

    // Acknowledge only the handshake, then go silent.
    let ack = {
        let session = session.clone();
        tokio::spawn(async move {
            if let Some(call) = rx.recv().await {
                session.handle_reply(EngineReply {
                    task_id: Some(call.id),
                    payload: Value::Null,
                    error: None,
                });
            }
        })
    };
    handshake.await.unwrap();
    ack.await.unwrap();

    let orphan = session.send("never-answered", Value::Null).unwrap();
    session.close();
    assert_eq!(orphan.await.unwrap_err(), SessionError::SessionClosed);
}
