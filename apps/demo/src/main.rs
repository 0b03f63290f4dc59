use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::{json, Value};
use session_core::{Engine, Session};
use shared::error::{EngineException, ErrorCode, ReplyError};
use shared::protocol::{EngineReply, OutboundCall, HANDSHAKE_ACTION};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
struct Args {
    /// Number of echo actions to push through the session.
    #[arg(long, default_value_t = 3)]
    calls: u32,
}

/// In-process stand-in for the real engine: accepts submitted calls on
/// a channel and answers them from a separate task.
struct LoopbackEngine {
    tx: mpsc::UnboundedSender<OutboundCall>,
}

impl Engine for LoopbackEngine {
    fn submit(&self, call: OutboundCall) {
        let _ = self.tx.send(call);
    }
}

fn run_action(call: &OutboundCall) -> std::result::Result<Value, EngineException> {
    match call.action.as_str() {
        HANDSHAKE_ACTION | "echo" => Ok(call.payload.clone()),
        other => Err(EngineException::new(
            ErrorCode::BadAction,
            format!("unknown action '{other}'"),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (session, handshake) =
        Session::connect(Arc::new(LoopbackEngine { tx }), json!({"demo": true}));

    // All of these queue: the engine has not acknowledged the handshake yet.
    let mut handles = Vec::new();
    for n in 0..args.calls {
        handles.push(session.send("echo", json!({"n": n}))?);
    }
    let failing = session.send("unsupported", Value::Null)?;

    {
        let session = session.clone();
        tokio::spawn(async move {
            while let Some(call) = rx.recv().await {
                let reply = match run_action(&call) {
                    Ok(payload) => EngineReply {
                        task_id: Some(call.id),
                        payload,
                        error: None,
                    },
                    Err(err) => EngineReply {
                        task_id: Some(call.id),
                        payload: Value::Null,
                        error: Some(
                            serde_json::to_value(ReplyError::from(err)).unwrap_or_default(),
                        ),
                    },
                };
                session.handle_reply(reply);
            }
        });
    }

    let boot = handshake.await?;
    println!("handshake acknowledged: {}", boot.payload);

    for handle in handles {
        let id = handle.id();
        let outcome = handle.await?;
        println!("call {} resolved: {}", id.0, outcome.payload);
    }

    let failure = failing.await?;
    println!(
        "engine error carried as data: {}",
        failure.error.unwrap_or_default()
    );

    session.close();
    Ok(())
}
