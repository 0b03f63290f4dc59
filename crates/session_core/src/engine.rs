use shared::protocol::OutboundCall;

/// Entry point into the computational engine.
///
/// `submit` is fire-and-forget: it returns nothing and must not block.
/// Replies arrive later through the separate inbound channel, i.e. the
/// host runtime invoking [`crate::Session::handle_reply`]. An engine
/// may reply synchronously from inside `submit`, out of order, or
/// never.
pub trait Engine: Send + Sync {
    fn submit(&self, call: OutboundCall);
}
