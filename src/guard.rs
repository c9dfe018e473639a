//! Timeout guard
//!
//! Armed once per dispatched child at send time, without waiting on the send.
//! When it fires it reports a synthetic `{processed, timeout}` record for the
//! child to the session origin. The origin's merger ignores it if the child is
//! already terminal, which makes firing after a real response a no-op.

use crate::protocol::message::InitResponse;
use crate::record::NodeRecord;
use crate::transport::TransportAdapter;
use crate::tree::context::ContextAddress;
use crate::tree::id::NodeId;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

#[derive(Clone)]
pub struct TimeoutGuard {
    duration: Duration,
    adapter: TransportAdapter,
}

impl TimeoutGuard {
    pub fn new(duration: Duration, adapter: TransportAdapter) -> Self {
        Self { duration, adapter }
    }

    /// Arm the guard for `node_id`. Must be called from within a tokio runtime.
    pub fn arm(
        &self,
        origin: ContextAddress,
        session_id: String,
        node_id: NodeId,
    ) -> JoinHandle<()> {
        let adapter = self.adapter.clone();
        let duration = self.duration;
        tokio::spawn(async move {
            sleep(duration).await;
            debug!(
                session_id = %session_id,
                node_id = %node_id,
                origin = %origin,
                "timeout guard fired"
            );
            let response = InitResponse {
                frames_data: vec![NodeRecord::timed_out(node_id)],
                session_id,
            };
            if let Err(err) = adapter.send_response(&origin, response) {
                debug!(origin = %origin, error = %err, "timeout report not sent");
            }
        })
    }
}
