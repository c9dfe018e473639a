//! Transport adapter
//!
//! Requests to children always go out as posted envelopes. Reports to the
//! session origin pick their route once per send: a direct call when the
//! transport says the origin is directly addressable from here, otherwise a
//! method-only envelope posted with a private reply port, followed by the full
//! payload over that port.

use crate::error::TransportError;
use crate::protocol::envelope;
use crate::protocol::message::{InitRequest, InitResponse, Message, Method};
use crate::transport::channel::reply_channel;
use crate::transport::Transport;
use crate::tree::context::ContextAddress;
use std::sync::Arc;

/// How a report reached (or was handed to) the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Relayed,
}

/// Per-context view of the transport
#[derive(Clone)]
pub struct TransportAdapter {
    local: ContextAddress,
    transport: Arc<dyn Transport>,
}

impl TransportAdapter {
    pub fn new(local: ContextAddress, transport: Arc<dyn Transport>) -> Self {
        Self { local, transport }
    }

    /// Post a dispatch request to a child context
    pub fn send_request(
        &self,
        target: &ContextAddress,
        request: InitRequest,
    ) -> Result<(), TransportError> {
        let data = envelope::encode(&Message::InitRequest(request))?;
        self.transport.post(target, data, None)
    }

    /// Report records to the session origin
    pub fn send_response(
        &self,
        origin: &ContextAddress,
        response: InitResponse,
    ) -> Result<Route, TransportError> {
        if self.transport.is_directly_addressable(&self.local, origin) {
            self.transport
                .invoke(origin, Message::InitResponse(response))?;
            return Ok(Route::Direct);
        }

        let (tx, port) = reply_channel();
        let intent = envelope::encode_intent(Method::InitResponse)?;
        self.transport.post(origin, intent, Some(port))?;
        tx.send(Message::InitResponse(response))?;
        Ok(Route::Relayed)
    }
}
