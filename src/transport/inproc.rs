//! In-process message network
//!
//! Every context attaches under its address and security origin and gets an
//! inbox back. Contexts that share a security origin can call each other
//! directly; everything else goes through posted envelopes. A link can be
//! switched to dropping mode, in which the network silently loses every
//! message addressed to that context, the way an unresponsive frame behaves.

use crate::error::TransportError;
use crate::protocol::message::Message;
use crate::transport::channel::{Delivery, Inbox, InboxSender, ReplyPort};
use crate::transport::Transport;
use crate::tree::context::ContextAddress;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Delivery behavior of one context's inbound link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Open,
    /// Accept and lose everything
    Dropping,
}

#[derive(Debug, Clone)]
struct Endpoint {
    security_origin: String,
    sender: InboxSender,
    link: LinkState,
}

/// Traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub delivered: u64,
    pub dropped: u64,
}

/// Shared in-process network connecting context runtimes
#[derive(Debug, Default)]
pub struct InProcessNetwork {
    endpoints: RwLock<HashMap<ContextAddress, Endpoint>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl InProcessNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a context, replacing any previous endpoint at the same address
    pub fn attach(&self, address: ContextAddress, security_origin: impl Into<String>) -> Inbox {
        let (inbox, sender) = Inbox::new(address.clone());
        let endpoint = Endpoint {
            security_origin: security_origin.into(),
            sender,
            link: LinkState::Open,
        };
        self.endpoints.write().insert(address, endpoint);
        inbox
    }

    /// Returns true if the address was attached
    pub fn detach(&self, address: &ContextAddress) -> bool {
        self.endpoints.write().remove(address).is_some()
    }

    /// Returns false if the address is not attached
    pub fn set_link(&self, address: &ContextAddress, link: LinkState) -> bool {
        match self.endpoints.write().get_mut(address) {
            Some(endpoint) => {
                endpoint.link = link;
                true
            }
            None => false,
        }
    }

    pub fn security_origin(&self, address: &ContextAddress) -> Option<String> {
        self.endpoints
            .read()
            .get(address)
            .map(|endpoint| endpoint.security_origin.clone())
    }

    pub fn contains(&self, address: &ContextAddress) -> bool {
        self.endpoints.read().contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn deliver(&self, to: &ContextAddress, delivery: Delivery) -> Result<(), TransportError> {
        let (sender, link) = {
            let endpoints = self.endpoints.read();
            let endpoint = endpoints
                .get(to)
                .ok_or_else(|| TransportError::Unreachable(to.clone()))?;
            (endpoint.sender.clone(), endpoint.link)
        };

        if link == LinkState::Dropping {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(address = %to, "link dropping, message lost");
            return Ok(());
        }

        sender.send(delivery)?;
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Transport for InProcessNetwork {
    fn is_directly_addressable(&self, from: &ContextAddress, to: &ContextAddress) -> bool {
        let endpoints = self.endpoints.read();
        match (endpoints.get(from), endpoints.get(to)) {
            (Some(a), Some(b)) => a.security_origin == b.security_origin,
            _ => false,
        }
    }

    fn invoke(&self, to: &ContextAddress, message: Message) -> Result<(), TransportError> {
        debug!(address = %to, method = message.method().as_str(), "direct invocation");
        self.deliver(to, Delivery::Invoked(message))
    }

    fn post(
        &self,
        to: &ContextAddress,
        data: String,
        port: Option<ReplyPort>,
    ) -> Result<(), TransportError> {
        debug!(address = %to, with_port = port.is_some(), "posting envelope");
        self.deliver(to, Delivery::Posted { data, port })
    }
}
