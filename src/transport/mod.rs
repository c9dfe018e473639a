//! Messaging transport
//!
//! The protocol assumes nothing from the channel beyond best-effort,
//! asynchronous delivery of tagged payloads and the ability to hand a private
//! reply port along with a message. Delivery may fail silently, reorder, or
//! duplicate.

pub mod adapter;
pub mod channel;
pub mod inproc;

use crate::error::TransportError;
use crate::protocol::message::Message;
use crate::tree::context::ContextAddress;

pub use adapter::{Route, TransportAdapter};
pub use channel::{reply_channel, Delivery, Inbox, InboxSender, ReplyPort, ReplySender};
pub use inproc::{InProcessNetwork, LinkState, NetworkStats};

/// The unreliable channel between contexts
pub trait Transport: Send + Sync {
    /// Whether `to` can be called directly from `from` without crossing an
    /// isolation boundary
    fn is_directly_addressable(&self, from: &ContextAddress, to: &ContextAddress) -> bool;

    /// Same-process call on the target's entry point
    fn invoke(&self, to: &ContextAddress, message: Message) -> Result<(), TransportError>;

    /// Post an envelope, optionally transferring a reply port with it.
    /// `Ok` does not imply delivery.
    fn post(
        &self,
        to: &ContextAddress,
        data: String,
        port: Option<ReplyPort>,
    ) -> Result<(), TransportError>;
}
