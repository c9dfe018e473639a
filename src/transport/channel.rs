//! Context inboxes and private reply channels.
//!
//! Every context drains a single inbox. A reply channel is a one-way pipe
//! opened per relayed message: the receiving end travels with the envelope,
//! the sending end stays with the poster, which pushes the payload through it.

use crate::error::TransportError;
use crate::protocol::message::Message;
use crate::tree::context::ContextAddress;
use tokio::sync::mpsc;

/// Something delivered to a context
#[derive(Debug)]
pub enum Delivery {
    /// Envelope string, optionally paired with a reply port
    Posted {
        data: String,
        port: Option<ReplyPort>,
    },
    /// Same-process call on the context's aggregation entry point
    Invoked(Message),
}

/// Receiving side of a context inbox, held by its runtime
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Delivery>,
}

/// Sending side of a context inbox, held by the transport
#[derive(Debug, Clone)]
pub struct InboxSender {
    address: ContextAddress,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Inbox {
    pub fn new(address: ContextAddress) -> (Self, InboxSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Inbox { rx }, InboxSender { address, tx })
    }

    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Drain everything currently queued without waiting
    pub fn try_drain(&mut self) -> Vec<Delivery> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }
}

impl InboxSender {
    pub fn send(&self, delivery: Delivery) -> Result<(), TransportError> {
        self.tx
            .send(delivery)
            .map_err(|_| TransportError::InboxClosed(self.address.clone()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Open a private reply channel
pub fn reply_channel() -> (ReplySender, ReplyPort) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReplySender { tx }, ReplyPort { rx })
}

/// Poster's end of a reply channel
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::UnboundedSender<Message>,
}

/// Receiver's end of a reply channel, transferred with the envelope
#[derive(Debug)]
pub struct ReplyPort {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl ReplySender {
    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::ReplyChannelClosed)
    }
}

impl ReplyPort {
    /// Next message; `None` once the poster dropped its end and the port is empty
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}
