//! Protocol messages and their envelope encoding.

pub mod envelope;
pub mod message;

pub use envelope::{decode, encode, encode_intent, Inbound, MESSAGE_PREFIX};
pub use message::{InitRequest, InitResponse, Message, Method};
