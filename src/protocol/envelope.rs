//! Envelope codec
//!
//! Envelopes share the channel with unrelated traffic, so every one is a
//! string made of a fixed namespace prefix followed by JSON. Anything else is
//! foreign and must be ignored by the receiver.
//!
//! A response envelope posted together with a reply port carries only its
//! method (`{"method":"initResponse"}`); the records follow over the port.

use crate::error::CodecError;
use crate::protocol::message::{InitRequest, InitResponse, Message, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace prefix of every envelope
pub const MESSAGE_PREFIX: &str = "__frameTree__::";

#[derive(Serialize, Deserialize)]
struct Intent {
    method: Method,
}

/// A decoded envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Request(InitRequest),
    /// Full response carried in the envelope itself
    Response(InitResponse),
    /// Response announced; payload arrives on the accompanying reply port
    ResponseIntent,
}

/// Encode a full message
pub fn encode(message: &Message) -> Result<String, CodecError> {
    Ok(format!("{}{}", MESSAGE_PREFIX, serde_json::to_string(message)?))
}

/// Encode the lightweight announcement posted alongside a reply port
pub fn encode_intent(method: Method) -> Result<String, CodecError> {
    Ok(format!(
        "{}{}",
        MESSAGE_PREFIX,
        serde_json::to_string(&Intent { method })?
    ))
}

/// Decode an envelope. Errors mean the data is not ours or is malformed.
pub fn decode(data: &str) -> Result<Inbound, CodecError> {
    let body = data
        .strip_prefix(MESSAGE_PREFIX)
        .ok_or(CodecError::MissingPrefix)?;
    let value: Value = serde_json::from_str(body)?;
    let Intent { method } = Intent::deserialize(&value)?;
    match method {
        Method::InitRequest => Ok(Inbound::Request(InitRequest::deserialize(&value)?)),
        Method::InitResponse if value.get("framesData").is_some() => {
            Ok(Inbound::Response(InitResponse::deserialize(&value)?))
        }
        Method::InitResponse => Ok(Inbound::ResponseIntent),
    }
}
