//! Error types for the frame tree aggregation protocol.
//!
//! Only [`GatherError`] ever reaches a session caller, and only for contract
//! violations (duplicate session id) or a session dropped by its runtime.
//! Everything that can go wrong inside the protocol itself is recovered
//! locally and shows up as a terminal record instead.

use crate::tree::context::ContextAddress;
use thiserror::Error;

/// Caller-facing errors
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("Session already active: {0}")]
    DuplicateSession(String),

    #[error("Context runtime is no longer running: {0}")]
    RuntimeClosed(ContextAddress),

    #[error("Session dropped before completion: {0}")]
    SessionAbandoned(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid tree description: {0}")]
    InvalidTree(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for GatherError {
    fn from(err: config::ConfigError) -> Self {
        GatherError::ConfigError(err.to_string())
    }
}

/// Failures of the unreliable messaging channel
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Context unreachable: {0}")]
    Unreachable(ContextAddress),

    #[error("Context has no live window")]
    NoWindow,

    #[error("Inbox closed for context: {0}")]
    InboxClosed(ContextAddress),

    #[error("Reply channel closed")]
    ReplyChannelClosed,

    #[error("Envelope encoding failed: {0}")]
    Codec(#[from] CodecError),
}

/// Envelope encoding and decoding errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Envelope is missing the namespace prefix")]
    MissingPrefix,

    #[error("Envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A data producer could not build the record for its context
#[derive(Debug, Error)]
#[error("Data producer failed: {0}")]
pub struct ProduceError(pub String);
