//! Wire messages
//!
//! Two methods travel between contexts: `initRequest` asks a context to start
//! its local dispatch, `initResponse` reports node records to the session
//! origin.

use crate::record::NodeRecord;
use crate::session::options::GatherOptions;
use crate::tree::context::ContextAddress;
use crate::tree::id::NodeId;
use serde::{Deserialize, Serialize};

/// Method tag carried by every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    InitRequest,
    InitResponse,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::InitRequest => "initRequest",
            Method::InitResponse => "initResponse",
        }
    }
}

/// Ask a context to produce its record and dispatch to its own children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    /// Identifier assigned to the receiving context
    pub window_id: NodeId,
    pub session_id: String,
    pub options: GatherOptions,
    /// Where every report of this session must go
    pub origin: ContextAddress,
}

/// One or more node records for the session origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub frames_data: Vec<NodeRecord>,
    pub session_id: String,
}

/// Tagged protocol message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Message {
    InitRequest(InitRequest),
    InitResponse(InitResponse),
}

impl Message {
    pub fn method(&self) -> Method {
        match self {
            Message::InitRequest(_) => Method::InitRequest,
            Message::InitResponse(_) => Method::InitResponse,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Message::InitRequest(request) => &request.session_id,
            Message::InitResponse(response) => &response.session_id,
        }
    }
}
