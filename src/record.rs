//! Node records
//!
//! One record per node and session. A record starts either as a placeholder
//! (identifier only, not terminal) or directly as a terminal record, and turns
//! terminal at most once. After that it is frozen.

use crate::tree::id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result for one node of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Hierarchical identifier, the merge join key
    #[serde(rename = "windowId")]
    pub node_id: NodeId,

    /// No further updates will arrive for this node
    #[serde(default)]
    pub processed: bool,

    /// Terminality was forced by a timeout rather than a response
    #[serde(rename = "timeout", default, skip_serializing_if = "is_false")]
    pub timed_out: bool,

    /// Producer-defined data, absent for placeholders, timeouts and failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Effect of merging one incoming record over an accumulator entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeEffect {
    /// Entry was terminal already; incoming record discarded
    Frozen,
    /// Entry stayed non-terminal (placeholder over placeholder)
    Pending,
    /// Entry became terminal with this merge
    Terminated,
}

impl NodeRecord {
    /// Placeholder for a dispatched child whose response is still outstanding
    pub fn placeholder(node_id: NodeId) -> Self {
        Self {
            node_id,
            processed: false,
            timed_out: false,
            data: None,
        }
    }

    /// Successfully produced record
    pub fn completed(node_id: NodeId, data: Value) -> Self {
        Self {
            node_id,
            processed: true,
            timed_out: false,
            data: Some(data),
        }
    }

    /// Terminal record for a node whose producer failed
    pub fn failed(node_id: NodeId) -> Self {
        Self {
            node_id,
            processed: true,
            timed_out: false,
            data: None,
        }
    }

    /// Terminal record synthesized by a timeout
    pub fn timed_out(node_id: NodeId) -> Self {
        Self {
            node_id,
            processed: true,
            timed_out: true,
            data: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.processed
    }

    /// Apply `incoming` over this entry field by field.
    ///
    /// Terminal entries never change. Flags are taken from the incoming record;
    /// data only when the incoming record carries some, so a later placeholder
    /// cannot erase what an earlier partial response delivered.
    pub fn merge_from(&mut self, incoming: &NodeRecord) -> MergeEffect {
        if self.processed {
            return MergeEffect::Frozen;
        }
        self.processed = incoming.processed;
        self.timed_out = incoming.timed_out;
        if incoming.data.is_some() {
            self.data = incoming.data.clone();
        }
        if self.processed {
            MergeEffect::Terminated
        } else {
            MergeEffect::Pending
        }
    }
}
