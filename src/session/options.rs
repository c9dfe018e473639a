//! Session options snapshot
//!
//! The caller's options are captured once, by value, when a session starts.
//! Every branch of the dispatch shares the same immutable snapshot through an
//! `Arc`, and remote contexts receive their own copy over the wire.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Wire key of the session id; reserved, never a setting
const SESSION_ID_KEY: &str = "sessionId";

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh session id, unique within this process
pub fn new_session_id() -> String {
    let ts = Utc::now().timestamp_millis();
    let pid = std::process::id();
    let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("sess-{ts}-{pid}-{seq}")
}

/// Options of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherOptions {
    /// Caller-unique among the origin's active sessions
    pub session_id: String,

    /// Producer configuration, opaque to the protocol. Serialized flat next
    /// to the session id, so it never holds `sessionId` itself.
    #[serde(flatten)]
    settings: Map<String, Value>,
}

impl GatherOptions {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            settings: Map::new(),
        }
    }

    /// Builder-style setting insertion. The reserved `sessionId` key is
    /// dropped; use [`GatherOptions::new`] for the session id.
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key == SESSION_ID_KEY {
            warn!(session_id = %self.session_id, "ignoring sessionId passed as a setting");
            return self;
        }
        self.settings.insert(key, value);
        self
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}
