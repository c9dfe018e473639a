//! Live view over an in-progress session.
//!
//! Returned immediately by the polling call shape. The registry writes through
//! to it after every merge, and replaces its contents with the ordered result
//! once the session completes. A session dropped before completion, by
//! `close` or by its runtime stopping, marks the view abandoned instead.

use crate::error::GatherError;
use crate::record::NodeRecord;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct ViewState {
    records: Vec<NodeRecord>,
    complete: bool,
    /// Session id, set when the session was dropped undelivered
    abandoned: Option<String>,
}

/// Shared, in-place mutating handle to a session's records
#[derive(Debug, Clone)]
pub struct LiveView {
    state: Arc<RwLock<ViewState>>,
    done: Arc<watch::Sender<bool>>,
}

impl LiveView {
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(ViewState::default())),
            done: Arc::new(done),
        }
    }

    /// Copy of the records as currently known
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.state.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// True once the session has completed and the records are ordered
    pub fn is_complete(&self) -> bool {
        self.state.read().complete
    }

    /// True once the session was dropped without completing
    pub fn is_abandoned(&self) -> bool {
        self.state.read().abandoned.is_some()
    }

    /// Wait until the session completes, then return the ordered records.
    ///
    /// Fails with [`GatherError::SessionAbandoned`] if the session is dropped
    /// first; [`snapshot`](Self::snapshot) still holds the partial records.
    pub async fn completed(&self) -> Result<Vec<NodeRecord>, GatherError> {
        let mut rx = self.done.subscribe();
        // Sender lives in self, so the channel cannot close while we wait.
        let _ = rx.wait_for(|settled| *settled).await;
        let state = self.state.read();
        match &state.abandoned {
            Some(session_id) if !state.complete => {
                Err(GatherError::SessionAbandoned(session_id.clone()))
            }
            _ => Ok(state.records.clone()),
        }
    }

    pub(crate) fn update(&self, records: &[NodeRecord]) {
        let mut state = self.state.write();
        if state.complete || state.abandoned.is_some() {
            return;
        }
        state.records.clear();
        state.records.extend_from_slice(records);
    }

    pub(crate) fn complete(&self, records: Vec<NodeRecord>) {
        {
            let mut state = self.state.write();
            state.records = records;
            state.complete = true;
        }
        self.done.send_replace(true);
    }

    pub(crate) fn abandon(&self, session_id: &str) {
        {
            let mut state = self.state.write();
            if state.complete {
                return;
            }
            state.abandoned = Some(session_id.to_string());
        }
        self.done.send_replace(true);
    }
}

impl Default for LiveView {
    fn default() -> Self {
        Self::new()
    }
}
