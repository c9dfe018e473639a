//! Session registry and response merger.
//!
//! Owned by the context that originated a session and touched only from that
//! context's runtime task. Each session accumulates one entry per node
//! identifier. A session completes, and is removed, as soon as a merge leaves
//! no non-terminal entry; its records are then delivered deepest first.
//!
//! Every non-terminal entry carries a deadline on the monotonic clock. The
//! runtime sweeps the registry periodically and forces overdue entries to a
//! timed-out terminal state, so completion never depends on a remote timeout
//! report actually arriving.

use crate::error::GatherError;
use crate::record::{MergeEffect, NodeRecord};
use crate::session::view::LiveView;
use crate::tree::id::{deepest_first, NodeId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Where the ordered records of a completed session go
#[derive(Debug)]
pub enum CompletionSink {
    /// Awaiting caller; fired at most once
    Callback(oneshot::Sender<Vec<NodeRecord>>),
    /// Polling caller; updated after every merge
    View(LiveView),
}

impl CompletionSink {
    fn deliver(self, session_id: &str, records: Vec<NodeRecord>) {
        match self {
            CompletionSink::Callback(tx) => {
                if tx.send(records).is_err() {
                    debug!(session_id = %session_id, "session caller went away before completion");
                }
            }
            CompletionSink::View(view) => view.complete(records),
        }
    }

    /// Release the caller of a session that will never complete
    fn abandon(self, session_id: &str) {
        match self {
            // Dropping the sender wakes the awaiting caller.
            CompletionSink::Callback(_) => {}
            CompletionSink::View(view) => view.abandon(session_id),
        }
    }
}

/// Result of feeding a batch (or a sweep) to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Session unknown or already completed; batch discarded
    UnknownSession,
    /// Session still open
    Pending { remaining: usize },
    /// Session completed and removed; `records` were delivered
    Completed { records: usize },
}

/// Entries forced terminal by one sweep of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub session_id: String,
    pub forced: Vec<NodeId>,
    pub outcome: MergeOutcome,
}

#[derive(Debug)]
struct Entry {
    record: NodeRecord,
    deadline: Option<Instant>,
}

#[derive(Debug)]
struct Session {
    entries: Vec<Entry>,
    index: HashMap<NodeId, usize>,
    sink: CompletionSink,
    started_at: Instant,
}

impl Session {
    fn new(sink: CompletionSink, started_at: Instant) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            sink,
            started_at,
        }
    }

    fn apply(&mut self, incoming: &NodeRecord, deadline: Instant) -> MergeEffect {
        match self.index.get(&incoming.node_id) {
            Some(&pos) => {
                let entry = &mut self.entries[pos];
                let effect = entry.record.merge_from(incoming);
                if effect == MergeEffect::Terminated {
                    entry.deadline = None;
                }
                effect
            }
            None => {
                let mut record = NodeRecord::placeholder(incoming.node_id.clone());
                let effect = record.merge_from(incoming);
                let deadline = (!record.is_terminal()).then_some(deadline);
                self.index.insert(record.node_id.clone(), self.entries.len());
                self.entries.push(Entry { record, deadline });
                effect
            }
        }
    }

    fn remaining(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.record.is_terminal())
            .count()
    }

    fn records(&self) -> Vec<NodeRecord> {
        self.entries.iter().map(|entry| entry.record.clone()).collect()
    }

    fn into_ordered(self) -> (CompletionSink, Vec<NodeRecord>) {
        let mut records: Vec<NodeRecord> =
            self.entries.into_iter().map(|entry| entry.record).collect();
        records.sort_by(|a, b| deepest_first(&a.node_id, &b.node_id));
        (self.sink, records)
    }
}

/// Active sessions of one origin context
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
    entry_deadline: Duration,
}

impl SessionRegistry {
    /// `entry_deadline` bounds how long a node may stay non-terminal after the
    /// origin first hears of it.
    pub fn new(entry_deadline: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            entry_deadline,
        }
    }

    /// Open a session. Fails if the identifier is already active.
    pub fn create(
        &mut self,
        session_id: &str,
        sink: CompletionSink,
        now: Instant,
    ) -> Result<(), GatherError> {
        if self.sessions.contains_key(session_id) {
            return Err(GatherError::DuplicateSession(session_id.to_string()));
        }
        self.sessions
            .insert(session_id.to_string(), Session::new(sink, now));
        debug!(session_id = %session_id, "session opened");
        Ok(())
    }

    /// Drop a session without delivering it. Returns its records, ordered.
    pub fn close(&mut self, session_id: &str) -> Option<Vec<NodeRecord>> {
        let session = self.sessions.remove(session_id)?;
        let (sink, records) = session.into_ordered();
        sink.abandon(session_id);
        debug!(session_id = %session_id, records = records.len(), "session closed");
        Some(records)
    }

    /// Close every open session. Returns how many there were.
    pub fn close_all(&mut self) -> usize {
        let open: Vec<String> = self.sessions.keys().cloned().collect();
        for session_id in &open {
            self.close(session_id);
        }
        open.len()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Non-terminal entries of a session, `None` if it is not active
    pub fn remaining(&self, session_id: &str) -> Option<usize> {
        self.sessions.get(session_id).map(Session::remaining)
    }

    /// Merge a batch of records into a session.
    ///
    /// Unknown sessions are ignored. Completion is decided once, after the
    /// whole batch is applied.
    pub fn merge(&mut self, session_id: &str, batch: &[NodeRecord], now: Instant) -> MergeOutcome {
        let deadline = now + self.entry_deadline;
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!(
                session_id = %session_id,
                batch = batch.len(),
                "discarding records for unknown session"
            );
            return MergeOutcome::UnknownSession;
        };

        for incoming in batch {
            let effect = session.apply(incoming, deadline);
            debug!(
                session_id = %session_id,
                node_id = %incoming.node_id,
                effect = ?effect,
                "merged node record"
            );
        }

        self.settle(session_id, now)
    }

    /// Force every overdue entry of every session to timed out
    pub fn sweep(&mut self, now: Instant) -> Vec<SweepReport> {
        let mut overdue: Vec<(String, Vec<NodeId>)> = Vec::new();
        for (session_id, session) in &self.sessions {
            let forced: Vec<NodeId> = session
                .entries
                .iter()
                .filter(|entry| entry.deadline.is_some_and(|deadline| deadline <= now))
                .map(|entry| entry.record.node_id.clone())
                .collect();
            if !forced.is_empty() {
                overdue.push((session_id.clone(), forced));
            }
        }

        let mut reports = Vec::with_capacity(overdue.len());
        for (session_id, forced) in overdue {
            if let Some(session) = self.sessions.get_mut(&session_id) {
                for node_id in &forced {
                    session.apply(&NodeRecord::timed_out(node_id.clone()), now);
                }
            }
            warn!(
                session_id = %session_id,
                forced = forced.len(),
                "sweep forced overdue nodes to timed out"
            );
            let outcome = self.settle(&session_id, now);
            reports.push(SweepReport {
                session_id,
                forced,
                outcome,
            });
        }
        reports
    }

    fn settle(&mut self, session_id: &str, now: Instant) -> MergeOutcome {
        let Some(session) = self.sessions.get(session_id) else {
            return MergeOutcome::UnknownSession;
        };
        let remaining = session.remaining();
        if remaining > 0 || session.entries.is_empty() {
            if let CompletionSink::View(view) = &session.sink {
                view.update(&session.records());
            }
            return MergeOutcome::Pending { remaining };
        }

        let Some(session) = self.sessions.remove(session_id) else {
            return MergeOutcome::UnknownSession;
        };
        let elapsed_ms = now.saturating_duration_since(session.started_at).as_millis();
        let (sink, records) = session.into_ordered();
        let count = records.len();
        let timed_out = records.iter().filter(|r| r.timed_out).count();
        info!(
            session_id = %session_id,
            records = count,
            timed_out,
            elapsed_ms = elapsed_ms as u64,
            "session complete"
        );
        sink.deliver(session_id, records);
        MergeOutcome::Completed { records: count }
    }
}
