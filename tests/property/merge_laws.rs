//! Property-based tests for the response merger
//!
//! An origin first learns of its children through one atomic batch, then
//! receives terminal records in any order, possibly duplicated, possibly
//! conflicting. The first terminal record per node must win.

use frametree::session::{CompletionSink, MergeOutcome, SessionRegistry};
use frametree::{NodeId, NodeRecord};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

fn child_ids(count: usize) -> Vec<NodeId> {
    // Two levels so ordering by depth is observable.
    (0..count)
        .map(|i| {
            let top = NodeId::root().child(i / 2);
            if i % 2 == 0 {
                top
            } else {
                top.child(i)
            }
        })
        .collect()
}

fn terminal(id: &NodeId, kind: u8, tag: u32) -> NodeRecord {
    match kind % 3 {
        0 => NodeRecord::completed(id.clone(), json!({ "tag": tag })),
        1 => NodeRecord::failed(id.clone()),
        _ => NodeRecord::timed_out(id.clone()),
    }
}

/// Child count, then a stream of (child index, record kind) deliveries
fn deliveries() -> impl Strategy<Value = (usize, Vec<(usize, u8)>)> {
    (1usize..12).prop_flat_map(|count| {
        let stream = prop::collection::vec((0..count, any::<u8>()), 0..40);
        (Just(count), stream).prop_map(move |(count, mut stream)| {
            // Every child gets at least one terminal record, somewhere.
            for index in 0..count {
                stream.push((index, index as u8));
            }
            (count, stream)
        })
    })
    .prop_flat_map(|(count, stream)| (Just(count), Just(stream).prop_shuffle()))
}

proptest! {
    #[test]
    fn test_first_terminal_record_wins((count, stream) in deliveries()) {
        let ids = child_ids(count);
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let (tx, mut rx) = oneshot::channel();
        let now = Instant::now();
        registry.create("s", CompletionSink::Callback(tx), now).unwrap();

        let mut first_batch = vec![NodeRecord::completed(NodeId::root(), json!({"root": true}))];
        first_batch.extend(ids.iter().cloned().map(NodeRecord::placeholder));
        let outcome = registry.merge("s", &first_batch, now);
        prop_assert_eq!(outcome, MergeOutcome::Pending { remaining: ids.len() });

        let mut winners: HashMap<NodeId, NodeRecord> = HashMap::new();
        let mut completions = 0;
        for (tag, (index, kind)) in stream.iter().enumerate() {
            let record = terminal(&ids[*index], *kind, tag as u32);
            let completed_before = completions > 0;
            match registry.merge("s", std::slice::from_ref(&record), now) {
                MergeOutcome::Completed { records } => {
                    completions += 1;
                    prop_assert_eq!(records, ids.len() + 1);
                }
                MergeOutcome::UnknownSession => {
                    prop_assert!(completed_before);
                }
                MergeOutcome::Pending { .. } => prop_assert!(!completed_before),
            }
            if !completed_before {
                winners.entry(record.node_id.clone()).or_insert(record);
            }
        }

        prop_assert_eq!(completions, 1);
        prop_assert!(!registry.contains("s"));
        let records = rx.try_recv().unwrap();
        prop_assert_eq!(records.len(), ids.len() + 1);

        for pair in records.windows(2) {
            prop_assert!(pair[0].node_id.depth() >= pair[1].node_id.depth());
        }
        for record in &records {
            if record.node_id.is_root() {
                prop_assert_eq!(record.data.clone(), Some(json!({"root": true})));
            } else {
                prop_assert_eq!(Some(record), winners.get(&record.node_id));
            }
        }
    }

    /// Placeholders arriving after a terminal record change nothing
    #[test]
    fn test_late_placeholders_are_inert(count in 1usize..8, repeats in 1usize..4) {
        let ids = child_ids(count);
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let (tx, _rx) = oneshot::channel();
        let now = Instant::now();
        registry.create("s", CompletionSink::Callback(tx), now).unwrap();

        let mut first_batch = vec![NodeRecord::completed(NodeId::root(), json!({}))];
        first_batch.extend(ids.iter().cloned().map(NodeRecord::placeholder));
        registry.merge("s", &first_batch, now);

        // Settle the first child, then re-announce it.
        registry.merge("s", &[NodeRecord::failed(ids[0].clone())], now);
        for _ in 0..repeats {
            let outcome = registry.merge("s", &[NodeRecord::placeholder(ids[0].clone())], now);
            if count > 1 {
                prop_assert_eq!(outcome, MergeOutcome::Pending { remaining: count - 1 });
            } else {
                prop_assert_eq!(outcome, MergeOutcome::UnknownSession);
            }
        }
    }
}
