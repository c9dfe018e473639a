//! Property-based tests for identifier assignment and session completeness

use frametree::config::GatherConfig;
use frametree::sim::{Behavior, Boundary, ContextSpec, SimulatedTree, TreeSpec};
use frametree::{GatherOptions, NodeId, NodeRecord};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Expected {
    Completed,
    Failed,
    TimedOut,
}

fn boundary() -> impl Strategy<Value = Boundary> {
    prop_oneof![Just(Boundary::SameOrigin), Just(Boundary::CrossOrigin)]
}

fn behavior() -> impl Strategy<Value = Behavior> {
    prop_oneof![
        4 => Just(Behavior::Responsive),
        1 => Just(Behavior::Silent),
        1 => Just(Behavior::Detached),
        1 => Just(Behavior::Failing),
    ]
}

fn frame() -> impl Strategy<Value = ContextSpec> {
    let leaf = (boundary(), behavior())
        .prop_map(|(b, h)| ContextSpec::new("frame").with_boundary(b).with_behavior(h))
        .boxed();
    leaf.clone().prop_recursive(3, 24, 3, move |inner| {
        (leaf.clone(), prop::collection::vec(inner, 0..3)).prop_map(|(mut spec, frames)| {
            spec.frames = frames;
            spec
        })
    })
}

fn tree_spec() -> impl Strategy<Value = TreeSpec> {
    (prop::collection::vec(frame(), 0..4), any::<bool>()).prop_map(|(frames, failing)| {
        let behavior = if failing {
            Behavior::Failing
        } else {
            Behavior::Responsive
        };
        let mut root = ContextSpec::new("top").with_behavior(behavior);
        root.frames = frames;
        TreeSpec::new(root)
    })
}

/// Whether a context dispatches to its own frames at all
fn dispatches(spec: &ContextSpec) -> bool {
    match spec.behavior {
        Behavior::Detached => false,
        Behavior::Silent => spec.boundary == Boundary::SameOrigin,
        _ => true,
    }
}

fn outcome(spec: &ContextSpec) -> Expected {
    if !dispatches(spec) {
        Expected::TimedOut
    } else if spec.behavior == Behavior::Failing {
        Expected::Failed
    } else {
        Expected::Completed
    }
}

fn expected(spec: &ContextSpec, id: NodeId, out: &mut HashMap<NodeId, Expected>) {
    out.insert(id.clone(), outcome(spec));
    if !dispatches(spec) {
        return;
    }
    for (index, child) in spec.frames.iter().enumerate() {
        expected(child, id.child(index), out);
    }
}

fn gather(spec: &TreeSpec, session_id: &str) -> Vec<NodeRecord> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    runtime.block_on(async {
        let sim = SimulatedTree::launch(spec, &GatherConfig::default()).unwrap();
        let records = sim.top().gather(GatherOptions::new(session_id)).await.unwrap();
        sim.shutdown().await;
        records
    })
}

fn status(record: &NodeRecord) -> Expected {
    if record.timed_out {
        Expected::TimedOut
    } else if record.data.is_some() {
        Expected::Completed
    } else {
        Expected::Failed
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Exactly one terminal record per reachable node, with the outcome its
    /// behavior implies
    #[test]
    fn test_every_reachable_node_reported_once(spec in tree_spec()) {
        let records = gather(&spec, "prop");

        let mut want = HashMap::new();
        expected(&spec.root, NodeId::root(), &mut want);

        let mut seen = HashSet::new();
        for record in &records {
            prop_assert!(seen.insert(record.node_id.clone()), "duplicate {}", record.node_id);
            prop_assert!(record.processed);
            prop_assert_eq!(
                want.get(&record.node_id).copied(),
                Some(status(record)),
                "{}",
                record.node_id
            );
        }
        prop_assert_eq!(seen.len(), want.len());
    }

    /// Descendants precede ancestors and every parent is present
    #[test]
    fn test_output_order_and_prefix_closure(spec in tree_spec()) {
        let records = gather(&spec, "order");
        let ids: HashSet<NodeId> = records.iter().map(|r| r.node_id.clone()).collect();

        for pair in records.windows(2) {
            prop_assert!(pair[0].node_id.depth() >= pair[1].node_id.depth());
        }
        for id in &ids {
            prop_assert!(id.is_well_formed());
            if let Some(parent) = id.parent() {
                prop_assert!(ids.contains(&parent), "{} without parent", id);
            }
        }
        prop_assert_eq!(records.last().map(|r| r.node_id.clone()), Some(NodeId::root()));
    }

    /// The same tree yields the same identifiers and outcomes every time
    #[test]
    fn test_repeated_sessions_agree(spec in tree_spec()) {
        let summarize = |records: Vec<NodeRecord>| {
            let mut summary: Vec<(String, Expected)> = records
                .iter()
                .map(|r| (r.node_id.to_string(), status(r)))
                .collect();
            summary.sort_by(|a, b| a.0.cmp(&b.0));
            summary
        };
        let first = summarize(gather(&spec, "first"));
        let second = summarize(gather(&spec, "second"));
        prop_assert_eq!(first, second);
    }
}
