//! Polling call shape

use crate::integration::test_utils::{config, ids, tree};
use frametree::sim::SimulatedTree;
use frametree::{GatherError, GatherOptions, NodeId};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_view_fills_in_and_completes() {
    let spec = tree(
        r#"
[root]
title = "Top"

[[root.frames]]
title = "Ad"
boundary = "cross-origin"
behavior = "silent"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let view = sim.top().gather_view(GatherOptions::new("poll")).await.unwrap();

    assert!(!view.is_complete());
    let partial = view.snapshot();
    assert_eq!(partial.len(), 2);
    let root = partial.iter().find(|r| r.node_id.is_root()).unwrap();
    assert!(root.processed);
    let child = partial.iter().find(|r| r.node_id == NodeId::from("0.0")).unwrap();
    assert!(!child.processed);

    let records = view.completed().await.unwrap();
    assert!(view.is_complete());
    assert_eq!(ids(&records), vec!["0.0", "0"]);
    assert!(records[0].timed_out);
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_root_only_view_is_complete_on_return() {
    let sim = SimulatedTree::launch(&tree("[root]\ntitle = \"Top\"\n"), &config()).unwrap();
    let view = sim.top().gather_view(GatherOptions::new("now")).await.unwrap();
    assert!(view.is_complete());
    assert_eq!(view.len(), 1);
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_open_view() {
    let spec = tree(
        r#"
[root]
title = "Top"

[[root.frames]]
title = "Ad"
boundary = "cross-origin"
behavior = "silent"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let view = sim.top().gather_view(GatherOptions::new("cut")).await.unwrap();
    sim.top().shutdown();

    let result = tokio::time::timeout(Duration::from_secs(3600), view.completed())
        .await
        .expect("waiter released by shutdown");
    assert!(matches!(result, Err(GatherError::SessionAbandoned(ref id)) if id == "cut"));
    assert!(view.is_abandoned());
    assert!(!view.is_complete());
    assert_eq!(view.len(), 2);
    sim.shutdown().await;
}
