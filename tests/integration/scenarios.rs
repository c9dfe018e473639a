//! End-to-end sessions over simulated trees

use crate::integration::test_utils::{assert_well_ordered, config, ids, record, title, tree};
use frametree::error::ProduceError;
use frametree::sim::{SimDocument, SimulatedTree};
use frametree::{DataProducer, GatherOptions, NodeId, NodeRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// `{"x": <content as integer>}` for every document
fn numeric_producer() -> Arc<dyn DataProducer<SimDocument>> {
    Arc::new(
        |doc: &SimDocument, _: &GatherOptions| -> Result<Value, ProduceError> {
            let x: i64 = doc
                .content
                .parse()
                .map_err(|_| ProduceError(format!("not a number: {}", doc.content)))?;
            Ok(json!({ "x": x }))
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_root_only_tree() {
    let sim = SimulatedTree::launch(&tree("[root]\ntitle = \"Top\"\n"), &config()).unwrap();
    let records = sim.top().gather(GatherOptions::new("a")).await.unwrap();

    assert_eq!(ids(&records), vec!["0"]);
    assert!(records[0].processed);
    assert!(!records[0].timed_out);
    assert_eq!(title(&records[0]), Some("Top"));
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_two_responsive_children() {
    let spec = tree(
        r#"
[root]
content = "0"

[[root.frames]]
content = "1"
boundary = "cross-origin"

[[root.frames]]
content = "2"
boundary = "cross-origin"
"#,
    );
    let sim = SimulatedTree::launch_with_producer(&spec, &config(), numeric_producer()).unwrap();
    let started = Instant::now();
    let records = sim.top().gather(GatherOptions::new("b")).await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(records.len(), 3);
    assert_well_ordered(&records);
    assert_eq!(records[2].node_id, NodeId::root());
    assert_eq!(record(&records, "0.0").data, Some(json!({"x": 1})));
    assert_eq!(record(&records, "0.1").data, Some(json!({"x": 2})));
    assert!(records.iter().all(|r| r.processed && !r.timed_out));
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_silent_child_times_out() {
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
    let started = Instant::now();
    let records = sim.top().gather(GatherOptions::new("c")).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(500), "completed after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(750), "completed after {:?}", elapsed);
    assert_eq!(ids(&records), vec!["0.0", "0"]);
    assert_eq!(records[0], NodeRecord::timed_out(NodeId::from("0.0")));
    assert!(records[1].processed && !records[1].timed_out);
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_same_origin_children_need_no_round_trip() {
    let spec = tree(
        r#"
[root]
title = "Top"

[[root.frames]]
title = "A"

[[root.frames.frames]]
title = "A1"

[[root.frames]]
title = "B"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let records = sim.top().gather(GatherOptions::new("inline")).await.unwrap();

    assert_eq!(ids(&records), vec!["0.0.0", "0.0", "0.1", "0"]);
    assert_eq!(title(record(&records, "0.0.0")), Some("A1"));
    // Nothing was posted: every frame was read in place.
    assert_eq!(sim.network().stats().delivered, 0);
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_deep_mixed_tree() {
    let spec = tree(
        r#"
[root]
title = "Top"

[[root.frames]]
title = "Same"

[[root.frames.frames]]
title = "Remote under same"
boundary = "cross-origin"

[[root.frames.frames.frames]]
title = "Same under remote"

[[root.frames.frames.frames]]
title = "Remote under remote"
boundary = "cross-origin"

[[root.frames]]
title = "Broken"
boundary = "cross-origin"
behavior = "failing"

[[root.frames]]
title = "Gone"
boundary = "cross-origin"
behavior = "detached"

[[root.frames]]
title = "Quiet"
boundary = "cross-origin"
behavior = "silent"

[[root.frames.frames]]
title = "Behind quiet"
boundary = "cross-origin"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let records = sim.top().gather(GatherOptions::new("deep")).await.unwrap();

    assert_well_ordered(&records);
    let mut got = ids(&records);
    got.sort();
    assert_eq!(
        got,
        vec!["0", "0.0", "0.0.0", "0.0.0.0", "0.0.0.1", "0.1", "0.2", "0.3"]
    );
    // Never reached: its parent drops every message.
    assert!(!got.contains(&"0.3.0".to_string()));

    assert_eq!(title(record(&records, "0.0.0.0")), Some("Same under remote"));
    assert_eq!(title(record(&records, "0.0.0.1")), Some("Remote under remote"));
    assert_eq!(record(&records, "0.1"), &NodeRecord::failed(NodeId::from("0.1")));
    assert_eq!(record(&records, "0.2"), &NodeRecord::timed_out(NodeId::from("0.2")));
    assert_eq!(record(&records, "0.3"), &NodeRecord::timed_out(NodeId::from("0.3")));
    assert!(records.iter().all(|r| r.processed));
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_root_still_completes() {
    let spec = tree(
        r#"
[root]
title = "Top"
behavior = "failing"

[[root.frames]]
title = "Child"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let records = sim.top().gather(GatherOptions::new("f")).await.unwrap();

    assert_eq!(ids(&records), vec!["0.0", "0"]);
    assert_eq!(records[1], NodeRecord::failed(NodeId::root()));
    assert_eq!(title(&records[0]), Some("Child"));
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_session_from_nested_context() {
    let spec = tree(
        r#"
[root]
title = "Top"

[[root.frames]]
title = "Widget"
boundary = "cross-origin"

[[root.frames.frames]]
title = "Inner"
boundary = "cross-origin"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let widget = sim.context("0.0").unwrap().clone();
    let records = widget.gather(GatherOptions::new("nested")).await.unwrap();

    // Identifiers are relative to the originating context.
    assert_eq!(ids(&records), vec!["0.0", "0"]);
    assert_eq!(title(&records[0]), Some("Inner"));
    assert_eq!(title(&records[1]), Some("Widget"));
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_frames_are_stamped_per_session() {
    let spec = tree(
        r#"
[root]
title = "Top"
content = "<main>"

[[root.frames]]
title = "Remote"
boundary = "cross-origin"

[[root.frames.frames]]
title = "Nested"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let records = sim.top().gather(GatherOptions::new("s1")).await.unwrap();
    sim.top().gather(GatherOptions::new("s2")).await.unwrap();

    let attribute = "data-frame-tree-window-id-s1";
    assert_eq!(sim.frame("0.0").unwrap().attribute(attribute).as_deref(), Some("0.0"));
    // Stamped by the remote context, which owns that frame element.
    assert_eq!(sim.frame("0.0.0").unwrap().attribute(attribute).as_deref(), Some("0.0.0"));
    assert_eq!(
        sim.frame("0.0").unwrap().attribute("data-frame-tree-window-id-s2").as_deref(),
        Some("0.0")
    );

    let content = record(&records, "0").data.as_ref().unwrap()["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(content, "<main><iframe data-frame-tree-window-id-s1=\"0.0\"></iframe>");
    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_options_reach_every_producer() {
    let spec = tree(
        r#"
[root]
title = "Top"
content = "body"

[[root.frames]]
title = "Remote"
content = "remote body"
boundary = "cross-origin"
"#,
    );
    let sim = SimulatedTree::launch(&spec, &config()).unwrap();
    let options = GatherOptions::new("lean").with_setting("includeContent", json!(false));
    let records = sim.top().gather(options).await.unwrap();

    assert_eq!(records.len(), 2);
    for r in &records {
        assert!(r.data.as_ref().unwrap().get("content").is_none());
    }
    sim.shutdown().await;
}
