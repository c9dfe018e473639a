//! CLI presentation: text and json formatters.

use crate::cli::parse::OutputFormat;
use crate::error::GatherError;
use crate::record::NodeRecord;
use crate::sim::spec::{Behavior, Boundary, TreeSpec};
use chrono::{DateTime, SecondsFormat, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

fn status_label(record: &NodeRecord) -> &'static str {
    match (record.processed, record.timed_out, record.data.is_some()) {
        (false, _, _) => "pending",
        (true, true, _) => "timed out",
        (true, false, true) => "ok",
        (true, false, false) => "failed",
    }
}

fn title_of(record: &NodeRecord) -> String {
    record
        .data
        .as_ref()
        .and_then(|data| data.get("title"))
        .and_then(Value::as_str)
        .unwrap_or("-")
        .to_string()
}

/// Ordered records as a table followed by a one-line summary
pub fn format_records_text(session_id: &str, records: &[NodeRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Node", "Depth", "Status", "Title"]);
    for record in records {
        table.add_row(vec![
            record.node_id.to_string(),
            record.node_id.depth().to_string(),
            status_label(record).to_string(),
            title_of(record),
        ]);
    }

    let timed_out = records.iter().filter(|r| r.timed_out).count();
    let failed = records
        .iter()
        .filter(|r| status_label(r) == "failed")
        .count();
    let summary = format!(
        "{} records, {} timed out, {} failed",
        records.len(),
        timed_out,
        failed
    );
    let summary = if timed_out + failed == 0 {
        summary.green().to_string()
    } else {
        summary.yellow().to_string()
    };

    format!("Session {}\n{}\n{}", session_id.bold(), table, summary)
}

pub fn format_records_json(
    session_id: &str,
    records: &[NodeRecord],
    completed_at: DateTime<Utc>,
) -> Result<String, GatherError> {
    let out = json!({
        "sessionId": session_id,
        "completedAt": completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "framesData": records,
    });
    serde_json::to_string_pretty(&out).map_err(|e| GatherError::Output(e.to_string()))
}

fn boundary_label(boundary: Boundary) -> &'static str {
    match boundary {
        Boundary::SameOrigin => "same-origin",
        Boundary::CrossOrigin => "cross-origin",
    }
}

fn behavior_label(behavior: Behavior) -> &'static str {
    match behavior {
        Behavior::Responsive => "responsive",
        Behavior::Silent => "silent",
        Behavior::Detached => "detached",
        Behavior::Failing => "failing",
    }
}

/// Identifier assignment of a tree, parents before children
pub fn format_assignments(spec: &TreeSpec, format: OutputFormat) -> Result<String, GatherError> {
    let assignments = spec.assignments();
    match format {
        OutputFormat::Json => {
            let rows: Vec<Value> = assignments
                .iter()
                .map(|(id, ctx)| {
                    json!({
                        "windowId": id,
                        "title": ctx.title,
                        "boundary": ctx.boundary,
                        "behavior": ctx.behavior,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).map_err(|e| GatherError::Output(e.to_string()))
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Node", "Title", "Boundary", "Behavior"]);
            for (id, ctx) in &assignments {
                let boundary = if id.is_root() {
                    "-"
                } else {
                    boundary_label(ctx.boundary)
                };
                table.add_row(vec![
                    id.to_string(),
                    ctx.title.clone(),
                    boundary.to_string(),
                    behavior_label(ctx.behavior).to_string(),
                ]);
            }
            Ok(table.to_string())
        }
    }
}
