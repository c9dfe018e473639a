//! Aggregation sessions: options snapshot, registry and merger, live view.

pub mod options;
pub mod registry;
pub mod view;

pub use options::{new_session_id, GatherOptions};
pub use registry::{CompletionSink, MergeOutcome, SessionRegistry, SweepReport};
pub use view::LiveView;
