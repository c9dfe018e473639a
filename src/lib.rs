//! frametree: recursive scatter/gather aggregation over a tree of isolated
//! contexts.
//!
//! A session started in one context collects a record from that context and
//! from every context nested below it, over a messaging channel that may lose,
//! reorder or duplicate anything. Branches that never answer are reported as
//! timed out instead of stalling the session, and the final records arrive
//! ordered deepest first.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod logging;
pub mod protocol;
pub mod record;
pub mod runtime;
pub mod session;
pub mod sim;
pub mod transport;
pub mod tree;

pub use error::{GatherError, ProduceError, TransportError};
pub use record::NodeRecord;
pub use runtime::{ContextRuntime, RuntimeHandle};
pub use session::{GatherOptions, LiveView};
pub use tree::{ContextAddress, ContextDocument, DataProducer, FrameElement, NodeId};
