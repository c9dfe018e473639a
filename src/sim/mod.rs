//! Simulated context trees
//!
//! A tree of contexts described in TOML, each context running its own
//! [`ContextRuntime`](crate::runtime::ContextRuntime) on a shared
//! [`InProcessNetwork`](crate::transport::InProcessNetwork). Used by the CLI and
//! the integration tests.

pub mod document;
pub mod launch;
pub mod spec;

pub use document::{SimDocument, SimFrame, SnapshotProducer};
pub use launch::SimulatedTree;
pub use spec::{Behavior, Boundary, ContextSpec, TreeSpec};
