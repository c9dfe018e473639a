//! Context Tree
//!
//! Naming of the nodes of a context tree and the seams through which the
//! protocol reaches the host environment: child enumeration, frame element
//! stamping, and the per-context data producer.

pub mod context;
pub mod id;

pub use context::{
    window_id_attribute_name, ContextAddress, ContextDocument, DataProducer, FrameElement,
};
pub use id::{deepest_first, NodeId};
