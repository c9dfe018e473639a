//! Host environment seams
//!
//! The protocol never looks inside a context. It only needs to enumerate the
//! embedded frames of a document (in document order), stamp each frame element
//! with its assigned identifier, peek into frames whose document is directly
//! inspectable, and ask a [`DataProducer`] for the record of a document.

use crate::error::ProduceError;
use crate::session::options::GatherOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Default prefix of the attribute stamped on frame elements
pub const DEFAULT_WINDOW_ID_ATTRIBUTE_PREFIX: &str = "data-frame-tree-window-id-";

/// Name of the attribute carrying a frame's identifier for one session
pub fn window_id_attribute_name(prefix: &str, session_id: &str) -> String {
    format!("{}{}", prefix, session_id)
}

/// Address of a context on the messaging transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextAddress(String);

impl ContextAddress {
    pub fn new(address: impl Into<String>) -> Self {
        ContextAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The locally inspectable state of one context
pub trait ContextDocument: Send + Sync + Sized + 'static {
    type Frame: FrameElement<Document = Self>;

    /// Embedded frame elements, in document order. The order defines sibling
    /// indices.
    fn frame_elements(&self) -> Vec<Self::Frame>;
}

/// An element of a document that embeds a child context
pub trait FrameElement: Send + Sync {
    type Document: ContextDocument;

    /// Record an attribute on the element so later consumers can find it
    fn set_attribute(&self, name: &str, value: &str);

    /// The child's document, when it can be read from the parent without
    /// crossing an isolation boundary
    fn content_document(&self) -> Option<Arc<Self::Document>>;

    /// Transport address of the child, `None` while it has no live window
    fn content_window(&self) -> Option<ContextAddress>;
}

/// Produces the data record of a single context.
///
/// Implementations must be purely local: no network I/O, no waiting on other
/// contexts.
pub trait DataProducer<D: ContextDocument>: Send + Sync {
    fn produce(&self, document: &D, options: &GatherOptions) -> Result<Value, ProduceError>;
}

impl<D, F> DataProducer<D> for F
where
    D: ContextDocument,
    F: Fn(&D, &GatherOptions) -> Result<Value, ProduceError> + Send + Sync,
{
    fn produce(&self, document: &D, options: &GatherOptions) -> Result<Value, ProduceError> {
        self(document, options)
    }
}
