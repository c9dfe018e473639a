//! Hierarchical node identifiers
//!
//! A node identifier is the dot-separated path of zero-based sibling indices
//! from the session origin down to a node: the origin is `"0"`, its third child
//! `"0.2"`, that child's first child `"0.2.0"`. Depth is the number of
//! separators, so identifiers assigned by one traversal are unique and their
//! depth grows strictly with tree depth.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of the session origin
pub const ROOT: &str = "0";

/// Separator between sibling indices
pub const SEPARATOR: char = '.';

/// Identifier of one node relative to the session origin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// The session origin's identifier
    pub fn root() -> Self {
        NodeId(ROOT.to_string())
    }

    /// Identifier of the `index`-th child (zero-based, enumeration order)
    pub fn child(&self, index: usize) -> Self {
        NodeId(format!("{}{}{}", self.0, SEPARATOR, index))
    }

    /// Number of separators; 0 for the origin
    pub fn depth(&self) -> usize {
        self.0.matches(SEPARATOR).count()
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Parent identifier, `None` for the origin
    pub fn parent(&self) -> Option<NodeId> {
        self.0
            .rfind(SEPARATOR)
            .map(|pos| NodeId(self.0[..pos].to_string()))
    }

    /// Sibling indices from the origin down, origin excluded
    pub fn path(&self) -> Vec<usize> {
        self.0
            .split(SEPARATOR)
            .skip(1)
            .filter_map(|segment| segment.parse().ok())
            .collect()
    }

    /// True when every segment is a decimal index and the first is the root
    pub fn is_well_formed(&self) -> bool {
        let mut segments = self.0.split(SEPARATOR);
        segments.next() == Some(ROOT)
            && segments.all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

/// Merge ordering: deeper identifiers first, so descendants precede ancestors.
///
/// Equal depths compare equal; use with a stable sort to keep arrival order
/// among siblings and cousins.
pub fn deepest_first(a: &NodeId, b: &NodeId) -> Ordering {
    b.depth().cmp(&a.depth())
}
