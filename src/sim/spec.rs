//! TOML description of a simulated tree.
//!
//! ```toml
//! [root]
//! title = "Top"
//! content = "<p>hello</p>"
//!
//! [[root.frames]]
//! title = "Ad"
//! boundary = "cross-origin"
//! behavior = "silent"
//! ```

use crate::error::GatherError;
use crate::tree::id::NodeId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Isolation between a frame and its parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Boundary {
    /// Shares the parent's security origin; inspectable and directly callable
    #[default]
    SameOrigin,
    /// Own security origin; reachable only through posted messages
    CrossOrigin,
}

/// How a simulated context behaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Behavior {
    #[default]
    Responsive,
    /// Exists, but every message addressed to it is lost
    Silent,
    /// The frame element has no live window
    Detached,
    /// Its data producer fails
    Failing,
}

/// One context and its embedded frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub boundary: Boundary,
    #[serde(default)]
    pub behavior: Behavior,
    #[serde(default)]
    pub frames: Vec<ContextSpec>,
}

impl ContextSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            boundary: Boundary::default(),
            behavior: Behavior::default(),
            frames: Vec::new(),
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_frame(mut self, frame: ContextSpec) -> Self {
        self.frames.push(frame);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSpec {
    pub root: ContextSpec,
}

impl TreeSpec {
    pub fn new(root: ContextSpec) -> Self {
        Self { root }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GatherError> {
        let spec: TreeSpec =
            toml::from_str(text).map_err(|e| GatherError::InvalidTree(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> Result<Self, GatherError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The top context must be live to originate sessions.
    pub fn validate(&self) -> Result<(), GatherError> {
        match self.root.behavior {
            Behavior::Detached => Err(GatherError::InvalidTree(
                "root context cannot be detached".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Identifier assignment of a session originated at the top, in document
    /// order (parents before children)
    pub fn assignments(&self) -> Vec<(NodeId, &ContextSpec)> {
        let mut out = Vec::new();
        collect(&self.root, NodeId::root(), &mut out);
        out
    }
}

fn collect<'a>(spec: &'a ContextSpec, id: NodeId, out: &mut Vec<(NodeId, &'a ContextSpec)>) {
    let children: Vec<NodeId> = (0..spec.frames.len()).map(|i| id.child(i)).collect();
    out.push((id, spec));
    for (child, child_id) in spec.frames.iter().zip(children) {
        collect(child, child_id, out);
    }
}
