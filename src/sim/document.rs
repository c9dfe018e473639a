//! Simulated documents, frame elements and the snapshot producer.

use crate::error::ProduceError;
use crate::session::options::GatherOptions;
use crate::tree::context::{ContextAddress, ContextDocument, DataProducer, FrameElement};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Local state of one simulated context
#[derive(Debug)]
pub struct SimDocument {
    pub title: String,
    pub content: String,
    pub base_uri: String,
    pub fails: bool,
    frames: Vec<SimFrame>,
}

impl SimDocument {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        base_uri: impl Into<String>,
        fails: bool,
        frames: Vec<SimFrame>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            base_uri: base_uri.into(),
            fails,
            frames,
        }
    }
}

#[derive(Debug)]
struct FrameInner {
    attributes: Mutex<BTreeMap<String, String>>,
    document: Option<Arc<SimDocument>>,
    window: Option<ContextAddress>,
}

/// A frame element embedding a child context. Clones share attributes.
#[derive(Debug, Clone)]
pub struct SimFrame {
    inner: Arc<FrameInner>,
}

impl SimFrame {
    /// `document` is set only when the child is inspectable from the parent,
    /// `window` only when the child is live.
    pub fn new(document: Option<Arc<SimDocument>>, window: Option<ContextAddress>) -> Self {
        Self {
            inner: Arc::new(FrameInner {
                attributes: Mutex::new(BTreeMap::new()),
                document,
                window,
            }),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attributes.lock().get(name).cloned()
    }

    fn to_markup(&self) -> String {
        let attributes = self.inner.attributes.lock();
        let mut markup = String::from("<iframe");
        for (name, value) in attributes.iter() {
            markup.push_str(&format!(" {}=\"{}\"", name, value));
        }
        markup.push_str("></iframe>");
        markup
    }
}

impl ContextDocument for SimDocument {
    type Frame = SimFrame;

    fn frame_elements(&self) -> Vec<SimFrame> {
        self.frames.clone()
    }
}

impl FrameElement for SimFrame {
    type Document = SimDocument;

    fn set_attribute(&self, name: &str, value: &str) {
        self.inner
            .attributes
            .lock()
            .insert(name.to_string(), value.to_string());
    }

    fn content_document(&self) -> Option<Arc<SimDocument>> {
        self.inner.document.clone()
    }

    fn content_window(&self) -> Option<ContextAddress> {
        self.inner.window.clone()
    }
}

/// Produces `{title, content, baseURI}` for a document. `content` carries the
/// document's markup followed by its frame elements with their stamped
/// attributes. Setting `includeContent` to `false` in the options omits it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotProducer;

impl DataProducer<SimDocument> for SnapshotProducer {
    fn produce(
        &self,
        document: &SimDocument,
        options: &GatherOptions,
    ) -> Result<Value, ProduceError> {
        if document.fails {
            return Err(ProduceError(format!(
                "snapshot of '{}' failed",
                document.title
            )));
        }

        let mut record = json!({
            "title": document.title,
            "baseURI": document.base_uri,
        });
        let include_content = options
            .setting("includeContent")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if include_content {
            let mut content = document.content.clone();
            for frame in &document.frames {
                content.push_str(&frame.to_markup());
            }
            record["content"] = Value::String(content);
        }
        Ok(record)
    }
}
