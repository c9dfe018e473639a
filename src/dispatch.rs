//! Request dispatcher
//!
//! Handles one context's share of a session: stamp and enumerate its frames,
//! post a request to every frame that cannot be read from here, arm a timeout
//! guard per frame, walk every frame whose document is directly inspectable
//! in-line instead of waiting for a round trip, and produce the context's own
//! record. Records of inspectable documents are produced after their own frames
//! are stamped.
//!
//! Everything learned locally comes back as one batch. Reporting it in a single
//! message keeps a node's own record and the placeholders for its children
//! together, so the origin never sees the node finished while its children are
//! still unknown.

use crate::error::TransportError;
use crate::guard::TimeoutGuard;
use crate::protocol::message::InitRequest;
use crate::record::NodeRecord;
use crate::session::options::GatherOptions;
use crate::transport::TransportAdapter;
use crate::tree::context::{
    window_id_attribute_name, ContextAddress, ContextDocument, DataProducer, FrameElement,
};
use crate::tree::id::NodeId;
use std::sync::Arc;
use tracing::{debug, warn};

/// One context's dispatch assignment
#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub session_id: String,
    /// Identifier assigned to the dispatching context
    pub node_id: NodeId,
    pub options: Arc<GatherOptions>,
    /// Session origin, recipient of every report
    pub origin: ContextAddress,
}

impl From<InitRequest> for DispatchTask {
    fn from(request: InitRequest) -> Self {
        Self {
            session_id: request.session_id,
            node_id: request.window_id,
            options: Arc::new(request.options),
            origin: request.origin,
        }
    }
}

pub struct Dispatcher<D: ContextDocument> {
    producer: Arc<dyn DataProducer<D>>,
    adapter: TransportAdapter,
    guard: TimeoutGuard,
    attribute_prefix: String,
}

impl<D: ContextDocument> Dispatcher<D> {
    pub fn new(
        producer: Arc<dyn DataProducer<D>>,
        adapter: TransportAdapter,
        guard: TimeoutGuard,
        attribute_prefix: impl Into<String>,
    ) -> Self {
        Self {
            producer,
            adapter,
            guard,
            attribute_prefix: attribute_prefix.into(),
        }
    }

    /// Run the local dispatch and return the batch to report to the origin.
    ///
    /// Requests and guards are started before this returns; nothing here waits
    /// on another context.
    pub fn dispatch(&self, document: &D, task: &DispatchTask) -> Vec<NodeRecord> {
        let mut descendants = Vec::new();
        self.process_document(document, &task.node_id, task, &mut descendants);
        // Frames are stamped by now, so the record can reference them.
        let mut batch = Vec::with_capacity(descendants.len() + 1);
        batch.push(self.produce(document, &task.node_id, &task.options));
        batch.append(&mut descendants);
        debug!(
            session_id = %task.session_id,
            node_id = %task.node_id,
            records = batch.len(),
            "local dispatch finished"
        );
        batch
    }

    fn process_document(
        &self,
        document: &D,
        parent_id: &NodeId,
        task: &DispatchTask,
        batch: &mut Vec<NodeRecord>,
    ) {
        let frames = document.frame_elements();
        if frames.is_empty() {
            return;
        }
        let attribute = window_id_attribute_name(&self.attribute_prefix, &task.session_id);

        for (index, frame) in frames.iter().enumerate() {
            let child_id = parent_id.child(index);
            frame.set_attribute(&attribute, child_id.as_str());
            batch.push(NodeRecord::placeholder(child_id.clone()));
            if frame.content_document().is_none() {
                if let Err(err) = self.send_request(frame, &child_id, task) {
                    debug!(
                        session_id = %task.session_id,
                        node_id = %child_id,
                        error = %err,
                        "dispatch request not sent"
                    );
                }
            }
            self.guard
                .arm(task.origin.clone(), task.session_id.clone(), child_id);
        }

        for (index, frame) in frames.iter().enumerate() {
            let Some(child_document) = frame.content_document() else {
                continue;
            };
            let child_id = parent_id.child(index);
            self.process_document(&child_document, &child_id, task, batch);
            batch.push(self.produce(&child_document, &child_id, &task.options));
        }
    }

    fn send_request(
        &self,
        frame: &D::Frame,
        child_id: &NodeId,
        task: &DispatchTask,
    ) -> Result<(), TransportError> {
        let target = frame.content_window().ok_or(TransportError::NoWindow)?;
        let request = InitRequest {
            window_id: child_id.clone(),
            session_id: task.session_id.clone(),
            options: task.options.as_ref().clone(),
            origin: task.origin.clone(),
        };
        self.adapter.send_request(&target, request)
    }

    fn produce(&self, document: &D, node_id: &NodeId, options: &GatherOptions) -> NodeRecord {
        match self.producer.produce(document, options) {
            Ok(data) => NodeRecord::completed(node_id.clone(), data),
            Err(err) => {
                warn!(
                    session_id = %options.session_id,
                    node_id = %node_id,
                    error = %err,
                    "data producer failed"
                );
                NodeRecord::failed(node_id.clone())
            }
        }
    }
}
