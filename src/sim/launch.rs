//! Launching a simulated tree.
//!
//! Every live context is attached to the network at `ctx-<path>`, where
//! `<path>` is its identifier relative to the top context, and gets its own
//! runtime. Same-origin frames inherit the parent's security origin;
//! cross-origin frames get a fresh one.

use crate::config::GatherConfig;
use crate::error::GatherError;
use crate::runtime::{ContextRuntime, RuntimeHandle};
use crate::sim::document::{SimDocument, SimFrame, SnapshotProducer};
use crate::sim::spec::{Behavior, Boundary, ContextSpec, TreeSpec};
use crate::transport::{InProcessNetwork, LinkState, Transport};
use crate::tree::context::{ContextAddress, DataProducer};
use crate::tree::id::NodeId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const TOP_ORIGIN: &str = "https://top.invalid";

/// Address of the context at `path` in a simulated tree
pub fn context_address(path: &NodeId) -> ContextAddress {
    ContextAddress::new(format!("ctx-{}", path))
}

/// A running simulated tree
pub struct SimulatedTree {
    network: Arc<InProcessNetwork>,
    top: RuntimeHandle,
    contexts: HashMap<NodeId, RuntimeHandle>,
    frames: HashMap<NodeId, SimFrame>,
    tasks: Vec<JoinHandle<()>>,
}

impl SimulatedTree {
    /// Launch with the [`SnapshotProducer`]. Must be called from within a
    /// tokio runtime.
    pub fn launch(spec: &TreeSpec, config: &GatherConfig) -> Result<Self, GatherError> {
        Self::launch_with_producer(spec, config, Arc::new(SnapshotProducer))
    }

    pub fn launch_with_producer(
        spec: &TreeSpec,
        config: &GatherConfig,
        producer: Arc<dyn DataProducer<SimDocument>>,
    ) -> Result<Self, GatherError> {
        spec.validate()?;
        config.validate().map_err(GatherError::ConfigError)?;

        let mut builder = Builder {
            config,
            producer,
            network: Arc::new(InProcessNetwork::new()),
            next_origin: 0,
            contexts: HashMap::new(),
            frames: HashMap::new(),
            tasks: Vec::new(),
        };
        builder.build(&spec.root, NodeId::root(), TOP_ORIGIN.to_string());

        let top = builder
            .contexts
            .get(&NodeId::root())
            .cloned()
            .ok_or_else(|| GatherError::InvalidTree("top context did not start".to_string()))?;
        info!(
            contexts = builder.contexts.len(),
            frames = builder.frames.len(),
            "simulated tree launched"
        );

        Ok(SimulatedTree {
            network: builder.network,
            top,
            contexts: builder.contexts,
            frames: builder.frames,
            tasks: builder.tasks,
        })
    }

    pub fn top(&self) -> &RuntimeHandle {
        &self.top
    }

    pub fn network(&self) -> &Arc<InProcessNetwork> {
        &self.network
    }

    /// Runtime of the live context at `path`
    pub fn context(&self, path: &str) -> Option<&RuntimeHandle> {
        self.contexts.get(&NodeId::from(path))
    }

    /// Frame element hosting the context at `path`
    pub fn frame(&self, path: &str) -> Option<&SimFrame> {
        self.frames.get(&NodeId::from(path))
    }

    /// Stop every runtime and detach it from the network
    pub async fn shutdown(self) {
        for (path, handle) in &self.contexts {
            handle.shutdown();
            self.network.detach(&context_address(path));
        }
        for task in self.tasks {
            let _ = task.await;
        }
        debug!("simulated tree stopped");
    }
}

struct Builder<'a> {
    config: &'a GatherConfig,
    producer: Arc<dyn DataProducer<SimDocument>>,
    network: Arc<InProcessNetwork>,
    next_origin: usize,
    contexts: HashMap<NodeId, RuntimeHandle>,
    frames: HashMap<NodeId, SimFrame>,
    tasks: Vec<JoinHandle<()>>,
}

impl Builder<'_> {
    fn build(&mut self, spec: &ContextSpec, path: NodeId, origin: String) -> Arc<SimDocument> {
        let mut frames = Vec::with_capacity(spec.frames.len());
        for (index, child) in spec.frames.iter().enumerate() {
            let child_path = path.child(index);
            let child_origin = match child.boundary {
                Boundary::SameOrigin => origin.clone(),
                Boundary::CrossOrigin => self.fresh_origin(),
            };
            let child_document = self.build(child, child_path.clone(), child_origin);

            let live = child.behavior != Behavior::Detached;
            let inspectable = live && child.boundary == Boundary::SameOrigin;
            let frame = SimFrame::new(
                inspectable.then_some(child_document),
                live.then(|| context_address(&child_path)),
            );
            self.frames.insert(child_path, frame.clone());
            frames.push(frame);
        }

        let document = Arc::new(SimDocument::new(
            spec.title.clone(),
            spec.content.clone(),
            format!("{}/{}", origin, path),
            spec.behavior == Behavior::Failing,
            frames,
        ));

        if spec.behavior != Behavior::Detached {
            self.start_context(&path, &origin, document.clone(), spec.behavior);
        }
        document
    }

    fn start_context(
        &mut self,
        path: &NodeId,
        origin: &str,
        document: Arc<SimDocument>,
        behavior: Behavior,
    ) {
        let address = context_address(path);
        let inbox = self.network.attach(address.clone(), origin);
        if behavior == Behavior::Silent {
            self.network.set_link(&address, LinkState::Dropping);
        }
        let transport: Arc<dyn Transport> = self.network.clone();
        let (handle, task) = ContextRuntime::spawn(
            self.config,
            address,
            document,
            self.producer.clone(),
            transport,
            inbox,
        );
        debug!(path = %path, origin = %origin, behavior = ?behavior, "context started");
        self.contexts.insert(path.clone(), handle);
        self.tasks.push(task);
    }

    fn fresh_origin(&mut self) -> String {
        self.next_origin += 1;
        format!("https://frame-{}.invalid", self.next_origin)
    }
}
