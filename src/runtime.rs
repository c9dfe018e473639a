//! Per-context runtime
//!
//! Each context runs as one tokio task that owns its session registry and
//! serializes everything touching it: caller commands, inbound deliveries,
//! payloads relayed over reply ports, and the supervisory sweep. Nothing in the
//! loop waits on another context.

use crate::config::GatherConfig;
use crate::dispatch::{DispatchTask, Dispatcher};
use crate::error::GatherError;
use crate::guard::TimeoutGuard;
use crate::protocol::envelope::{self, Inbound};
use crate::protocol::message::{InitRequest, InitResponse, Message};
use crate::record::NodeRecord;
use crate::session::options::GatherOptions;
use crate::session::registry::{CompletionSink, MergeOutcome, SessionRegistry};
use crate::session::view::LiveView;
use crate::transport::{Delivery, Inbox, ReplyPort, Transport, TransportAdapter};
use crate::tree::context::{ContextAddress, ContextDocument, DataProducer};
use crate::tree::id::NodeId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

enum Command {
    Start {
        options: GatherOptions,
        sink: CompletionSink,
        ack: oneshot::Sender<Result<(), GatherError>>,
    },
    Shutdown,
}

/// Caller-side handle to a running context
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    address: ContextAddress,
    commands: mpsc::UnboundedSender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start { options, .. } => f
                .debug_struct("Start")
                .field("session_id", &options.session_id)
                .finish(),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl RuntimeHandle {
    pub fn address(&self) -> &ContextAddress {
        &self.address
    }

    /// Originate a session from this context and wait for its ordered records.
    ///
    /// Never fails because of the tree: unreachable or broken nodes come back
    /// as terminal records. Errors only for a duplicate active session id or a
    /// runtime that is gone.
    pub async fn gather(&self, options: GatherOptions) -> Result<Vec<NodeRecord>, GatherError> {
        let (tx, rx) = oneshot::channel();
        self.start(options, CompletionSink::Callback(tx)).await?;
        rx.await
            .map_err(|_| GatherError::RuntimeClosed(self.address.clone()))
    }

    /// Originate a session and return a live view as soon as it is registered.
    /// The view fills in as records arrive.
    pub async fn gather_view(&self, options: GatherOptions) -> Result<LiveView, GatherError> {
        let view = LiveView::new();
        self.start(options, CompletionSink::View(view.clone())).await?;
        Ok(view)
    }

    /// Stop the runtime. Open sessions are dropped undelivered: awaiting
    /// callers get [`GatherError::RuntimeClosed`], live views are abandoned.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn start(&self, options: GatherOptions, sink: CompletionSink) -> Result<(), GatherError> {
        let (ack, ack_rx) = oneshot::channel();
        self.commands
            .send(Command::Start { options, sink, ack })
            .map_err(|_| GatherError::RuntimeClosed(self.address.clone()))?;
        ack_rx
            .await
            .map_err(|_| GatherError::RuntimeClosed(self.address.clone()))?
    }
}

/// The event loop of one context
pub struct ContextRuntime<D: ContextDocument> {
    address: ContextAddress,
    document: Arc<D>,
    dispatcher: Dispatcher<D>,
    adapter: TransportAdapter,
    registry: SessionRegistry,
    sweep_interval: Duration,
    relay_tx: mpsc::UnboundedSender<Message>,
    relay_rx: mpsc::UnboundedReceiver<Message>,
}

impl<D: ContextDocument> ContextRuntime<D> {
    /// Spawn the runtime task for a context attached to `transport` at
    /// `address`, draining `inbox`. Must be called from within a tokio runtime.
    pub fn spawn(
        config: &GatherConfig,
        address: ContextAddress,
        document: Arc<D>,
        producer: Arc<dyn DataProducer<D>>,
        transport: Arc<dyn Transport>,
        inbox: Inbox,
    ) -> (RuntimeHandle, JoinHandle<()>) {
        let adapter = TransportAdapter::new(address.clone(), transport);
        let guard = TimeoutGuard::new(config.init_timeout(), adapter.clone());
        let dispatcher = Dispatcher::new(
            producer,
            adapter.clone(),
            guard,
            config.window_id_attribute_prefix.clone(),
        );
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let runtime = ContextRuntime {
            address: address.clone(),
            document,
            dispatcher,
            adapter,
            registry: SessionRegistry::new(config.entry_deadline()),
            sweep_interval: config.sweep_interval(),
            relay_tx,
            relay_rx,
        };

        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(runtime.run(command_rx, inbox));
        (RuntimeHandle { address, commands }, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut inbox: Inbox) {
        debug!(address = %self.address, "context runtime started");
        let mut sweep = time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inbox_open = true;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Start { options, sink, ack }) => {
                        let result = self.start_session(options, sink);
                        let _ = ack.send(result);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                delivery = inbox.recv(), if inbox_open => match delivery {
                    Some(delivery) => self.on_delivery(delivery),
                    None => {
                        debug!(address = %self.address, "inbox closed");
                        inbox_open = false;
                    }
                },
                Some(message) = self.relay_rx.recv() => self.on_message(message),
                _ = sweep.tick() => self.sweep(),
            }
        }

        let open = self.registry.close_all();
        debug!(address = %self.address, open_sessions = open, "context runtime stopped");
    }

    fn start_session(
        &mut self,
        options: GatherOptions,
        sink: CompletionSink,
    ) -> Result<(), GatherError> {
        let session_id = options.session_id.clone();
        self.registry.create(&session_id, sink, Instant::now())?;
        info!(
            session_id = %session_id,
            address = %self.address,
            "session started"
        );

        let task = DispatchTask {
            session_id,
            node_id: NodeId::root(),
            options: Arc::new(options),
            origin: self.address.clone(),
        };
        let batch = self.dispatcher.dispatch(&self.document, &task);
        self.report(&task, batch);
        Ok(())
    }

    fn on_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Invoked(message) => self.on_message(message),
            Delivery::Posted { data, port } => match envelope::decode(&data) {
                Ok(Inbound::Request(request)) => self.on_request(request),
                Ok(Inbound::Response(response)) => self.on_response(response),
                Ok(Inbound::ResponseIntent) => match port {
                    Some(port) => self.forward_port(port),
                    None => trace!(address = %self.address, "response intent without reply port"),
                },
                Err(err) => {
                    trace!(address = %self.address, error = %err, "ignoring foreign envelope")
                }
            },
        }
    }

    fn on_message(&mut self, message: Message) {
        match message {
            Message::InitRequest(request) => self.on_request(request),
            Message::InitResponse(response) => self.on_response(response),
        }
    }

    fn on_request(&mut self, request: InitRequest) {
        debug!(
            address = %self.address,
            session_id = %request.session_id,
            node_id = %request.window_id,
            origin = %request.origin,
            "dispatch requested"
        );
        let task = DispatchTask::from(request);
        let batch = self.dispatcher.dispatch(&self.document, &task);
        self.report(&task, batch);
    }

    fn on_response(&mut self, response: InitResponse) {
        let outcome = self.registry.merge(
            &response.session_id,
            &response.frames_data,
            Instant::now(),
        );
        if let MergeOutcome::Pending { remaining } = outcome {
            trace!(session_id = %response.session_id, remaining, "session pending");
        }
    }

    fn report(&mut self, task: &DispatchTask, batch: Vec<NodeRecord>) {
        let response = InitResponse {
            frames_data: batch,
            session_id: task.session_id.clone(),
        };
        if task.origin == self.address {
            self.on_response(response);
            return;
        }

        match self.adapter.send_response(&task.origin, response) {
            Ok(route) => debug!(
                session_id = %task.session_id,
                node_id = %task.node_id,
                route = ?route,
                "reported to origin"
            ),
            Err(err) => debug!(
                session_id = %task.session_id,
                node_id = %task.node_id,
                error = %err,
                "report to origin failed"
            ),
        }
    }

    /// Merge whatever arrives on a transferred reply port, on this task
    fn forward_port(&self, mut port: ReplyPort) {
        let relay = self.relay_tx.clone();
        tokio::spawn(async move {
            while let Some(message) = port.recv().await {
                if relay.send(message).is_err() {
                    break;
                }
            }
        });
    }

    fn sweep(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        for report in self.registry.sweep(Instant::now()) {
            debug!(
                session_id = %report.session_id,
                forced = report.forced.len(),
                outcome = ?report.outcome,
                "sweep applied"
            );
        }
    }
}
