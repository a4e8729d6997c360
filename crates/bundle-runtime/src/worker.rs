use crate::{SessionCommand, SessionUpdate};
use image_bundle::{
    ArtifactId, ArtifactSink, BundleError, BundleOptions, GeneratedArtifact, GenerationJob,
    ImageDecoder, MessageId, MessageSlot, Session, SessionController,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Forwards artifact hand-offs to the presentation layer
pub struct ChannelSink {
    update_tx: mpsc::UnboundedSender<SessionUpdate>,
}

impl ChannelSink {
    pub fn new(update_tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        Self { update_tx }
    }
}

impl ArtifactSink for ChannelSink {
    fn publish(&mut self, artifact: &GeneratedArtifact) {
        let _ = self.update_tx.send(SessionUpdate::ArtifactPublished {
            id: artifact.id,
            kind: artifact.kind,
            filename: artifact.filename.clone(),
            bytes: artifact.bytes.clone(),
        });
    }

    fn release(&mut self, id: ArtifactId) {
        let _ = self.update_tx.send(SessionUpdate::ArtifactReleased { id });
    }
}

/// Channels to a running session worker
pub struct SessionHandle {
    pub command_tx: mpsc::UnboundedSender<SessionCommand>,
    pub update_rx: mpsc::UnboundedReceiver<SessionUpdate>,
    pub task: JoinHandle<()>,
}

/// Start a session worker on the current tokio runtime.
///
/// The worker stops once every command sender has been dropped.
pub fn spawn_session<D: ImageDecoder + Clone + 'static>(
    options: BundleOptions,
    decoder: D,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let controller = SessionController::with_decoder(options, decoder)
        .with_sink(ChannelSink::new(update_tx.clone()));
    let task = tokio::spawn(worker_task(controller, command_rx, update_tx));

    SessionHandle {
        command_tx,
        update_rx,
        task,
    }
}

/// A generation running on its own task while the worker keeps serving commands
struct InFlight {
    job: GenerationJob,
    handle: JoinHandle<image_bundle::Result<GeneratedArtifact>>,
}

impl InFlight {
    fn start<D: ImageDecoder + Clone + 'static>(
        job: GenerationJob,
        controller: &SessionController<D>,
    ) -> Self {
        let task_job = job.clone();
        let options = controller.options().clone();
        let decoder = controller.decoder().clone();
        let handle = tokio::spawn(async move { task_job.run(&options, &decoder).await });
        Self { job, handle }
    }
}

/// Resolves when the in-flight generation finishes, never if there is none
async fn join_generation(
    in_flight: &mut Option<InFlight>,
) -> image_bundle::Result<GeneratedArtifact> {
    match in_flight {
        Some(running) => match (&mut running.handle).await {
            Ok(result) => result,
            Err(e) => Err(BundleError::from(e)),
        },
        None => std::future::pending().await,
    }
}

/// Async worker task that owns the session and applies commands one at a time
pub async fn worker_task<D: ImageDecoder + Clone + 'static>(
    mut controller: SessionController<D>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: mpsc::UnboundedSender<SessionUpdate>,
) {
    let (expiry_tx, mut expiry_rx) = mpsc::unbounded_channel();
    let mut timers = MessageTimers::new(controller.options().message_ttl(), expiry_tx);
    let mut in_flight: Option<InFlight> = None;

    let _ = update_tx.send(SessionUpdate::Snapshot(controller.snapshot()));

    loop {
        tokio::select! {
            biased;

            cmd = command_rx.recv() => {
                let Some(cmd) = cmd else { break };
                process_command(cmd, &mut controller, &mut in_flight);
                let _ = update_tx.send(SessionUpdate::Snapshot(controller.snapshot()));
            }
            result = join_generation(&mut in_flight) => {
                if let Some(InFlight { job, .. }) = in_flight.take() {
                    // Failures are reported through the session's error message
                    match controller.finish_generation(job, result) {
                        Ok(None) => {}
                        _ => {
                            let _ = update_tx.send(SessionUpdate::Snapshot(controller.snapshot()));
                        }
                    }
                }
            }
            Some((slot, id)) = expiry_rx.recv() => {
                if controller.expire_message(slot, id) {
                    log::debug!("Transient {:?} message expired", slot);
                    let _ = update_tx.send(SessionUpdate::Snapshot(controller.snapshot()));
                }
            }
        }

        timers.sync(controller.session());
    }

    timers.cancel_all();
    log::debug!("Session worker stopped");
}

fn process_command<D: ImageDecoder + Clone + 'static>(
    cmd: SessionCommand,
    controller: &mut SessionController<D>,
    in_flight: &mut Option<InFlight>,
) {
    match cmd {
        SessionCommand::Ingest { batch, rejected } => {
            controller.ingest(batch, rejected);
        }
        SessionCommand::SetCustomerId { value } => {
            controller.set_customer_id(value);
        }
        SessionCommand::SetOutputMode { mode } => {
            controller.set_output_mode(mode);
        }
        SessionCommand::Generate => {
            if let Ok(job) = controller.begin_generation() {
                // A job still held here is stale; its result is never applied
                *in_flight = Some(InFlight::start(job, controller));
            }
        }
        SessionCommand::Reset => {
            controller.reset();
        }
    }
}

/// Pending clear timers, one per message slot, tied to the message they clear
struct MessageTimers {
    ttl: Duration,
    expiry_tx: mpsc::UnboundedSender<(MessageSlot, MessageId)>,
    pending: HashMap<MessageSlot, (MessageId, JoinHandle<()>)>,
}

impl MessageTimers {
    fn new(ttl: Duration, expiry_tx: mpsc::UnboundedSender<(MessageSlot, MessageId)>) -> Self {
        Self {
            ttl,
            expiry_tx,
            pending: HashMap::new(),
        }
    }

    /// Make the scheduled timers match the messages the session shows.
    ///
    /// A slot whose message changed gets its old timer aborted and, if a new
    /// message is showing, a fresh one.
    fn sync(&mut self, session: &Session) {
        for slot in MessageSlot::ALL {
            let current = session.message(slot).map(|m| m.id);
            let scheduled = self.pending.get(&slot).map(|(id, _)| *id);
            if current == scheduled {
                continue;
            }

            if let Some((_, handle)) = self.pending.remove(&slot) {
                handle.abort();
            }

            if let Some(id) = current {
                let ttl = self.ttl;
                let expiry_tx = self.expiry_tx.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(ttl).await;
                    let _ = expiry_tx.send((slot, id));
                });
                self.pending.insert(slot, (id, handle));
            }
        }
    }

    fn cancel_all(&mut self) {
        for (_, (_, handle)) in self.pending.drain() {
            handle.abort();
        }
    }
}
