//! The bidirectional streaming core: wires a [`Transport`] to application
//! code through bounded queues, a lifecycle state machine, liveness
//! monitoring and reconnection.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant as TokioInstant;
use ulid::Ulid;

use crate::chunk::Chunk;
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::handler::{NoopHandler, StreamHandler};
use crate::pipeline::errors::{self, ErrorSender};
use crate::pipeline::queue::{self, QueueReceiver, QueueSender};
use crate::pipeline::{inbound, outbound};
use crate::reconnect::ReconnectController;
use crate::state::{StateChangeEvent, StreamState};
use crate::liveness;
use crate::transport::{Transport, TransportFactory};

struct Inner {
    state: StreamState,
    transport: Option<Arc<dyn Transport>>,
    reconnect: ReconnectController,
}

/// Shared, `Arc`-held state reachable from the pipeline, liveness and
/// reconnection workers. Not part of the public API: [`BidirectionalStream`]
/// is the façade.
pub(crate) struct StreamCore {
    pub(crate) id: String,
    pub(crate) config: StreamConfig,
    pub(crate) handler: Arc<dyn StreamHandler>,
    pub(crate) factory: Option<Arc<dyn TransportFactory>>,
    pub(crate) outbound_tx: QueueSender,
    pub(crate) error_tx: ErrorSender,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<StreamState>,
    shutdown_tx: watch::Sender<bool>,
    last_peer_activity: Mutex<TokioInstant>,
    /// Guards sequence assignment *and* the immediately following enqueue as
    /// one unit (§4.4.3/§5: "sequence numbers reflect Send-acceptance
    /// order"). A bare atomic counter would let two producers race between
    /// "take a sequence number" and "enqueue", landing chunks on the
    /// outbound queue out of sequence order even though each sequence value
    /// is still unique. `try_send` never awaits, so a blocking `std::sync`
    /// mutex is fine here and avoids pulling an async lock onto `send()`'s
    /// hot path.
    next_sequence: StdMutex<u64>,
    /// Serializes concurrent reconnect attempts from the inbound and
    /// outbound workers: whichever acquires it first does the work, the
    /// other re-reads the result once it's released.
    reconnect_gate: Mutex<()>,
}

impl StreamCore {
    pub(crate) fn state(&self) -> StreamState {
        *self.state_tx.borrow()
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub(crate) async fn set_state(&self, new: StreamState) {
        let from = {
            let mut inner = self.inner.lock().await;
            let from = inner.state;
            inner.state = new;
            from
        };
        if from != new {
            let _ = self.state_tx.send(new);
            self.handler
                .on_state_change(StateChangeEvent { from, to: new })
                .await;
        }
    }

    pub(crate) async fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.lock().await.transport.clone()
    }

    pub(crate) async fn touch_activity(&self) {
        *self.last_peer_activity.lock().await = TokioInstant::now();
    }

    pub(crate) async fn silence_duration(&self) -> Duration {
        self.last_peer_activity.lock().await.elapsed()
    }

    /// Runs (or waits out) the reconnection loop and returns a fresh
    /// transport, or a terminal error once the attempt budget is exhausted
    /// or no [`TransportFactory`] was configured.
    ///
    /// `failed` is the transport the caller just gave up on, if it had one.
    /// Concurrent callers (inbound, outbound, liveness) can all observe the
    /// same dead transport and race to report it; only the one that wins
    /// `reconnect_gate` first actually talks to the factory. A loser checks
    /// whether the installed transport has already moved past the one it
    /// saw fail and, if so, simply adopts it instead of reconnecting again.
    pub(crate) async fn reconnect_or_fail(
        self: &Arc<Self>,
        failed: Option<Arc<dyn Transport>>,
    ) -> Result<Arc<dyn Transport>, StreamError> {
        let _gate = self.reconnect_gate.lock().await;

        {
            let inner = self.inner.lock().await;
            if inner.state == StreamState::Error {
                return Err(StreamError::ReconnectExhausted {
                    attempts: inner.reconnect.attempts(),
                });
            }
            let already_superseded = match (&failed, &inner.transport) {
                (Some(failed), Some(current)) => !Arc::ptr_eq(failed, current),
                (None, Some(_)) => true,
                _ => false,
            };
            if already_superseded {
                if let Some(t) = &inner.transport {
                    return Ok(t.clone());
                }
            }
        }

        let Some(factory) = self.factory.clone() else {
            self.set_state(StreamState::Error).await;
            return Err(StreamError::NoTransport);
        };

        self.set_state(StreamState::Connecting).await;

        // Best effort: a transport whose close() flushes state or emits a
        // wire-level close frame (e.g. DuplexTransport) still gets to do so
        // even though we're about to discard it. Failures here are not our
        // problem; the transport is being replaced either way.
        if let Some(old) = &failed {
            let _ = old.close().await;
        }

        loop {
            let delay = {
                let mut inner = self.inner.lock().await;
                if !inner.reconnect.should_reconnect(&self.config) {
                    let attempts = inner.reconnect.attempts();
                    drop(inner);
                    self.set_state(StreamState::Error).await;
                    return Err(StreamError::ReconnectExhausted { attempts });
                }
                inner.reconnect.next_delay(&self.config)
            };
            tokio::time::sleep(delay).await;

            match factory.connect(None).await {
                Ok(transport) => {
                    let transport: Arc<dyn Transport> = Arc::from(transport);
                    {
                        let mut inner = self.inner.lock().await;
                        inner.transport = Some(transport.clone());
                        inner.reconnect.reset();
                    }
                    self.touch_activity().await;
                    self.set_state(StreamState::Connected).await;
                    self.set_state(StreamState::Streaming).await;
                    return Ok(transport);
                }
                Err(_) => continue,
            }
        }
    }

    /// Assigns the next sequence number and enqueues `chunk` as one atomic
    /// unit, so that a full outbound queue under concurrent producers never
    /// lets a lower-sequence chunk land after a higher-sequence one.
    pub(crate) fn assign_and_enqueue(&self, mut chunk: Chunk) -> Result<(), StreamError> {
        let mut next = self.next_sequence.lock().expect("next_sequence mutex poisoned");
        chunk.sequence = *next;
        *next += 1;
        self.outbound_tx.try_send(chunk)
    }
}

/// Builds a [`BidirectionalStream`].
pub struct BidirectionalStreamBuilder {
    id: Option<String>,
    config: StreamConfig,
    handler: Arc<dyn StreamHandler>,
    transport: Option<Box<dyn Transport>>,
    factory: Option<Arc<dyn TransportFactory>>,
}

impl Default for BidirectionalStreamBuilder {
    fn default() -> Self {
        Self {
            id: None,
            config: StreamConfig::default(),
            handler: Arc::new(NoopHandler),
            transport: None,
            factory: None,
        }
    }
}

impl BidirectionalStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn handler(mut self, handler: Arc<dyn StreamHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Supplies the transport `start()` uses on its first connection
    /// attempt. A [`TransportFactory`] set via [`Self::factory`] is still
    /// used for any reconnection after that.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> BidirectionalStream {
        let id = self.id.unwrap_or_else(|| Ulid::new().to_string());
        let (state_tx, _) = watch::channel(StreamState::Disconnected);
        let (shutdown_tx, _) = watch::channel(false);
        let (outbound_tx, outbound_rx) = queue::bounded(self.config.buffer_size);
        let (inbound_tx, inbound_rx) = queue::bounded(self.config.buffer_size);
        let (error_tx, error_rx) = errors::channel();

        let core = Arc::new(StreamCore {
            id,
            config: self.config,
            handler: self.handler,
            factory: self.factory,
            outbound_tx,
            error_tx,
            inner: Mutex::new(Inner {
                state: StreamState::Disconnected,
                transport: None,
                reconnect: ReconnectController::new(),
            }),
            state_tx,
            shutdown_tx,
            last_peer_activity: Mutex::new(TokioInstant::now()),
            next_sequence: StdMutex::new(1),
            reconnect_gate: Mutex::new(()),
        });

        BidirectionalStream {
            core,
            initial_transport: Mutex::new(self.transport),
            outbound_rx: Mutex::new(Some(outbound_rx)),
            error_rx: Mutex::new(Some(error_rx)),
            inbound_tx: Mutex::new(Some(inbound_tx)),
            inbound_rx: Mutex::new(inbound_rx),
            workers: Mutex::new(Vec::new()),
            started: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

/// A single bidirectional, chunk-framed connection with reconnection and
/// liveness monitoring layered on top of a [`Transport`].
///
/// Cloning is cheap ([`Arc`]-backed internals) but `BidirectionalStream`
/// itself is not `Clone`; share it behind an `Arc` if multiple owners need
/// access (the [`crate::registry::StreamRegistry`] does exactly this).
pub struct BidirectionalStream {
    core: Arc<StreamCore>,
    initial_transport: Mutex<Option<Box<dyn Transport>>>,
    outbound_rx: Mutex<Option<QueueReceiver>>,
    error_rx: Mutex<Option<errors::ErrorReceiver>>,
    /// Taken and handed to the inbound worker in `start()`. Not retained
    /// here afterward: once the worker exits (gracefully or via `abort()`
    /// in `close()`), its dropped sender is what lets `recv()` observe
    /// end-of-stream instead of hanging forever.
    inbound_tx: Mutex<Option<QueueSender>>,
    inbound_rx: Mutex<QueueReceiver>,
    workers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    /// `close()` puts the state back to `Disconnected`, the same state
    /// `start()` requires to run — without this, a second `start()` call
    /// after `close()` would pass the state check and then panic taking
    /// already-consumed queue halves. Once set, `start()` always fails with
    /// `StreamError::Closed` instead.
    started: std::sync::atomic::AtomicBool,
}

impl BidirectionalStream {
    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn get_state(&self) -> StreamState {
        self.core.state()
    }

    /// Subscribes to lifecycle transitions; the receiver always yields the
    /// current state first, then every change after.
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.core.subscribe_state()
    }

    /// Connects (via the seeded transport or the factory) and spawns the
    /// inbound, outbound and, if enabled, heartbeat workers.
    ///
    /// Only valid from [`StreamState::Disconnected`].
    pub async fn start(&self) -> Result<(), StreamError> {
        if self.started.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        self.core.set_state(StreamState::Connecting).await;

        let seeded = self.initial_transport.lock().await.take();
        let transport: Arc<dyn Transport> = match seeded {
            Some(t) => Arc::from(t),
            None => match &self.core.factory {
                Some(factory) => match factory.connect(None).await {
                    Ok(t) => Arc::from(t),
                    Err(e) => {
                        self.core.set_state(StreamState::Error).await;
                        return Err(StreamError::Transport(e));
                    }
                },
                None => {
                    self.core.set_state(StreamState::Error).await;
                    return Err(StreamError::NoTransport);
                }
            },
        };

        {
            let mut inner = self.core_inner_mut().await;
            inner.transport = Some(transport);
        }
        self.core.touch_activity().await;
        self.core.set_state(StreamState::Connected).await;
        self.core.set_state(StreamState::Streaming).await;

        let outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("start() called exactly once per stream");
        let error_rx = self
            .error_rx
            .lock()
            .await
            .take()
            .expect("start() called exactly once per stream");

        let inbound_tx = self
            .inbound_tx
            .lock()
            .await
            .take()
            .expect("start() called exactly once per stream");

        let mut workers = self.workers.lock().await;
        workers.push(tokio::spawn(outbound::run(self.core.clone(), outbound_rx)));
        workers.push(tokio::spawn(inbound::run(self.core.clone(), inbound_tx)));
        if self.core.config.heartbeat_enabled {
            workers.push(tokio::spawn(liveness::run(self.core.clone())));
        }
        workers.push(tokio::spawn(errors::run(
            Arc::from(self.core.id.as_str()),
            error_rx,
            self.core.subscribe_shutdown(),
        )));
        Ok(())
    }

    async fn core_inner_mut(&self) -> tokio::sync::MutexGuard<'_, Inner> {
        // `inner` is private to `StreamCore`; `start()` needs write access
        // just this once, for the initial transport handoff.
        self.core.inner.lock().await
    }

    /// Enqueues `chunk` for the outbound worker, assigning its sequence
    /// number. Never blocks: a full outbound buffer fails immediately with
    /// [`StreamError::OutboundBufferFull`].
    pub fn send(&self, chunk: Chunk) -> Result<(), StreamError> {
        let state = self.core.state();
        if state == StreamState::Disconnected || state == StreamState::Error {
            return Err(StreamError::Closed);
        }
        self.core.assign_and_enqueue(chunk)
    }

    /// Waits for the next inbound chunk. Returns `None` once the stream is
    /// closed and its inbound queue has drained.
    pub async fn recv(&self) -> Option<Chunk> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Suspends outbound delivery; queued and newly sent chunks wait until
    /// [`Self::resume`]. Inbound reading and heartbeats are unaffected.
    pub async fn pause(&self) -> Result<(), StreamError> {
        if self.core.state() != StreamState::Streaming {
            return Err(StreamError::Closed);
        }
        self.core.set_state(StreamState::Paused).await;
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), StreamError> {
        if self.core.state() != StreamState::Paused {
            return Err(StreamError::Closed);
        }
        self.core.set_state(StreamState::Streaming).await;
        Ok(())
    }

    /// Idempotent. Stops all workers, closes the current transport and
    /// transitions to the terminal [`StreamState::Disconnected`] state.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.core.state() == StreamState::Disconnected {
            return Ok(());
        }
        let _ = self.core.shutdown_tx.send(true);

        let transport = self.core.current_transport().await;
        if let Some(transport) = transport {
            let _ = transport.close().await;
        }

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            handle.abort();
        }

        self.core.set_state(StreamState::Disconnected).await;
        Ok(())
    }
}
