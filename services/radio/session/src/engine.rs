//! The radio engine.
//!
//! A [`RadioEngine`] owns one transport, one reassembly buffer and all
//! session state. Each [`tick`](RadioEngine::tick) reads whatever bytes are
//! available, extracts and dispatches at most one frame, sends a heartbeat
//! when one is due and expires an overdue node report.
//!
//! Everything runs on a single task. Other tasks talk to a running engine
//! through an [`EngineHandle`], which forwards [`Command`]s over a channel.

use crate::dispatch::{DiagnosticLimiter, Dispatched};
use crate::error::EngineError;
use crate::heartbeat::{HeartbeatKeeper, DEFAULT_HEARTBEAT_INTERVAL};
use crate::reboot::RebootRecovery;
use crate::report::{NodeReportHandler, NodeReportSession, Nonce, SessionState};
use crate::router::{EncryptedHandler, PacketRouter, PortHandler, TextMessageHandler};
use crate::transport::{Transport, TransportKind};
use radio_schema::{OutboundEnvelope, ProstCodec, SchemaCodec, BROADCAST_ADDR};
use radio_wire::{encode_frame, Polled, ReassemblyBuffer, DEFAULT_BUFFER_CAPACITY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Largest text carried by one packet
pub const MAX_TEXT_BYTES: usize = 233;

/// Default pause when a tick finds nothing to do
pub const DEFAULT_IDLE_PAUSE: Duration = Duration::from_millis(25);

/// Default node-report deadline
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reassembly buffer capacity
    pub buffer_capacity: usize,
    /// Serial heartbeat interval
    pub heartbeat_interval: Duration,
    /// Pause between ticks when nothing arrived
    pub idle_pause: Duration,
    /// Node-report deadline; `None` waits forever
    pub report_timeout: Option<Duration>,
    /// Emit per-envelope diagnostics
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            idle_pause: DEFAULT_IDLE_PAUSE,
            report_timeout: Some(DEFAULT_REPORT_TIMEOUT),
            debug: false,
        }
    }
}

/// Engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Bytes read from the transport
    pub bytes_in: u64,
    /// Bytes written to the transport
    pub bytes_out: u64,
    /// Frames extracted
    pub frames_in: u64,
    /// Frames sent
    pub frames_out: u64,
    /// Buffers discarded as corrupt
    pub corrupt_discards: u64,
    /// Frames whose payload failed to decode
    pub decode_failures: u64,
    /// Envelopes nobody handled
    pub unhandled: u64,
    /// Heartbeats sent
    pub heartbeats_sent: u64,
}

/// What happened to the buffer during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Buffer empty
    Empty,
    /// Partial frame buffered
    Incomplete,
    /// Buffer discarded
    Corrupt {
        /// Bytes dropped
        discarded: usize,
    },
    /// Frame payload did not decode
    Undecodable,
    /// Frame decoded and dispatched
    Dispatched(Dispatched),
}

impl FrameOutcome {
    /// No complete frame was available
    pub fn is_idle(&self) -> bool {
        matches!(self, FrameOutcome::Empty | FrameOutcome::Incomplete)
    }
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Bytes read from the transport
    pub bytes_read: usize,
    /// Frame processing outcome
    pub frame: FrameOutcome,
    /// A periodic heartbeat went out
    pub heartbeat_sent: bool,
    /// The outstanding node report timed out
    pub report_expired: bool,
}

impl TickReport {
    /// Nothing useful happened; the caller should pause
    pub fn is_idle(&self) -> bool {
        self.frame.is_idle()
    }
}

/// Request sent to a running engine
pub enum Command {
    /// Send a text message
    SendText {
        /// Message body
        text: String,
        /// Destination node
        to: u32,
        /// Channel index
        channel: u32,
        /// Receives the packet id
        reply: oneshot::Sender<Result<u32, EngineError>>,
    },
    /// Send a heartbeat now
    Heartbeat {
        /// Receives the send result
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    /// Start a node report
    RequestNodeReport {
        /// Consumer of report events
        handler: Box<dyn NodeReportHandler>,
        /// Receives the nonce
        reply: oneshot::Sender<Result<Nonce, EngineError>>,
    },
    /// Abandon the outstanding node report
    CancelNodeReport,
    /// Toggle diagnostics
    SetDebug(bool),
    /// Send a disconnect notice and stop the run loop
    Shutdown,
}

/// Sender side of the command channel
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

/// Create a command channel for [`RadioEngine::run`]
pub fn command_channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EngineHandle { tx }, rx)
}

impl EngineHandle {
    async fn submit(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| EngineError::Stopped)
    }

    /// Send a text message, returning its packet id
    pub async fn send_text(
        &self,
        text: impl Into<String>,
        to: u32,
        channel: u32,
    ) -> Result<u32, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::SendText {
            text: text.into(),
            to,
            channel,
            reply,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Send a heartbeat now
    pub async fn send_heartbeat(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Heartbeat { reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Start a node report
    pub async fn request_node_report(
        &self,
        handler: impl NodeReportHandler + 'static,
    ) -> Result<Nonce, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::RequestNodeReport {
            handler: Box::new(handler),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Abandon the outstanding node report
    pub async fn cancel_node_report(&self) -> Result<(), EngineError> {
        self.submit(Command::CancelNodeReport).await
    }

    /// Toggle diagnostics
    pub async fn set_debug(&self, on: bool) -> Result<(), EngineError> {
        self.submit(Command::SetDebug(on)).await
    }

    /// Stop the engine
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.submit(Command::Shutdown).await
    }
}

/// Client-side protocol engine for one radio link
pub struct RadioEngine<T, C = ProstCodec> {
    transport: T,
    codec: C,
    buffer: ReassemblyBuffer,
    config: EngineConfig,
    heartbeat: Option<HeartbeatKeeper>,
    rng: StdRng,
    stats: EngineStats,
    pub(crate) session: NodeReportSession,
    pub(crate) router: PacketRouter,
    pub(crate) reboot: RebootRecovery,
    pub(crate) local_node: Option<u32>,
    pub(crate) debug: bool,
    pub(crate) unknown_limiter: DiagnosticLimiter,
}

impl<T: Transport> RadioEngine<T, ProstCodec> {
    /// Create an engine with the protobuf codec
    pub fn new(transport: T, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_codec(transport, ProstCodec::new(), config)
    }
}

impl<T, C> RadioEngine<T, C>
where
    T: Transport,
    C: SchemaCodec,
{
    /// Create an engine with a custom codec
    pub fn with_codec(transport: T, codec: C, config: EngineConfig) -> Result<Self, EngineError> {
        let buffer = ReassemblyBuffer::with_capacity(config.buffer_capacity)?;
        let heartbeat = match transport.kind() {
            TransportKind::Serial => Some(HeartbeatKeeper::new(
                config.heartbeat_interval,
                Instant::now(),
            )),
            TransportKind::Network => None,
        };
        let debug = config.debug;

        Ok(Self {
            transport,
            codec,
            buffer,
            config,
            heartbeat,
            rng: StdRng::from_entropy(),
            stats: EngineStats::default(),
            session: NodeReportSession::new(),
            router: PacketRouter::new(),
            reboot: RebootRecovery::new(),
            local_node: None,
            debug,
            unknown_limiter: DiagnosticLimiter::default(),
        })
    }

    /// Seed the random source for nonces and packet ids
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register the text message consumer
    pub fn set_text_message_handler(&mut self, handler: impl TextMessageHandler + 'static) {
        self.router.set_text_handler(handler);
    }

    /// Register the generic port consumer
    pub fn set_port_handler(&mut self, handler: impl PortHandler + 'static) {
        self.router.set_port_handler(handler);
    }

    /// Register the encrypted packet consumer
    pub fn set_encrypted_handler(&mut self, handler: impl EncryptedHandler + 'static) {
        self.router.set_encrypted_handler(handler);
    }

    /// Toggle diagnostics
    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    /// Diagnostics enabled
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Node number of the attached device, once known
    pub fn local_node_num(&self) -> Option<u32> {
        self.local_node
    }

    /// Node-report state
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Counters
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Kind of the underlying link
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Reboots seen since startup
    pub fn reboots(&self) -> u32 {
        self.reboot.reboots()
    }

    /// The transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Encode, frame and send one envelope
    pub async fn send_envelope(&mut self, envelope: &OutboundEnvelope) -> Result<(), EngineError> {
        let payload = self.codec.encode(envelope)?;
        let frame = encode_frame(&payload)?;
        self.transport.send(&frame).await?;

        self.stats.frames_out += 1;
        self.stats.bytes_out += frame.len() as u64;
        debug!(envelope = envelope.name(), bytes = frame.len(), "Sent envelope");
        Ok(())
    }

    /// Start a node report.
    ///
    /// Fails with [`EngineError::SessionOutstanding`] while another report is
    /// in flight; the outstanding report is not affected.
    pub async fn request_node_report(
        &mut self,
        handler: impl NodeReportHandler + 'static,
    ) -> Result<Nonce, EngineError> {
        self.request_node_report_boxed(Box::new(handler)).await
    }

    async fn request_node_report_boxed(
        &mut self,
        handler: Box<dyn NodeReportHandler>,
    ) -> Result<Nonce, EngineError> {
        if let Some(existing) = self.session.outstanding() {
            return Err(EngineError::SessionOutstanding(existing));
        }

        let nonce = Nonce::random(&mut self.rng);
        self.send_envelope(&OutboundEnvelope::WantConfig(nonce.get()))
            .await?;

        let deadline = self.config.report_timeout.map(|t| Instant::now() + t);
        self.session
            .arm(nonce, handler, deadline)
            .map_err(EngineError::SessionOutstanding)?;
        info!(nonce = %nonce, "Requested node report");
        Ok(nonce)
    }

    /// Abandon the outstanding node report
    pub fn cancel_node_report(&mut self) -> bool {
        self.session.cancel()
    }

    /// Send a text message, returning its packet id
    pub async fn send_text(&mut self, text: &str, to: u32, channel: u32) -> Result<u32, EngineError> {
        if text.len() > MAX_TEXT_BYTES {
            return Err(EngineError::TextTooLong {
                len: text.len(),
                max: MAX_TEXT_BYTES,
            });
        }

        let packet_id = self.rng.gen_range(1..=Nonce::MAX);
        self.send_envelope(&OutboundEnvelope::text(packet_id, to, channel, text))
            .await?;
        if to == BROADCAST_ADDR {
            info!(packet_id, channel, "Sent broadcast text");
        } else {
            info!(packet_id, to, channel, "Sent direct text");
        }
        Ok(packet_id)
    }

    /// Send a heartbeat now
    pub async fn send_heartbeat(&mut self) -> Result<(), EngineError> {
        self.send_heartbeat_at(Instant::now()).await
    }

    async fn send_heartbeat_at(&mut self, now: Instant) -> Result<(), EngineError> {
        let nonce = match self.heartbeat.as_mut() {
            Some(keeper) => keeper.next_nonce(),
            None => 0,
        };
        self.send_envelope(&OutboundEnvelope::Heartbeat(nonce))
            .await?;

        if let Some(keeper) = self.heartbeat.as_mut() {
            keeper.mark_sent(now);
        }
        self.stats.heartbeats_sent += 1;
        Ok(())
    }

    /// Run one iteration: poll, handle at most one frame, heartbeat, expire
    pub async fn tick(&mut self, now: Instant) -> Result<TickReport, EngineError> {
        let bytes_read = if self.buffer.remaining() > 0 {
            let n = self.transport.poll(self.buffer.spare_mut()).await?;
            self.buffer.commit(n)?;
            self.stats.bytes_in += n as u64;
            n
        } else {
            0
        };

        let frame = match self.buffer.poll_frame() {
            Polled::Empty => FrameOutcome::Empty,
            Polled::Incomplete => FrameOutcome::Incomplete,
            Polled::Corrupt { discarded } => {
                self.stats.corrupt_discards += 1;
                FrameOutcome::Corrupt { discarded }
            }
            Polled::Frame { payload, .. } => {
                self.stats.frames_in += 1;
                match self.codec.decode(&payload) {
                    Ok(envelope) => {
                        let dispatched = self.dispatch(envelope, now).await;
                        if !dispatched.is_handled() {
                            self.stats.unhandled += 1;
                        }
                        FrameOutcome::Dispatched(dispatched)
                    }
                    Err(e) => {
                        self.stats.decode_failures += 1;
                        warn!("Dropping undecodable frame ({} bytes): {}", payload.len(), e);
                        FrameOutcome::Undecodable
                    }
                }
            }
        };

        let heartbeat_sent = self.heartbeat_if_due(now).await;
        let report_expired = self.session.expire(now);

        Ok(TickReport {
            bytes_read,
            frame,
            heartbeat_sent,
            report_expired,
        })
    }

    async fn heartbeat_if_due(&mut self, now: Instant) -> bool {
        let due = self
            .heartbeat
            .as_ref()
            .is_some_and(|keeper| keeper.is_due(now));
        if !due {
            return false;
        }

        match self.send_heartbeat_at(now).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Heartbeat failed, retrying next tick: {}", e);
                false
            }
        }
    }

    /// Execute one command; false when the engine should stop
    async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::SendText {
                text,
                to,
                channel,
                reply,
            } => {
                let _ = reply.send(self.send_text(&text, to, channel).await);
            }
            Command::Heartbeat { reply } => {
                let _ = reply.send(self.send_heartbeat().await);
            }
            Command::RequestNodeReport { handler, reply } => {
                let _ = reply.send(self.request_node_report_boxed(handler).await);
            }
            Command::CancelNodeReport => {
                self.cancel_node_report();
            }
            Command::SetDebug(on) => self.set_debug(on),
            Command::Shutdown => {
                self.disconnect().await;
                return false;
            }
        }
        true
    }

    /// Tell the device the client is leaving; failures only get logged
    async fn disconnect(&mut self) {
        if let Err(e) = self.send_envelope(&OutboundEnvelope::Disconnect).await {
            warn!("Disconnect notice not delivered: {}", e);
        }
    }

    /// Drive the engine until shutdown or a transport failure
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<EngineStats, EngineError> {
        info!("Radio engine started ({:?} link)", self.transport.kind());

        loop {
            while let Ok(command) = commands.try_recv() {
                if !self.execute(command).await {
                    info!("Radio engine stopped");
                    return Ok(self.stats);
                }
            }

            let report = match self.tick(Instant::now()).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Radio engine failed: {}", e);
                    return Err(e);
                }
            };

            if report.is_idle() {
                tokio::select! {
                    Some(command) = commands.recv() => {
                        if !self.execute(command).await {
                            info!("Radio engine stopped");
                            return Ok(self.stats);
                        }
                    }
                    _ = tokio::time::sleep(self.config.idle_pause) => {}
                }
            }
        }
    }
}
