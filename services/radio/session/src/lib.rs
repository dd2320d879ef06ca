//! Client-side session engine for a mesh radio.
//!
//! This crate drives one link to a radio device: it polls the transport,
//! reassembles frames, decodes envelopes and dispatches them, correlates
//! node-report requests with their completions, keeps serial links alive and
//! recovers from device reboots.
//!
//! ## Features
//!
//! - **Transports**: serial ports and TCP sockets behind one [`Transport`] trait
//! - **Node reports**: nonce-correlated, one at a time, with optional deadline
//! - **Packet routing**: text, generic port and encrypted consumers
//! - **Heartbeats**: once per interval on serial links
//! - **Reboot recovery**: configuration re-requested with a reserved nonce
//!
//! ## Example
//!
//! ```rust,no_run
//! use radio_session::{connect_tcp, command_channel, EngineConfig, RadioEngine, ReportEvent};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = connect_tcp("192.168.1.20:4403".parse()?).await?;
//! let engine = RadioEngine::new(transport, EngineConfig::default())?;
//!
//! let (handle, commands) = command_channel(16);
//! let task = tokio::spawn(engine.run(commands));
//!
//! handle
//!     .request_node_report(|event: ReportEvent| println!("{:?}", event))
//!     .await?;
//! handle.shutdown().await?;
//! task.await??;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod reboot;
pub mod record;
pub mod report;
pub mod router;
pub mod transport;

// Re-export main types
pub use dispatch::Dispatched;
pub use engine::{
    command_channel, Command, EngineConfig, EngineHandle, EngineStats, FrameOutcome, RadioEngine,
    TickReport, MAX_TEXT_BYTES,
};
pub use error::{EngineError, TransportError};
pub use heartbeat::{HeartbeatKeeper, DEFAULT_HEARTBEAT_INTERVAL};
pub use record::{NodeIdentity, NodeMetrics, NodePosition, NodeRecord};
pub use report::{
    Completion, NodeReportHandler, NodeReportSession, Nonce, ReportEvent, ReportProgress,
    SessionState,
};
pub use router::{
    EncryptedHandler, PacketKind, PacketMeta, PacketRouter, PortHandler, Routed,
    TextMessageHandler,
};
pub use transport::{
    connect_tcp, open_serial, StreamTransport, Transport, TransportKind, DEFAULT_BAUD_RATE,
    DEFAULT_TCP_PORT,
};
