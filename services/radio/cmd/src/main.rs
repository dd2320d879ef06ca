//! Mesh radio client binary.
//!
//! Attaches to a radio over serial or TCP, prints text messages and other
//! traffic it hears, and can request the node database or send a text
//! message on startup.

use anyhow::{Context, Result};
use clap::Parser;
use radio_schema::BROADCAST_ADDR;
use radio_session::{
    command_channel, connect_tcp, open_serial, EngineConfig, EngineHandle, NodeRecord,
    PacketMeta, RadioEngine, ReportEvent, Transport,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod logging;

use config::{parse_node_num, RadioConfig, TransportTarget};
use logging::RadioLogFormatter;

/// Depth of the command queue into the engine
const COMMAND_QUEUE_DEPTH: usize = 32;

/// Mesh radio client
#[derive(Parser, Debug)]
#[command(name = "mt-radio", version, about = "Client for mesh radios over serial or TCP")]
struct Args {
    /// Serial device, e.g. /dev/ttyUSB0
    #[arg(long, conflicts_with = "tcp")]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Device network address, e.g. 192.168.1.20 or 192.168.1.20:4403
    #[arg(long)]
    tcp: Option<String>,

    /// Serial heartbeat interval, e.g. 60s
    #[arg(long)]
    heartbeat_interval: Option<humantime::Duration>,

    /// Node report deadline, e.g. 30s
    #[arg(long)]
    report_timeout: Option<humantime::Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log every envelope received
    #[arg(long)]
    debug: bool,

    /// Request the node database on startup
    #[arg(long)]
    report: bool,

    /// Send a text message on startup
    #[arg(long)]
    send_text: Option<String>,

    /// Destination for --send-text: !a1b2c3d4, 0x..., decimal or broadcast
    #[arg(long, default_value = "broadcast")]
    to: String,

    /// Channel index for --send-text
    #[arg(long, default_value_t = 0)]
    channel: u32,

    /// Exit after the startup actions instead of listening
    #[arg(long)]
    once: bool,

    /// Configuration file path
    #[arg(long, default_value = "mt-radio.yaml")]
    config: PathBuf,
}

impl Args {
    /// Command line flags override file and environment settings
    fn apply_to(&self, config: &mut RadioConfig) {
        if let Some(serial) = &self.serial {
            config.serial_port = Some(serial.clone());
            config.tcp_addr = None;
        }
        if let Some(tcp) = &self.tcp {
            config.tcp_addr = Some(tcp.clone());
            config.serial_port = None;
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval.into();
        }
        if let Some(timeout) = self.report_timeout {
            config.report_timeout = Some(timeout.into());
        }
        if self.debug {
            config.debug = true;
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::new("info")
        .add_directive(format!("mt_radio={}", args.log_level).parse()?)
        .add_directive(format!("radio_session={}", args.log_level).parse()?)
        .add_directive(format!("radio_wire={}", args.log_level).parse()?)
        .add_directive(format!("radio_schema={}", args.log_level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(RadioLogFormatter::new("mt-radio".to_string()))
        .init();

    info!("Starting mt-radio v{}", env!("CARGO_PKG_VERSION"));

    let mut config = RadioConfig::load_from_file(&args.config)?;
    args.apply_to(&mut config);
    let engine_config = config.engine_config();

    match config.transport_target()? {
        TransportTarget::Serial { path, baud_rate } => {
            let transport = open_serial(&path, baud_rate)
                .with_context(|| format!("failed to open serial port {}", path))?
                .with_poll_wait(config.poll_wait);
            run_client(transport, engine_config, &args).await
        }
        TransportTarget::Network(target) => {
            let addr = tokio::net::lookup_host(&target)
                .await
                .with_context(|| format!("failed to resolve {}", target))?
                .next()
                .with_context(|| format!("no address found for {}", target))?;
            let transport = connect_tcp(addr)
                .await
                .with_context(|| format!("failed to connect to {}", addr))?
                .with_poll_wait(config.poll_wait);
            run_client(transport, engine_config, &args).await
        }
    }
}

async fn run_client<T>(transport: T, engine_config: EngineConfig, args: &Args) -> Result<()>
where
    T: Transport + 'static,
{
    let mut engine = RadioEngine::new(transport, engine_config)?;
    register_printers(&mut engine);

    let (handle, commands) = command_channel(COMMAND_QUEUE_DEPTH);
    let engine_task = tokio::spawn(engine.run(commands));

    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_handle.shutdown().await;
        }
    });

    if let Err(e) = startup_actions(&handle, args).await {
        component_error!("client", "Startup action failed: {:#}", e);
    }

    if args.once {
        let _ = handle.shutdown().await;
    }

    let stats = engine_task.await.context("engine task panicked")??;
    info!(
        "Engine stats: frames_in={} frames_out={} bytes_in={} bytes_out={} corrupt={} undecodable={} unhandled={} heartbeats={}",
        stats.frames_in,
        stats.frames_out,
        stats.bytes_in,
        stats.bytes_out,
        stats.corrupt_discards,
        stats.decode_failures,
        stats.unhandled,
        stats.heartbeats_sent
    );
    Ok(())
}

fn register_printers<T: Transport>(engine: &mut RadioEngine<T>) {
    engine.set_text_message_handler(|meta: PacketMeta, text: &str| {
        component_info!("text", "{} → {}: {}", node_label(meta.from), node_label(meta.to), text);
    });
    engine.set_port_handler(|meta: PacketMeta, port: radio_schema::PortNum, payload: &[u8]| {
        component_debug!(
            "port",
            "{} packet from {} ({} bytes)",
            port.name(),
            node_label(meta.from),
            payload.len()
        );
    });
    engine.set_encrypted_handler(|meta: PacketMeta, _key: &[u8], ciphertext: &[u8]| {
        component_debug!(
            "encrypted",
            "Encrypted packet from {} ({} bytes)",
            node_label(meta.from),
            ciphertext.len()
        );
    });
}

async fn startup_actions(handle: &EngineHandle, args: &Args) -> Result<()> {
    if args.report {
        print_node_report(handle).await?;
    }

    if let Some(text) = &args.send_text {
        let to = parse_node_num(&args.to)?;
        let packet_id = handle.send_text(text.as_str(), to, args.channel).await?;
        component_info!("text", "Queued message {:#010x} to {}", packet_id, node_label(to));
    }

    Ok(())
}

async fn print_node_report(handle: &EngineHandle) -> Result<()> {
    let (tx, mut events) = mpsc::unbounded_channel();
    let nonce = handle
        .request_node_report(move |event: ReportEvent| {
            let _ = tx.send(event);
        })
        .await?;
    component_info!("report", "Waiting for node report {}", nonce);

    let mut nodes = 0usize;
    while let Some(event) = events.recv().await {
        match event {
            ReportEvent::Node(record) => {
                nodes += 1;
                print_node(&record);
            }
            ReportEvent::Invalid { received } => {
                component_warn!("report", "Ignoring completion {} for another request", received);
            }
            ReportEvent::Done => {
                component_info!("report", "Node report complete: {} nodes", nodes);
                break;
            }
            ReportEvent::TimedOut => {
                component_warn!("report", "Node report timed out after {} nodes", nodes);
                break;
            }
            ReportEvent::Cancelled => break,
        }
    }
    Ok(())
}

fn print_node(record: &NodeRecord) {
    let position = record
        .position
        .as_ref()
        .and_then(|p| Some(format!(" at {:.5},{:.5}", p.latitude?, p.longitude?)))
        .unwrap_or_default();
    let battery = record
        .metrics
        .as_ref()
        .and_then(|m| m.battery_level)
        .map(|level| format!(" battery {}%", level))
        .unwrap_or_default();
    let heard = chrono::DateTime::from_timestamp(i64::from(record.last_heard), 0)
        .filter(|_| record.last_heard != 0)
        .map(|t| format!(" heard {}", t.format("%Y-%m-%d %H:%M:%S")))
        .unwrap_or_default();

    component_info!(
        "report",
        "{}{} {}{}{}{}",
        node_label(record.node_num),
        if record.is_local { " (local)" } else { "" },
        record.display_name(),
        position,
        battery,
        heard
    );
}

fn node_label(num: u32) -> String {
    if num == BROADCAST_ADDR {
        "broadcast".to_string()
    } else {
        format!("!{:08x}", num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides_transport() {
        let args = Args::parse_from(["mt-radio", "--tcp", "10.0.0.9", "--heartbeat-interval", "5s"]);
        let mut config = RadioConfig {
            serial_port: Some("/dev/ttyUSB0".to_string()),
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.serial_port, None);
        assert_eq!(config.tcp_addr.as_deref(), Some("10.0.0.9"));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_serial_and_tcp_conflict() {
        assert!(Args::try_parse_from(["mt-radio", "--serial", "/dev/ttyUSB0", "--tcp", "h"]).is_err());
    }

    #[test]
    fn test_node_label() {
        assert_eq!(node_label(BROADCAST_ADDR), "broadcast");
        assert_eq!(node_label(0xA1), "!000000a1");
    }
}
