//! Inbound envelope dispatch.

use crate::engine::RadioEngine;
use crate::record::NodeRecord;
use crate::report::{Completion, Nonce};
use crate::router::Routed;
use crate::transport::Transport;
use radio_schema::proto::mqtt_client_proxy_message;
use radio_schema::{InboundEnvelope, SchemaCodec};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Minimum gap between unknown-envelope diagnostics
pub const UNKNOWN_DIAGNOSTIC_GAP: Duration = Duration::from_millis(100);

/// What dispatching one envelope did
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Bare identity acknowledgement
    IdentityAck(u32),
    /// Learned the attached device's node number
    LocalNode(u32),
    /// Routed a mesh packet
    Packet(Routed),
    /// Offered a node entry to the report session
    NodeUpdate {
        /// Node number
        node_num: u32,
        /// A report was outstanding and received the entry
        accepted: bool,
    },
    /// Processed a completion envelope
    Completion(Completion),
    /// Handled a device reboot
    Rebooted {
        /// The recovery request went out
        request_sent: bool,
    },
    /// Diagnostic-only envelope
    Diagnostic(&'static str),
    /// Envelope kind not known to this client
    Unknown(Option<u32>),
}

impl Dispatched {
    /// Whether the envelope counts as handled
    pub fn is_handled(&self) -> bool {
        match self {
            Dispatched::IdentityAck(_)
            | Dispatched::LocalNode(_)
            | Dispatched::Completion(_)
            | Dispatched::Rebooted { .. }
            | Dispatched::Diagnostic(_) => true,
            Dispatched::Packet(routed) => routed.is_handled(),
            Dispatched::NodeUpdate { accepted, .. } => *accepted,
            Dispatched::Unknown(_) => false,
        }
    }
}

/// Rate limit for a repeated diagnostic
#[derive(Debug, Clone)]
pub struct DiagnosticLimiter {
    gap: Duration,
    last: Option<Instant>,
}

impl DiagnosticLimiter {
    /// At most one diagnostic per `gap`
    pub fn new(gap: Duration) -> Self {
        Self { gap, last: None }
    }

    /// Whether a diagnostic may be emitted at `now`
    pub fn allow(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.gap => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl Default for DiagnosticLimiter {
    fn default() -> Self {
        Self::new(UNKNOWN_DIAGNOSTIC_GAP)
    }
}

/// One-line summary of a diagnostic envelope
pub fn describe(envelope: &InboundEnvelope) -> String {
    match envelope {
        InboundEnvelope::Config(config) => format!(
            "config: {}",
            config.payload_variant.as_ref().map_or("empty", |v| v.name())
        ),
        InboundEnvelope::ModuleConfig(module) => format!(
            "moduleConfig: {}",
            module.payload_variant.as_ref().map_or("empty", |v| v.name())
        ),
        InboundEnvelope::Channel(channel) => {
            format!("channel: index={} role={}", channel.index, channel.role)
        }
        InboundEnvelope::LogRecord(record) => {
            format!("log_record: [{}] {}", record.source, record.message)
        }
        InboundEnvelope::QueueStatus(status) => format!(
            "queueStatus: free={} maxlen={} res={}",
            status.free, status.maxlen, status.res
        ),
        InboundEnvelope::XModem(xmodem) => format!(
            "xmodemPacket: control={} seq={} len={}",
            xmodem.control,
            xmodem.seq,
            xmodem.buffer.len()
        ),
        InboundEnvelope::Metadata(metadata) => format!(
            "metadata: firmware={} hw_model={}",
            metadata.firmware_version, metadata.hw_model
        ),
        InboundEnvelope::MqttProxy(message) => {
            let len = match &message.payload_variant {
                Some(mqtt_client_proxy_message::PayloadVariant::Data(data)) => data.len(),
                Some(mqtt_client_proxy_message::PayloadVariant::Text(text)) => text.len(),
                None => 0,
            };
            format!("mqttClientProxyMessage: topic={} len={}", message.topic, len)
        }
        InboundEnvelope::FileInfo(file) => {
            format!("fileInfo: {} ({} bytes)", file.file_name, file.size_bytes)
        }
        InboundEnvelope::ClientNotification(notification) => {
            format!("clientNotification: {}", notification.message)
        }
        InboundEnvelope::DeviceUiConfig(body) => format!("deviceuiConfig: {} bytes", body.len()),
        other => other.name().to_string(),
    }
}

impl<T, C> RadioEngine<T, C>
where
    T: Transport,
    C: SchemaCodec,
{
    /// Dispatch one decoded envelope
    pub(crate) async fn dispatch(&mut self, envelope: InboundEnvelope, now: Instant) -> Dispatched {
        match envelope {
            InboundEnvelope::IdentityAck(id) => {
                trace!("Identity ack {}", id);
                Dispatched::IdentityAck(id)
            }
            InboundEnvelope::MyInfo(info) => {
                info!("Attached to node {:#010x}", info.my_node_num);
                self.local_node = Some(info.my_node_num);
                Dispatched::LocalNode(info.my_node_num)
            }
            InboundEnvelope::Packet(packet) => Dispatched::Packet(self.router.route(&packet)),
            InboundEnvelope::NodeInfo(info) => {
                let record = NodeRecord::from_node_info(&info, self.local_node);
                let node_num = record.node_num;
                let accepted = self.session.on_update(record);
                Dispatched::NodeUpdate { node_num, accepted }
            }
            InboundEnvelope::ConfigComplete(id) => {
                Dispatched::Completion(self.session.on_complete(Nonce::new(id)))
            }
            InboundEnvelope::Rebooted => {
                let request = self.reboot.on_reboot();
                let request_sent = match self.send_envelope(&request).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to request configuration after reboot: {}", e);
                        false
                    }
                };
                Dispatched::Rebooted { request_sent }
            }
            InboundEnvelope::Unknown { tag } => {
                if self.debug && self.unknown_limiter.allow(now) {
                    match tag {
                        Some(tag) => debug!("Unhandled envelope tag {}", tag),
                        None => debug!("Envelope without payload"),
                    }
                }
                Dispatched::Unknown(tag)
            }
            other => {
                if self.debug {
                    debug!("{}", describe(&other));
                }
                Dispatched::Diagnostic(other.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_schema::proto::{config, module_config, Config, ModuleConfig, QueueStatus};

    #[test]
    fn test_limiter_allows_one_per_gap() {
        let mut limiter = DiagnosticLimiter::default();
        let start = Instant::now();

        assert!(limiter.allow(start));
        assert!(!limiter.allow(start + Duration::from_millis(50)));
        assert!(!limiter.allow(start + Duration::from_millis(99)));
        assert!(limiter.allow(start + Duration::from_millis(100)));
    }

    #[test]
    fn test_describe_names_sub_variant() {
        let lora = InboundEnvelope::Config(Config {
            payload_variant: Some(config::PayloadVariant::Lora(vec![])),
        });
        assert_eq!(describe(&lora), "config: lora");

        let mqtt = InboundEnvelope::ModuleConfig(ModuleConfig {
            payload_variant: Some(module_config::PayloadVariant::Mqtt(vec![])),
        });
        assert_eq!(describe(&mqtt), "moduleConfig: mqtt");

        let queue = InboundEnvelope::QueueStatus(QueueStatus {
            free: 4,
            maxlen: 16,
            ..Default::default()
        });
        assert_eq!(describe(&queue), "queueStatus: free=4 maxlen=16 res=0");
    }

    #[test]
    fn test_handled_classification() {
        assert!(Dispatched::Diagnostic("channel").is_handled());
        assert!(Dispatched::Rebooted { request_sent: false }.is_handled());
        assert!(!Dispatched::NodeUpdate {
            node_num: 1,
            accepted: false
        }
        .is_handled());
        assert!(!Dispatched::Unknown(Some(40)).is_handled());
        assert!(!Dispatched::Packet(Routed::Empty).is_handled());
    }
}
