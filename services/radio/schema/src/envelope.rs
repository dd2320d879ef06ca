//! Tagged envelopes exchanged with the device.
//!
//! These are the values the session layer dispatches on. They flatten the
//! protobuf oneofs into a single enum per direction so every envelope kind,
//! including ones the client does not recognise, has exactly one variant.

use crate::proto::{
    self, from_radio, to_radio, Channel, ClientNotification, Config, DeviceMetadata, FileInfo,
    FromRadio, Heartbeat, LogRecord, MeshPacket, ModuleConfig, MqttClientProxyMessage,
    MyNodeInfo, NodeInfo, QueueStatus, ToRadio, XModem,
};

/// Destination address that reaches every node
pub const BROADCAST_ADDR: u32 = 0xFFFF_FFFF;

/// Envelope sent to the device
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEnvelope {
    /// Transmit a packet on the mesh
    Packet(MeshPacket),
    /// Request the node database, tagged with a correlation nonce
    WantConfig(u32),
    /// Serial keepalive
    Heartbeat(u32),
    /// Drop the client connection
    Disconnect,
}

impl OutboundEnvelope {
    /// Envelope kind for logging
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEnvelope::Packet(_) => "packet",
            OutboundEnvelope::WantConfig(_) => "want_config",
            OutboundEnvelope::Heartbeat(_) => "heartbeat",
            OutboundEnvelope::Disconnect => "disconnect",
        }
    }

    /// Protobuf message for this envelope
    pub fn to_message(&self) -> ToRadio {
        let variant = match self {
            OutboundEnvelope::Packet(packet) => to_radio::PayloadVariant::Packet(packet.clone()),
            OutboundEnvelope::WantConfig(nonce) => to_radio::PayloadVariant::WantConfigId(*nonce),
            OutboundEnvelope::Heartbeat(nonce) => {
                to_radio::PayloadVariant::Heartbeat(Heartbeat { nonce: *nonce })
            }
            OutboundEnvelope::Disconnect => to_radio::PayloadVariant::Disconnect(true),
        };
        ToRadio {
            payload_variant: Some(variant),
        }
    }
}

/// Envelope received from the device
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEnvelope {
    /// Bare envelope carrying only the device-assigned id
    IdentityAck(u32),
    /// Packet heard on the mesh
    Packet(MeshPacket),
    /// Identity of the attached device
    MyInfo(MyNodeInfo),
    /// Node database entry
    NodeInfo(NodeInfo),
    /// End of a node report, echoing the request nonce
    ConfigComplete(u32),
    /// The device rebooted
    Rebooted,
    /// Device configuration section
    Config(Config),
    /// Module configuration section
    ModuleConfig(ModuleConfig),
    /// Channel definition
    Channel(Channel),
    /// Device log line
    LogRecord(LogRecord),
    /// Transmit queue status
    QueueStatus(QueueStatus),
    /// File transfer chunk
    XModem(XModem),
    /// Firmware and hardware metadata
    Metadata(DeviceMetadata),
    /// Proxied MQTT message
    MqttProxy(MqttClientProxyMessage),
    /// File listing entry
    FileInfo(FileInfo),
    /// Notification meant for the user
    ClientNotification(ClientNotification),
    /// Device UI settings, still encoded
    DeviceUiConfig(Vec<u8>),
    /// Envelope with a payload tag the client does not know
    Unknown {
        /// First unrecognised field number, if any was present
        tag: Option<u32>,
    },
}

impl InboundEnvelope {
    /// Envelope kind for logging
    pub fn name(&self) -> &'static str {
        match self {
            InboundEnvelope::IdentityAck(_) => "id",
            InboundEnvelope::Packet(_) => "packet",
            InboundEnvelope::MyInfo(_) => "my_info",
            InboundEnvelope::NodeInfo(_) => "node_info",
            InboundEnvelope::ConfigComplete(_) => "config_complete_id",
            InboundEnvelope::Rebooted => "rebooted",
            InboundEnvelope::Config(_) => "config",
            InboundEnvelope::ModuleConfig(_) => "moduleConfig",
            InboundEnvelope::Channel(_) => "channel",
            InboundEnvelope::LogRecord(_) => "log_record",
            InboundEnvelope::QueueStatus(_) => "queueStatus",
            InboundEnvelope::XModem(_) => "xmodemPacket",
            InboundEnvelope::Metadata(_) => "metadata",
            InboundEnvelope::MqttProxy(_) => "mqttClientProxyMessage",
            InboundEnvelope::FileInfo(_) => "fileInfo",
            InboundEnvelope::ClientNotification(_) => "clientNotification",
            InboundEnvelope::DeviceUiConfig(_) => "deviceuiConfig",
            InboundEnvelope::Unknown { .. } => "unknown",
        }
    }

    /// Build from a decoded protobuf envelope.
    ///
    /// `unknown_tag` is consulted only when no known payload was present.
    pub fn from_message(message: FromRadio, unknown_tag: Option<u32>) -> Self {
        let variant = match message.payload_variant {
            Some(variant) => variant,
            None if unknown_tag.is_some() => return InboundEnvelope::Unknown { tag: unknown_tag },
            None if message.id != 0 => return InboundEnvelope::IdentityAck(message.id),
            None => return InboundEnvelope::Unknown { tag: None },
        };

        match variant {
            from_radio::PayloadVariant::Packet(packet) => InboundEnvelope::Packet(packet),
            from_radio::PayloadVariant::MyInfo(info) => InboundEnvelope::MyInfo(info),
            from_radio::PayloadVariant::NodeInfo(info) => InboundEnvelope::NodeInfo(info),
            from_radio::PayloadVariant::Config(config) => InboundEnvelope::Config(config),
            from_radio::PayloadVariant::LogRecord(record) => InboundEnvelope::LogRecord(record),
            from_radio::PayloadVariant::ConfigCompleteId(nonce) => {
                InboundEnvelope::ConfigComplete(nonce)
            }
            from_radio::PayloadVariant::Rebooted(_) => InboundEnvelope::Rebooted,
            from_radio::PayloadVariant::ModuleConfig(module) => {
                InboundEnvelope::ModuleConfig(module)
            }
            from_radio::PayloadVariant::Channel(channel) => InboundEnvelope::Channel(channel),
            from_radio::PayloadVariant::QueueStatus(status) => {
                InboundEnvelope::QueueStatus(status)
            }
            from_radio::PayloadVariant::XmodemPacket(packet) => InboundEnvelope::XModem(packet),
            from_radio::PayloadVariant::Metadata(meta) => InboundEnvelope::Metadata(meta),
            from_radio::PayloadVariant::MqttClientProxyMessage(message) => {
                InboundEnvelope::MqttProxy(message)
            }
            from_radio::PayloadVariant::FileInfo(info) => InboundEnvelope::FileInfo(info),
            from_radio::PayloadVariant::ClientNotification(note) => {
                InboundEnvelope::ClientNotification(note)
            }
            from_radio::PayloadVariant::DeviceuiConfig(raw) => InboundEnvelope::DeviceUiConfig(raw),
        }
    }
}

/// Helpers for building outbound packets
impl OutboundEnvelope {
    /// Text message packet on the text port
    pub fn text(packet_id: u32, to: u32, channel: u32, text: &str) -> Self {
        OutboundEnvelope::Packet(MeshPacket {
            to,
            channel,
            id: packet_id,
            want_ack: true,
            payload_variant: Some(proto::mesh_packet::PayloadVariant::Decoded(proto::Data {
                portnum: proto::PortNum::TextMessageApp as i32,
                payload: text.as_bytes().to_vec(),
                ..Default::default()
            })),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id_is_identity_ack() {
        let message = FromRadio {
            id: 7,
            payload_variant: None,
        };
        assert_eq!(
            InboundEnvelope::from_message(message, None),
            InboundEnvelope::IdentityAck(7)
        );
    }

    #[test]
    fn test_unknown_tag_wins_over_bare_id() {
        let message = FromRadio {
            id: 7,
            payload_variant: None,
        };
        assert_eq!(
            InboundEnvelope::from_message(message, Some(42)),
            InboundEnvelope::Unknown { tag: Some(42) }
        );
    }

    #[test]
    fn test_text_packet_shape() {
        let OutboundEnvelope::Packet(packet) = OutboundEnvelope::text(99, BROADCAST_ADDR, 2, "hi")
        else {
            panic!("expected packet");
        };
        assert_eq!(packet.to, BROADCAST_ADDR);
        assert_eq!(packet.channel, 2);
        assert!(packet.want_ack);
        match packet.payload_variant {
            Some(proto::mesh_packet::PayloadVariant::Decoded(data)) => {
                assert_eq!(data.portnum, proto::PortNum::TextMessageApp as i32);
                assert_eq!(data.payload, b"hi".to_vec());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
