//! Routing of inbound mesh packets to registered consumers.
//!
//! Each packet reaches at most one consumer: text messages go to the text
//! handler, other known ports to the generic port handler, and packets the
//! device could not decrypt to the encrypted handler.

use radio_schema::proto::{mesh_packet, Data, MeshPacket};
use radio_schema::PortNum;
use tracing::{debug, trace};

/// Addressing of a received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMeta {
    /// Packet id
    pub id: u32,
    /// Sending node
    pub from: u32,
    /// Destination node
    pub to: u32,
    /// Channel index
    pub channel: u32,
}

impl From<&MeshPacket> for PacketMeta {
    fn from(packet: &MeshPacket) -> Self {
        Self {
            id: packet.id,
            from: packet.from,
            to: packet.to,
            channel: packet.channel,
        }
    }
}

/// Consumer of text messages
pub trait TextMessageHandler: Send {
    /// Handle one text message
    fn on_text(&mut self, meta: PacketMeta, text: &str);
}

impl<F> TextMessageHandler for F
where
    F: FnMut(PacketMeta, &str) + Send,
{
    fn on_text(&mut self, meta: PacketMeta, text: &str) {
        self(meta, text)
    }
}

/// Consumer of non-text application ports
pub trait PortHandler: Send {
    /// Handle one decoded payload
    fn on_port(&mut self, meta: PacketMeta, port: PortNum, payload: &[u8]);
}

impl<F> PortHandler for F
where
    F: FnMut(PacketMeta, PortNum, &[u8]) + Send,
{
    fn on_port(&mut self, meta: PacketMeta, port: PortNum, payload: &[u8]) {
        self(meta, port, payload)
    }
}

/// Consumer of packets still encrypted
pub trait EncryptedHandler: Send {
    /// Handle one encrypted packet
    fn on_encrypted(&mut self, meta: PacketMeta, public_key: &[u8], ciphertext: &[u8]);
}

impl<F> EncryptedHandler for F
where
    F: FnMut(PacketMeta, &[u8], &[u8]) + Send,
{
    fn on_encrypted(&mut self, meta: PacketMeta, public_key: &[u8], ciphertext: &[u8]) {
        self(meta, public_key, ciphertext)
    }
}

/// Packet shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Decoded text message
    Text,
    /// Decoded non-text payload
    Port,
    /// Encrypted payload
    Encrypted,
}

/// Outcome of routing one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Delivered to the text handler
    Text,
    /// Delivered to the port handler
    Port(PortNum),
    /// Delivered to the encrypted handler
    Encrypted,
    /// Recognised, but no handler is registered
    NoConsumer(PacketKind),
    /// Decoded payload on a port this client does not know
    UnknownPort(i32),
    /// Packet carried no payload
    Empty,
}

impl Routed {
    /// Whether the packet counts as handled.
    ///
    /// Decoded packets count as handled even without a consumer; encrypted
    /// packets need one.
    pub fn is_handled(&self) -> bool {
        match self {
            Routed::Text | Routed::Port(_) | Routed::Encrypted => true,
            Routed::NoConsumer(PacketKind::Text | PacketKind::Port) => true,
            Routed::NoConsumer(PacketKind::Encrypted) => false,
            Routed::UnknownPort(_) | Routed::Empty => false,
        }
    }
}

/// Registered packet consumers
#[derive(Default)]
pub struct PacketRouter {
    text: Option<Box<dyn TextMessageHandler>>,
    port: Option<Box<dyn PortHandler>>,
    encrypted: Option<Box<dyn EncryptedHandler>>,
}

impl PacketRouter {
    /// Create a router with no consumers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the text consumer, replacing any previous one
    pub fn set_text_handler(&mut self, handler: impl TextMessageHandler + 'static) {
        self.text = Some(Box::new(handler));
    }

    /// Register the generic port consumer, replacing any previous one
    pub fn set_port_handler(&mut self, handler: impl PortHandler + 'static) {
        self.port = Some(Box::new(handler));
    }

    /// Register the encrypted consumer, replacing any previous one
    pub fn set_encrypted_handler(&mut self, handler: impl EncryptedHandler + 'static) {
        self.encrypted = Some(Box::new(handler));
    }

    /// Deliver a packet to at most one consumer
    pub fn route(&mut self, packet: &MeshPacket) -> Routed {
        let meta = PacketMeta::from(packet);
        match &packet.payload_variant {
            Some(mesh_packet::PayloadVariant::Decoded(data)) => self.route_decoded(meta, data),
            Some(mesh_packet::PayloadVariant::Encrypted(ciphertext)) => {
                match self.encrypted.as_mut() {
                    Some(handler) => {
                        trace!("Encrypted packet {:#010x} from {:#010x}", meta.id, meta.from);
                        handler.on_encrypted(meta, &packet.public_key, ciphertext);
                        Routed::Encrypted
                    }
                    None => Routed::NoConsumer(PacketKind::Encrypted),
                }
            }
            None => {
                debug!("Packet {:#010x} from {:#010x} has no payload", meta.id, meta.from);
                Routed::Empty
            }
        }
    }

    fn route_decoded(&mut self, meta: PacketMeta, data: &Data) -> Routed {
        let port = match PortNum::try_from(data.portnum) {
            Ok(port) => port,
            Err(_) => {
                debug!("Packet {:#010x} on unknown port {}", meta.id, data.portnum);
                return Routed::UnknownPort(data.portnum);
            }
        };

        if port == PortNum::TextMessageApp {
            return match self.text.as_mut() {
                Some(handler) => {
                    let text = String::from_utf8_lossy(&data.payload);
                    handler.on_text(meta, &text);
                    Routed::Text
                }
                None => Routed::NoConsumer(PacketKind::Text),
            };
        }

        match self.port.as_mut() {
            Some(handler) => {
                trace!(port = port.name(), id = meta.id, "Routing port packet");
                handler.on_port(meta, port, &data.payload);
                Routed::Port(port)
            }
            None => Routed::NoConsumer(PacketKind::Port),
        }
    }
}
