//! Protobuf messages exchanged with the device.
//!
//! Field numbers follow the device firmware's schema. Sub-messages the client
//! never inspects (config sections, channel settings) are carried as raw bytes,
//! which is wire-compatible with the nested message encoding.

/// Envelope sent to the device
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToRadio {
    /// Payload
    #[prost(oneof = "to_radio::PayloadVariant", tags = "1, 3, 4, 7")]
    pub payload_variant: Option<to_radio::PayloadVariant>,
}

/// Nested types for [`ToRadio`]
pub mod to_radio {
    /// Payload of a [`ToRadio`](super::ToRadio) envelope
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Packet to transmit on the mesh
        #[prost(message, tag = "1")]
        Packet(super::MeshPacket),
        /// Request the node database and config, tagged with a nonce
        #[prost(uint32, tag = "3")]
        WantConfigId(u32),
        /// Ask the device to drop the client connection
        #[prost(bool, tag = "4")]
        Disconnect(bool),
        /// Keep the serial link alive
        #[prost(message, tag = "7")]
        Heartbeat(super::Heartbeat),
    }
}

/// Envelope received from the device
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FromRadio {
    /// Monotonic envelope id assigned by the device
    #[prost(uint32, tag = "1")]
    pub id: u32,
    /// Payload
    #[prost(
        oneof = "from_radio::PayloadVariant",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17"
    )]
    pub payload_variant: Option<from_radio::PayloadVariant>,
}

/// Nested types for [`FromRadio`]
pub mod from_radio {
    /// Payload of a [`FromRadio`](super::FromRadio) envelope
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Packet heard on the mesh
        #[prost(message, tag = "2")]
        Packet(super::MeshPacket),
        /// Identity of the device we are attached to
        #[prost(message, tag = "3")]
        MyInfo(super::MyNodeInfo),
        /// One entry of the node database
        #[prost(message, tag = "4")]
        NodeInfo(super::NodeInfo),
        /// Device configuration section
        #[prost(message, tag = "5")]
        Config(super::Config),
        /// Device log line
        #[prost(message, tag = "6")]
        LogRecord(super::LogRecord),
        /// End of a config stream, echoing the request nonce
        #[prost(uint32, tag = "7")]
        ConfigCompleteId(u32),
        /// The device rebooted
        #[prost(bool, tag = "8")]
        Rebooted(bool),
        /// Module configuration section
        #[prost(message, tag = "9")]
        ModuleConfig(super::ModuleConfig),
        /// Channel definition
        #[prost(message, tag = "10")]
        Channel(super::Channel),
        /// Transmit queue status
        #[prost(message, tag = "11")]
        QueueStatus(super::QueueStatus),
        /// File transfer chunk
        #[prost(message, tag = "12")]
        XmodemPacket(super::XModem),
        /// Firmware and hardware metadata
        #[prost(message, tag = "13")]
        Metadata(super::DeviceMetadata),
        /// MQTT message proxied through the client
        #[prost(message, tag = "14")]
        MqttClientProxyMessage(super::MqttClientProxyMessage),
        /// File listing entry
        #[prost(message, tag = "15")]
        FileInfo(super::FileInfo),
        /// Notification meant for the user
        #[prost(message, tag = "16")]
        ClientNotification(super::ClientNotification),
        /// Device UI settings
        #[prost(bytes, tag = "17")]
        DeviceuiConfig(Vec<u8>),
    }
}

/// Packet carried over the mesh
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeshPacket {
    /// Sending node
    #[prost(fixed32, tag = "1")]
    pub from: u32,
    /// Destination node (or broadcast)
    #[prost(fixed32, tag = "2")]
    pub to: u32,
    /// Channel index
    #[prost(uint32, tag = "3")]
    pub channel: u32,
    /// Decoded or encrypted payload
    #[prost(oneof = "mesh_packet::PayloadVariant", tags = "4, 5")]
    pub payload_variant: Option<mesh_packet::PayloadVariant>,
    /// Packet id
    #[prost(fixed32, tag = "6")]
    pub id: u32,
    /// Receive time (epoch seconds)
    #[prost(fixed32, tag = "7")]
    pub rx_time: u32,
    /// Receive SNR
    #[prost(float, tag = "8")]
    pub rx_snr: f32,
    /// Remaining hops
    #[prost(uint32, tag = "9")]
    pub hop_limit: u32,
    /// Request an acknowledgement
    #[prost(bool, tag = "10")]
    pub want_ack: bool,
    /// Receive RSSI
    #[prost(int32, tag = "12")]
    pub rx_rssi: i32,
    /// Arrived through an MQTT gateway
    #[prost(bool, tag = "14")]
    pub via_mqtt: bool,
    /// Hop limit at origin
    #[prost(uint32, tag = "15")]
    pub hop_start: u32,
    /// Sender public key for PKI-encrypted packets
    #[prost(bytes = "vec", tag = "16")]
    pub public_key: Vec<u8>,
    /// Payload was encrypted with the sender's key pair
    #[prost(bool, tag = "17")]
    pub pki_encrypted: bool,
}

/// Nested types for [`MeshPacket`]
pub mod mesh_packet {
    /// Payload of a [`MeshPacket`](super::MeshPacket)
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Payload the device could decrypt
        #[prost(message, tag = "4")]
        Decoded(super::Data),
        /// Payload the device could not decrypt
        #[prost(bytes, tag = "5")]
        Encrypted(Vec<u8>),
    }
}

/// Decoded application payload
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Data {
    /// Application port
    #[prost(enumeration = "PortNum", tag = "1")]
    pub portnum: i32,
    /// Port-specific bytes
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
    /// Ask the recipient to answer
    #[prost(bool, tag = "3")]
    pub want_response: bool,
    /// Final destination for relayed packets
    #[prost(fixed32, tag = "4")]
    pub dest: u32,
    /// Original sender for relayed packets
    #[prost(fixed32, tag = "5")]
    pub source: u32,
    /// Id of the packet this answers
    #[prost(fixed32, tag = "6")]
    pub request_id: u32,
    /// Id of the packet this replies to
    #[prost(fixed32, tag = "7")]
    pub reply_id: u32,
    /// Payload is an emoji reaction
    #[prost(fixed32, tag = "8")]
    pub emoji: u32,
}

/// Application ports recognised by the client
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PortNum {
    /// Unspecified
    UnknownApp = 0,
    /// UTF-8 text
    TextMessageApp = 1,
    /// GPIO control
    RemoteHardwareApp = 2,
    /// Position reports
    PositionApp = 3,
    /// User info broadcasts
    NodeinfoApp = 4,
    /// Routing and acknowledgements
    RoutingApp = 5,
    /// Remote administration
    AdminApp = 6,
    /// Compressed text
    TextMessageCompressedApp = 7,
    /// Waypoints
    WaypointApp = 8,
    /// Audio
    AudioApp = 9,
    /// Detection sensor events
    DetectionSensorApp = 10,
    /// Ping reply service
    ReplyApp = 32,
    /// IP tunnel
    IpTunnelApp = 33,
    /// People counter
    PaxcounterApp = 34,
    /// Serial bridge
    SerialApp = 64,
    /// Store and forward
    StoreForwardApp = 65,
    /// Range test
    RangeTestApp = 66,
    /// Telemetry
    TelemetryApp = 67,
    /// Zero-GPS positioning
    ZpsApp = 68,
    /// Simulator
    SimulatorApp = 69,
    /// Traceroute
    TracerouteApp = 70,
    /// Neighbor info
    NeighborinfoApp = 71,
    /// ATAK plugin
    AtakPlugin = 72,
    /// Map reports
    MapReportApp = 73,
    /// Power stress testing
    PowerstressApp = 74,
    /// Private application range
    PrivateApp = 256,
    /// ATAK forwarder
    AtakForwarder = 257,
    /// Highest port number
    Max = 511,
}

impl PortNum {
    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            PortNum::UnknownApp => "unknown",
            PortNum::TextMessageApp => "text",
            PortNum::RemoteHardwareApp => "remote-hardware",
            PortNum::PositionApp => "position",
            PortNum::NodeinfoApp => "nodeinfo",
            PortNum::RoutingApp => "routing",
            PortNum::AdminApp => "admin",
            PortNum::TextMessageCompressedApp => "text-compressed",
            PortNum::WaypointApp => "waypoint",
            PortNum::AudioApp => "audio",
            PortNum::DetectionSensorApp => "detection-sensor",
            PortNum::ReplyApp => "reply",
            PortNum::IpTunnelApp => "ip-tunnel",
            PortNum::PaxcounterApp => "paxcounter",
            PortNum::SerialApp => "serial",
            PortNum::StoreForwardApp => "store-forward",
            PortNum::RangeTestApp => "range-test",
            PortNum::TelemetryApp => "telemetry",
            PortNum::ZpsApp => "zps",
            PortNum::SimulatorApp => "simulator",
            PortNum::TracerouteApp => "traceroute",
            PortNum::NeighborinfoApp => "neighborinfo",
            PortNum::AtakPlugin => "atak-plugin",
            PortNum::MapReportApp => "map-report",
            PortNum::PowerstressApp => "powerstress",
            PortNum::PrivateApp => "private",
            PortNum::AtakForwarder => "atak-forwarder",
            PortNum::Max => "max",
        }
    }
}

/// Liveness ping for the serial link
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    /// Optional nonce echoed by nothing; lets repeated heartbeats differ
    #[prost(uint32, tag = "1")]
    pub nonce: u32,
}

/// Identity of the attached device
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MyNodeInfo {
    /// Node number of the attached device
    #[prost(uint32, tag = "1")]
    pub my_node_num: u32,
    /// Number of reboots
    #[prost(uint32, tag = "8")]
    pub reboot_count: u32,
    /// Oldest client version the firmware accepts
    #[prost(uint32, tag = "11")]
    pub min_app_version: u32,
}

/// Node database entry
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeInfo {
    /// Node number
    #[prost(uint32, tag = "1")]
    pub num: u32,
    /// User identity
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    /// Last known position
    #[prost(message, optional, tag = "3")]
    pub position: Option<Position>,
    /// SNR of the last packet heard
    #[prost(float, tag = "4")]
    pub snr: f32,
    /// Last heard (epoch seconds)
    #[prost(fixed32, tag = "5")]
    pub last_heard: u32,
    /// Battery and airtime metrics
    #[prost(message, optional, tag = "6")]
    pub device_metrics: Option<DeviceMetrics>,
    /// Channel the node was heard on
    #[prost(uint32, tag = "7")]
    pub channel: u32,
    /// Heard through an MQTT gateway
    #[prost(bool, tag = "8")]
    pub via_mqtt: bool,
    /// Hops to reach the node
    #[prost(uint32, optional, tag = "9")]
    pub hops_away: Option<u32>,
    /// Marked as favorite on the device
    #[prost(bool, tag = "10")]
    pub is_favorite: bool,
}

/// User identity broadcast by a node
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    /// Globally unique id, e.g. `!a1b2c3d4`
    #[prost(string, tag = "1")]
    pub id: String,
    /// Long display name
    #[prost(string, tag = "2")]
    pub long_name: String,
    /// Short display name
    #[prost(string, tag = "3")]
    pub short_name: String,
    /// Hardware model
    #[prost(int32, tag = "5")]
    pub hw_model: i32,
    /// Licensed amateur operator
    #[prost(bool, tag = "6")]
    pub is_licensed: bool,
    /// Device role
    #[prost(int32, tag = "7")]
    pub role: i32,
    /// Public key
    #[prost(bytes = "vec", tag = "8")]
    pub public_key: Vec<u8>,
}

/// Position report
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Position {
    /// Latitude in 1e-7 degrees
    #[prost(sfixed32, optional, tag = "1")]
    pub latitude_i: Option<i32>,
    /// Longitude in 1e-7 degrees
    #[prost(sfixed32, optional, tag = "2")]
    pub longitude_i: Option<i32>,
    /// Altitude in meters
    #[prost(int32, optional, tag = "3")]
    pub altitude: Option<i32>,
    /// Time the position was recorded (epoch seconds)
    #[prost(fixed32, tag = "4")]
    pub time: u32,
    /// GPS timestamp (epoch seconds)
    #[prost(fixed32, tag = "7")]
    pub timestamp: u32,
    /// Ground speed in m/s
    #[prost(uint32, optional, tag = "15")]
    pub ground_speed: Option<u32>,
    /// Satellites in view
    #[prost(uint32, tag = "19")]
    pub sats_in_view: u32,
    /// Precision bits kept when the position was shared
    #[prost(uint32, tag = "23")]
    pub precision_bits: u32,
}

/// Device health metrics
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetrics {
    /// Battery percentage (101 means powered)
    #[prost(uint32, optional, tag = "1")]
    pub battery_level: Option<u32>,
    /// Battery voltage
    #[prost(float, optional, tag = "2")]
    pub voltage: Option<f32>,
    /// Channel utilisation percentage
    #[prost(float, optional, tag = "3")]
    pub channel_utilization: Option<f32>,
    /// Transmit airtime percentage over the last hour
    #[prost(float, optional, tag = "4")]
    pub air_util_tx: Option<f32>,
    /// Uptime in seconds
    #[prost(uint32, optional, tag = "5")]
    pub uptime_seconds: Option<u32>,
}

/// Device configuration section; only the section kind is inspected
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Config {
    /// Section
    #[prost(oneof = "config::PayloadVariant", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub payload_variant: Option<config::PayloadVariant>,
}

/// Nested types for [`Config`]
pub mod config {
    /// Configuration section, body kept encoded
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Device settings
        #[prost(bytes, tag = "1")]
        Device(Vec<u8>),
        /// Position settings
        #[prost(bytes, tag = "2")]
        Position(Vec<u8>),
        /// Power settings
        #[prost(bytes, tag = "3")]
        Power(Vec<u8>),
        /// Network settings
        #[prost(bytes, tag = "4")]
        Network(Vec<u8>),
        /// Display settings
        #[prost(bytes, tag = "5")]
        Display(Vec<u8>),
        /// LoRa settings
        #[prost(bytes, tag = "6")]
        Lora(Vec<u8>),
        /// Bluetooth settings
        #[prost(bytes, tag = "7")]
        Bluetooth(Vec<u8>),
        /// Security settings
        #[prost(bytes, tag = "8")]
        Security(Vec<u8>),
        /// Session key
        #[prost(bytes, tag = "9")]
        Sessionkey(Vec<u8>),
        /// Device UI settings
        #[prost(bytes, tag = "10")]
        DeviceUi(Vec<u8>),
    }

    impl PayloadVariant {
        /// Section name
        pub fn name(&self) -> &'static str {
            match self {
                PayloadVariant::Device(_) => "device",
                PayloadVariant::Position(_) => "position",
                PayloadVariant::Power(_) => "power",
                PayloadVariant::Network(_) => "network",
                PayloadVariant::Display(_) => "display",
                PayloadVariant::Lora(_) => "lora",
                PayloadVariant::Bluetooth(_) => "bluetooth",
                PayloadVariant::Security(_) => "security",
                PayloadVariant::Sessionkey(_) => "sessionkey",
                PayloadVariant::DeviceUi(_) => "device_ui",
            }
        }
    }
}

/// Module configuration section; only the module kind is inspected
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModuleConfig {
    /// Module section
    #[prost(
        oneof = "module_config::PayloadVariant",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13"
    )]
    pub payload_variant: Option<module_config::PayloadVariant>,
}

/// Nested types for [`ModuleConfig`]
pub mod module_config {
    /// Module section, body kept encoded
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// MQTT
        #[prost(bytes, tag = "1")]
        Mqtt(Vec<u8>),
        /// Serial bridge
        #[prost(bytes, tag = "2")]
        Serial(Vec<u8>),
        /// External notification
        #[prost(bytes, tag = "3")]
        ExternalNotification(Vec<u8>),
        /// Store and forward
        #[prost(bytes, tag = "4")]
        StoreForward(Vec<u8>),
        /// Range test
        #[prost(bytes, tag = "5")]
        RangeTest(Vec<u8>),
        /// Telemetry
        #[prost(bytes, tag = "6")]
        Telemetry(Vec<u8>),
        /// Canned messages
        #[prost(bytes, tag = "7")]
        CannedMessage(Vec<u8>),
        /// Audio
        #[prost(bytes, tag = "8")]
        Audio(Vec<u8>),
        /// Remote hardware
        #[prost(bytes, tag = "9")]
        RemoteHardware(Vec<u8>),
        /// Neighbor info
        #[prost(bytes, tag = "10")]
        NeighborInfo(Vec<u8>),
        /// Ambient lighting
        #[prost(bytes, tag = "11")]
        AmbientLighting(Vec<u8>),
        /// Detection sensor
        #[prost(bytes, tag = "12")]
        DetectionSensor(Vec<u8>),
        /// People counter
        #[prost(bytes, tag = "13")]
        Paxcounter(Vec<u8>),
    }

    impl PayloadVariant {
        /// Module name
        pub fn name(&self) -> &'static str {
            match self {
                PayloadVariant::Mqtt(_) => "mqtt",
                PayloadVariant::Serial(_) => "serial",
                PayloadVariant::ExternalNotification(_) => "external_notification",
                PayloadVariant::StoreForward(_) => "store_forward",
                PayloadVariant::RangeTest(_) => "range_test",
                PayloadVariant::Telemetry(_) => "telemetry",
                PayloadVariant::CannedMessage(_) => "canned_message",
                PayloadVariant::Audio(_) => "audio",
                PayloadVariant::RemoteHardware(_) => "remote_hardware",
                PayloadVariant::NeighborInfo(_) => "neighbor_info",
                PayloadVariant::AmbientLighting(_) => "ambient_lighting",
                PayloadVariant::DetectionSensor(_) => "detection_sensor",
                PayloadVariant::Paxcounter(_) => "paxcounter",
            }
        }
    }
}

/// Channel definition
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    /// Channel index
    #[prost(int32, tag = "1")]
    pub index: i32,
    /// Encoded channel settings
    #[prost(bytes = "vec", tag = "2")]
    pub settings: Vec<u8>,
    /// Channel role
    #[prost(int32, tag = "3")]
    pub role: i32,
}

/// Device log line
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogRecord {
    /// Message text
    #[prost(string, tag = "1")]
    pub message: String,
    /// Time (epoch seconds)
    #[prost(fixed32, tag = "2")]
    pub time: u32,
    /// Emitting subsystem
    #[prost(string, tag = "3")]
    pub source: String,
    /// Log level
    #[prost(int32, tag = "4")]
    pub level: i32,
}

/// Transmit queue status
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueueStatus {
    /// Result of the last enqueue
    #[prost(int32, tag = "1")]
    pub res: i32,
    /// Free slots
    #[prost(uint32, tag = "2")]
    pub free: u32,
    /// Queue length
    #[prost(uint32, tag = "3")]
    pub maxlen: u32,
    /// Packet the status refers to
    #[prost(uint32, tag = "4")]
    pub mesh_packet_id: u32,
}

/// File transfer chunk
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct XModem {
    /// Control code
    #[prost(int32, tag = "1")]
    pub control: i32,
    /// Sequence number
    #[prost(uint32, tag = "2")]
    pub seq: u32,
    /// CRC-16 of the buffer
    #[prost(uint32, tag = "3")]
    pub crc16: u32,
    /// Chunk bytes
    #[prost(bytes = "vec", tag = "4")]
    pub buffer: Vec<u8>,
}

/// Firmware and hardware metadata
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetadata {
    /// Firmware version string
    #[prost(string, tag = "1")]
    pub firmware_version: String,
    /// Device state schema version
    #[prost(uint32, tag = "2")]
    pub device_state_version: u32,
    /// Device supports shutdown
    #[prost(bool, tag = "3")]
    pub can_shutdown: bool,
    /// Device has WiFi
    #[prost(bool, tag = "4")]
    pub has_wifi: bool,
    /// Device has Bluetooth
    #[prost(bool, tag = "5")]
    pub has_bluetooth: bool,
    /// Device has Ethernet
    #[prost(bool, tag = "6")]
    pub has_ethernet: bool,
    /// Device role
    #[prost(int32, tag = "7")]
    pub role: i32,
    /// Position flags
    #[prost(uint32, tag = "8")]
    pub position_flags: u32,
    /// Hardware model
    #[prost(int32, tag = "9")]
    pub hw_model: i32,
    /// Remote hardware module available
    #[prost(bool, tag = "10")]
    pub has_remote_hardware: bool,
}

/// MQTT message proxied through the client
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MqttClientProxyMessage {
    /// Topic
    #[prost(string, tag = "1")]
    pub topic: String,
    /// Body
    #[prost(oneof = "mqtt_client_proxy_message::PayloadVariant", tags = "2, 3")]
    pub payload_variant: Option<mqtt_client_proxy_message::PayloadVariant>,
    /// Retain flag
    #[prost(bool, tag = "4")]
    pub retained: bool,
}

/// Nested types for [`MqttClientProxyMessage`]
pub mod mqtt_client_proxy_message {
    /// Body of a proxied MQTT message
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Binary body
        #[prost(bytes, tag = "2")]
        Data(Vec<u8>),
        /// Text body
        #[prost(string, tag = "3")]
        Text(String),
    }
}

/// File listing entry
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FileInfo {
    /// Path on the device
    #[prost(string, tag = "1")]
    pub file_name: String,
    /// Size in bytes
    #[prost(uint32, tag = "2")]
    pub size_bytes: u32,
}

/// Notification meant for the user
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientNotification {
    /// Packet the notification answers
    #[prost(uint32, optional, tag = "1")]
    pub reply_id: Option<u32>,
    /// Time (epoch seconds)
    #[prost(fixed32, tag = "2")]
    pub time: u32,
    /// Severity
    #[prost(int32, tag = "3")]
    pub level: i32,
    /// Message text
    #[prost(string, tag = "4")]
    pub message: String,
}
