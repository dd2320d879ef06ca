//! Node records delivered to node-report consumers.

use radio_schema::proto::{DeviceMetrics, NodeInfo, Position, User};

/// Scale of the device's fixed-point coordinates
const COORDINATE_SCALE: f64 = 1e-7;

/// Snapshot of one node database entry.
///
/// Built fresh for every update so nothing carries over from a previous node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Node number
    pub node_num: u32,
    /// This is the attached device itself
    pub is_local: bool,
    /// Last heard (epoch seconds)
    pub last_heard: u32,
    /// SNR of the last packet heard
    pub snr: f32,
    /// Hops to reach the node, if known
    pub hops_away: Option<u32>,
    /// Identity, if the node has announced one
    pub identity: Option<NodeIdentity>,
    /// Last known position
    pub position: Option<NodePosition>,
    /// Health metrics
    pub metrics: Option<NodeMetrics>,
}

/// Announced identity of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    /// Globally unique id
    pub user_id: String,
    /// Long display name
    pub long_name: String,
    /// Short display name
    pub short_name: String,
}

/// Position in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct NodePosition {
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Altitude in meters
    pub altitude: Option<i32>,
    /// Ground speed in m/s
    pub ground_speed: Option<u32>,
    /// Time the position was recorded
    pub time: u32,
    /// GPS timestamp
    pub timestamp: u32,
}

/// Device health metrics
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetrics {
    /// Battery percentage
    pub battery_level: Option<u32>,
    /// Battery voltage
    pub voltage: Option<f32>,
    /// Channel utilisation percentage
    pub channel_utilization: Option<f32>,
    /// Transmit airtime percentage
    pub air_util_tx: Option<f32>,
    /// Uptime in seconds
    pub uptime_seconds: Option<u32>,
}

impl NodeRecord {
    /// Build a record from a node database entry
    pub fn from_node_info(info: &NodeInfo, local_node: Option<u32>) -> Self {
        Self {
            node_num: info.num,
            is_local: local_node == Some(info.num),
            last_heard: info.last_heard,
            snr: info.snr,
            hops_away: info.hops_away,
            identity: info.user.as_ref().map(NodeIdentity::from),
            position: info.position.as_ref().map(NodePosition::from),
            metrics: info.device_metrics.as_ref().map(NodeMetrics::from),
        }
    }

    /// Best display name for the node
    pub fn display_name(&self) -> String {
        match &self.identity {
            Some(identity) if !identity.long_name.is_empty() => identity.long_name.clone(),
            Some(identity) if !identity.short_name.is_empty() => identity.short_name.clone(),
            _ => format!("!{:08x}", self.node_num),
        }
    }
}

impl From<&User> for NodeIdentity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            long_name: user.long_name.clone(),
            short_name: user.short_name.clone(),
        }
    }
}

impl From<&Position> for NodePosition {
    fn from(position: &Position) -> Self {
        Self {
            latitude: position.latitude_i.map(|v| f64::from(v) * COORDINATE_SCALE),
            longitude: position.longitude_i.map(|v| f64::from(v) * COORDINATE_SCALE),
            altitude: position.altitude,
            ground_speed: position.ground_speed,
            time: position.time,
            timestamp: position.timestamp,
        }
    }
}

impl From<&DeviceMetrics> for NodeMetrics {
    fn from(metrics: &DeviceMetrics) -> Self {
        Self {
            battery_level: metrics.battery_level,
            voltage: metrics.voltage,
            channel_utilization: metrics.channel_utilization,
            air_util_tx: metrics.air_util_tx,
            uptime_seconds: metrics.uptime_seconds,
        }
    }
}
