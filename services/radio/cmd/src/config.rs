//! Configuration handling for the radio client.
//!
//! Settings come from a YAML file, then environment variables, then command
//! line flags, each layer overriding the previous one.

use anyhow::{bail, Context, Result};
use radio_schema::BROADCAST_ADDR;
use radio_session::{EngineConfig, DEFAULT_BAUD_RATE, DEFAULT_TCP_PORT};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Radio client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RadioConfig {
    /// Serial device path
    pub serial_port: Option<String>,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Network address of the device, `host` or `host:port`
    pub tcp_addr: Option<String>,
    /// Serial heartbeat interval
    pub heartbeat_interval: Duration,
    /// Node-report deadline; `None` waits forever
    pub report_timeout: Option<Duration>,
    /// Upper bound on a single transport poll
    pub poll_wait: Duration,
    /// Per-envelope diagnostics
    pub debug: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            tcp_addr: None,
            heartbeat_interval: engine.heartbeat_interval,
            report_timeout: engine.report_timeout,
            poll_wait: Duration::from_millis(10),
            debug: false,
        }
    }
}

/// Where the device is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    /// Serial port
    Serial {
        /// Device path
        path: String,
        /// Baud rate
        baud_rate: u32,
    },
    /// TCP endpoint, always with a port
    Network(String),
}

/// Root configuration structure (matches the YAML structure)
#[derive(Debug, Deserialize)]
struct RootConfig {
    radio: Option<FileConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    tcp_addr: Option<String>,
    heartbeat_interval: Option<String>,
    report_timeout: Option<String>,
    poll_wait: Option<String>,
    debug: Option<bool>,
}

impl RadioConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        let mut config = Self::default();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let root: RootConfig = serde_yaml::from_str(&content)
                    .with_context(|| format!("failed to parse config file {:?}", path))?;
                if let Some(radio) = root.radio {
                    config.apply_file_config(radio)?;
                }
                info!("Loaded configuration from {:?}", path);
            }
            Err(_) => warn!("Config file {:?} not found, using defaults", path),
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_file_config(&mut self, file: FileConfig) -> Result<()> {
        if file.serial_port.is_some() {
            self.serial_port = file.serial_port;
        }
        if let Some(baud_rate) = file.baud_rate {
            self.baud_rate = baud_rate;
        }
        if file.tcp_addr.is_some() {
            self.tcp_addr = file.tcp_addr;
        }
        if let Some(interval) = file.heartbeat_interval {
            self.heartbeat_interval = parse_duration("heartbeat_interval", &interval)?;
        }
        if let Some(timeout) = file.report_timeout {
            self.report_timeout = parse_optional_duration("report_timeout", &timeout)?;
        }
        if let Some(wait) = file.poll_wait {
            self.poll_wait = parse_duration("poll_wait", &wait)?;
        }
        if let Some(debug) = file.debug {
            self.debug = debug;
        }
        Ok(())
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("MT_SERIAL_PORT") {
            info!("Serial port overridden by environment: {}", port);
            self.serial_port = Some(port);
        }

        if let Some(baud) = lookup("MT_BAUD_RATE") {
            self.baud_rate = baud
                .parse()
                .with_context(|| format!("invalid MT_BAUD_RATE {:?}", baud))?;
            info!("Baud rate overridden by environment: {}", self.baud_rate);
        }

        if let Some(addr) = lookup("MT_TCP_ADDR") {
            info!("TCP address overridden by environment: {}", addr);
            self.tcp_addr = Some(addr);
        }

        if let Some(interval) = lookup("MT_HEARTBEAT_INTERVAL") {
            self.heartbeat_interval = parse_duration("MT_HEARTBEAT_INTERVAL", &interval)?;
            info!(
                "Heartbeat interval overridden by environment: {}",
                humantime::format_duration(self.heartbeat_interval)
            );
        }

        Ok(())
    }

    /// The single configured transport.
    ///
    /// Exactly one of serial and network must be set.
    pub fn transport_target(&self) -> Result<TransportTarget> {
        match (&self.serial_port, &self.tcp_addr) {
            (Some(path), None) => Ok(TransportTarget::Serial {
                path: path.clone(),
                baud_rate: self.baud_rate,
            }),
            (None, Some(addr)) => Ok(TransportTarget::Network(with_default_port(addr))),
            (Some(_), Some(_)) => bail!("both a serial port and a TCP address are configured"),
            (None, None) => bail!("no transport configured: set a serial port or a TCP address"),
        }
    }

    /// Engine settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            heartbeat_interval: self.heartbeat_interval,
            report_timeout: self.report_timeout,
            debug: self.debug,
            ..EngineConfig::default()
        }
    }
}

fn with_default_port(addr: &str) -> String {
    // A bare IPv6 literal has colons but no port
    if addr.parse::<std::net::Ipv6Addr>().is_ok() {
        return format!("[{}]:{}", addr, DEFAULT_TCP_PORT);
    }
    if addr.starts_with('[') && addr.ends_with(']') {
        return format!("{}:{}", addr, DEFAULT_TCP_PORT);
    }

    let has_port = addr
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && !host.ends_with(':') && port.parse::<u16>().is_ok());
    if has_port {
        addr.to_string()
    } else {
        format!("{}:{}", addr, DEFAULT_TCP_PORT)
    }
}

fn parse_duration(name: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).with_context(|| format!("invalid {} {:?}", name, value))
}

fn parse_optional_duration(name: &str, value: &str) -> Result<Option<Duration>> {
    match value.trim() {
        "none" | "never" => Ok(None),
        other => parse_duration(name, other).map(Some),
    }
}

/// Parse a node number: `!a1b2c3d4`, `0xa1b2c3d4`, decimal or `broadcast`
pub fn parse_node_num(value: &str) -> Result<u32> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("broadcast") || value == "^all" {
        return Ok(BROADCAST_ADDR);
    }

    let parsed = if let Some(hex) = value.strip_prefix('!') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.with_context(|| format!("invalid node number {:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RadioConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(config.report_timeout, Some(Duration::from_secs(30)));
        assert!(config.serial_port.is_none());
        assert!(config.tcp_addr.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let yaml_content = r#"
radio:
  serial_port: /dev/ttyUSB0
  baud_rate: 921600
  heartbeat_interval: 45s
  report_timeout: never
  debug: true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let mut config = RadioConfig::default();
        let root: RootConfig = serde_yaml::from_str(yaml_content).unwrap();
        config.apply_file_config(root.radio.unwrap()).unwrap();

        assert_eq!(config.serial_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(45));
        assert_eq!(config.report_timeout, None);
        assert!(config.debug);

        let loaded = RadioConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.heartbeat_interval, Duration::from_secs(45));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = RadioConfig::load_from_file("/nonexistent/mt-radio.yaml").unwrap();
        assert_eq!(config.poll_wait, Duration::from_millis(10));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"radio:\n  baud_rate: fast\n")
            .unwrap();
        assert!(RadioConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("MT_TCP_ADDR", "meshbox.local"),
            ("MT_BAUD_RATE", "57600"),
            ("MT_HEARTBEAT_INTERVAL", "2m"),
        ]
        .into_iter()
        .collect();

        let mut config = RadioConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.tcp_addr.as_deref(), Some("meshbox.local"));
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(120));

        let mut bad = RadioConfig::default();
        assert!(bad
            .apply_overrides(|key| (key == "MT_BAUD_RATE").then(|| "lots".to_string()))
            .is_err());
    }

    #[test]
    fn test_exactly_one_transport() {
        let mut config = RadioConfig::default();
        assert!(config.transport_target().is_err());

        config.tcp_addr = Some("10.0.0.5".to_string());
        assert_eq!(
            config.transport_target().unwrap(),
            TransportTarget::Network("10.0.0.5:4403".to_string())
        );

        config.serial_port = Some("/dev/ttyACM0".to_string());
        assert!(config.transport_target().is_err());

        config.tcp_addr = None;
        assert_eq!(
            config.transport_target().unwrap(),
            TransportTarget::Serial {
                path: "/dev/ttyACM0".to_string(),
                baud_rate: 115_200
            }
        );
    }

    #[test]
    fn test_explicit_port_kept() {
        assert_eq!(with_default_port("10.0.0.5:9000"), "10.0.0.5:9000");
        assert_eq!(with_default_port("[fe80::1]:4403"), "[fe80::1]:4403");
    }

    #[test]
    fn test_ipv6_host_gets_bracketed() {
        assert_eq!(with_default_port("fe80::1"), "[fe80::1]:4403");
        assert_eq!(with_default_port("::1"), "[::1]:4403");
        assert_eq!(with_default_port("[fe80::1]"), "[fe80::1]:4403");

        let addr: std::net::SocketAddr = with_default_port("::1").parse().unwrap();
        assert_eq!(addr.port(), 4403);
        assert!(addr.is_ipv6());
    }

    #[test]
    fn test_parse_node_num() {
        assert_eq!(parse_node_num("!a1b2c3d4").unwrap(), 0xA1B2_C3D4);
        assert_eq!(parse_node_num("0x10").unwrap(), 16);
        assert_eq!(parse_node_num("42").unwrap(), 42);
        assert_eq!(parse_node_num("broadcast").unwrap(), BROADCAST_ADDR);
        assert!(parse_node_num("!zz").is_err());
    }
}
