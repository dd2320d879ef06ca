//! Byte transports to the radio device.
//!
//! The engine only needs two things from a transport: an all-or-nothing
//! `send` and a `poll` that returns whatever bytes are available without
//! waiting longer than a short bound. Any tokio stream can provide that, so
//! serial ports and TCP sockets share one implementation.

use crate::error::TransportError;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace};

/// Default serial baud rate of the device
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default TCP port of the device's network API
pub const DEFAULT_TCP_PORT: u16 = 4403;

/// Default upper bound on a single poll
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_millis(10);

/// Default bound on establishing a TCP connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of link, selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Serial line; needs client heartbeats to stay open
    Serial,
    /// Network socket; keeps itself alive
    Network,
}

/// Non-blocking byte transport
#[async_trait]
pub trait Transport: Send {
    /// Kind of link
    fn kind(&self) -> TransportKind;

    /// Send all bytes or fail
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read up to `buf.len()` bytes; `Ok(0)` when nothing arrived in time
    async fn poll(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// Transport over any tokio byte stream
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    kind: TransportKind,
    poll_wait: Duration,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream
    pub fn new(stream: S, kind: TransportKind) -> Self {
        Self {
            stream,
            kind,
            poll_wait: DEFAULT_POLL_WAIT,
        }
    }

    /// Set the poll bound
    pub fn with_poll_wait(mut self, poll_wait: Duration) -> Self {
        self.poll_wait = poll_wait;
        self
    }

    /// Unwrap the stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        trace!("Sent {} bytes", bytes.len());
        Ok(())
    }

    async fn poll(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if buf.is_empty() {
            return Ok(0);
        }

        match tokio::time::timeout(self.poll_wait, self.stream.read(buf)).await {
            Err(_elapsed) => Ok(0),
            Ok(Ok(0)) => Err(TransportError::Closed),
            Ok(Ok(n)) => {
                trace!("Read {} bytes", n);
                Ok(n)
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

/// Connect to the device's network API
pub async fn connect_tcp(addr: SocketAddr) -> Result<StreamTransport<TcpStream>, TransportError> {
    debug!("Connecting to radio at {}", addr);
    let stream = tokio::time::timeout(DEFAULT_CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::Timeout(DEFAULT_CONNECT_TIMEOUT))??;
    stream.set_nodelay(true)?;
    info!("Connected to radio at {}", addr);
    Ok(StreamTransport::new(stream, TransportKind::Network))
}

/// Open the device's serial port
pub fn open_serial(path: &str, baud_rate: u32) -> Result<StreamTransport<SerialStream>, TransportError> {
    debug!("Opening serial port {} at {} baud", path, baud_rate);
    let port = tokio_serial::new(path, baud_rate).open_native_async()?;
    info!("Opened serial port {}", path);
    Ok(StreamTransport::new(port, TransportKind::Serial))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_duplex_send_and_poll() {
        let (client, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(client, TransportKind::Serial);

        transport.send(&[0x94, 0xC3, 0x00, 0x00]).await.unwrap();
        let mut seen = [0u8; 4];
        device.read_exact(&mut seen).await.unwrap();
        assert_eq!(seen, [0x94, 0xC3, 0x00, 0x00]);

        device.write_all(b"abc").await.unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(transport.poll(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_with_zero() {
        let (client, _device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(client, TransportKind::Network)
            .with_poll_wait(Duration::from_millis(5));

        let mut buf = [0u8; 8];
        assert_eq!(transport.poll(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_poll_reports_closed_peer() {
        let (client, device) = tokio::io::duplex(64);
        drop(device);
        let mut transport = StreamTransport::new(client, TransportKind::Network);

        let mut buf = [0u8; 8];
        assert!(matches!(
            transport.poll(&mut buf).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_poll_respects_buffer_size() {
        let (client, mut device) = tokio::io::duplex(64);
        let mut transport = StreamTransport::new(client, TransportKind::Serial);
        device.write_all(&[1, 2, 3, 4, 5]).await.unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(transport.poll(&mut buf).await.unwrap(), 2);
        assert_eq!(transport.poll(&mut []).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tcp_connect() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await.unwrap();
        let bound_addr = listener.local_addr().unwrap();

        let transport = connect_tcp(bound_addr).await.unwrap();
        assert_eq!(transport.kind(), TransportKind::Network);
    }
}
