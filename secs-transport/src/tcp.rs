//! TCP byte stream implementation

use crate::stream::ByteStream;
use async_trait::async_trait;
use secs_core::{SecsError, SecsResult};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Wrapper for TcpStream that implements Debug
struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream").finish()
    }
}

/// TCP connection settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    pub connect_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings with the default connect timeout
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Create TCP settings with an explicit connect timeout
    pub fn with_timeout(address: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            address,
            connect_timeout: Some(connect_timeout),
        }
    }
}

/// TCP-backed [`ByteStream`]
#[derive(Debug)]
pub struct TcpByteStream {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpByteStream {
    /// Create a new, unconnected TCP byte stream
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    /// Wrap an already-established connection (e.g. from a passive-mode
    /// listener accept)
    pub fn from_stream(stream: TcpStream, settings: TcpSettings) -> Self {
        Self {
            stream: Some(DebugTcpStream(stream)),
            settings,
            closed: false,
        }
    }

    /// Connect to the configured address
    pub async fn connect(&mut self) -> SecsResult<()> {
        let connect = TcpStream::connect(self.settings.address);
        let stream = match self.settings.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect).await.map_err(|_| {
                SecsError::Connection(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "TCP connect timed out",
                ))
            })??,
            None => connect.await?,
        };
        self.stream = Some(DebugTcpStream(stream));
        self.closed = false;
        Ok(())
    }

    /// The configured settings
    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> SecsResult<&mut TcpStream> {
        self.stream.as_mut().map(|s| &mut s.0).ok_or_else(|| {
            SecsError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream is not connected",
            ))
        })
    }
}

#[async_trait]
impl ByteStream for TcpByteStream {
    async fn read(&mut self, buf: &mut [u8]) -> SecsResult<usize> {
        Ok(self.stream_mut()?.read(buf).await?)
    }

    async fn write(&mut self, buf: &[u8]) -> SecsResult<usize> {
        Ok(self.stream_mut()?.write(buf).await?)
    }

    async fn flush(&mut self) -> SecsResult<()> {
        Ok(self.stream_mut()?.flush().await?)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> SecsResult<()> {
        if let Some(mut stream) = self.stream.take() {
            // shutdown errors on an already-broken peer are not actionable
            let _ = stream.0.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_loopback_read_write() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let mut stream = TcpByteStream::new(TcpSettings::new(address));
        stream.connect().await.unwrap();
        assert!(!stream.is_closed());

        stream.write_all(b"hello").await.unwrap();
        stream.flush().await.unwrap();

        let mut echo = [0u8; 5];
        stream.read_exact(&mut echo).await.unwrap();
        assert_eq!(&echo, b"hello");

        stream.close().await.unwrap();
        assert!(stream.is_closed());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_before_connect_fails() {
        let mut stream = TcpByteStream::new(TcpSettings::new("127.0.0.1:9999".parse().unwrap()));
        let mut buf = [0u8; 1];
        assert!(stream.read(&mut buf).await.is_err());
    }
}
