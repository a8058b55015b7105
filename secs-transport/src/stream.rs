//! Abstract byte stream consumed by the session layer

use async_trait::async_trait;
use secs_core::{SecsError, SecsResult};

/// Asynchronous byte stream carrying HSMS traffic
///
/// The streaming decoder consumes this interface only; it never touches
/// sockets directly. A `read` returning 0 signals end-of-stream.
#[async_trait]
pub trait ByteStream: Send + Sync {
    /// Read data from the stream
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to read into
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> SecsResult<usize>;

    /// Read exact number of bytes from the stream
    async fn read_exact(&mut self, mut buf: &mut [u8]) -> SecsResult<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(SecsError::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "Failed to read exact number of bytes",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Write data to the stream, returning the number of bytes written
    async fn write(&mut self, buf: &[u8]) -> SecsResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> SecsResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(SecsError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> SecsResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> SecsResult<()>;
}
