//! Decode driving loop
//!
//! Two cooperating stages per connection: a fill stage that owns the
//! byte stream and forwards chunks, and a drain stage that advances the
//! decoder. They are connected by a bounded channel, so a slow decode
//! stage throttles reads instead of growing memory. The T8
//! inter-character timer is armed here, not in the state machine: it
//! runs only while a message is partially received and its expiry is
//! fatal, since a byte stream with no message boundaries cannot be
//! resynchronized mid-frame.

use bytes::{Bytes, BytesMut};
use log::{debug, error};
use secs_codec::Secs2Encoder;
use secs_core::{Item, MessageHeader, SecsError, SecsResult};
use secs_transport::ByteStream;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::decoder::SecsDecoder;

/// Fill-stage read chunk size
pub const READ_CHUNK_SIZE: usize = 8192;

/// Bound of the fill-to-drain hand-off channel
pub const CHANNEL_BOUND: usize = 16;

/// Run the decode loop over `source` until EOF or a fatal error
///
/// Returns `Ok(())` on a clean end-of-stream between messages,
/// `StreamClosed` when the stream ends mid-message (the partial message
/// is discarded, never emitted), `InterCharacterTimeout` when `t8`
/// expires while a message is partially received, or the decoder's own
/// fatal error. In every error case the decoder and the transport must
/// be discarded together.
pub async fn drive<S>(
    mut source: S,
    mut decoder: SecsDecoder,
    t8: Option<Duration>,
) -> SecsResult<()>
where
    S: ByteStream + 'static,
{
    let (tx, mut rx) = mpsc::channel::<SecsResult<Bytes>>(CHANNEL_BOUND);

    let fill = tokio::spawn(async move {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match source.read(&mut chunk).await {
                Ok(0) => {
                    debug!("byte source reached end of stream");
                    break;
                }
                Ok(n) => {
                    if tx.send(Ok(Bytes::copy_from_slice(&chunk[..n]))).await.is_err() {
                        // drain side is gone, stop reading
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    let result = drain(&mut rx, &mut decoder, t8).await;
    if let Err(e) = &result {
        error!("decode loop aborted: {}", e);
    }
    // unblock the fill stage even if it is parked in a read
    fill.abort();
    let _ = fill.await;
    result
}

async fn drain(
    rx: &mut mpsc::Receiver<SecsResult<Bytes>>,
    decoder: &mut SecsDecoder,
    t8: Option<Duration>,
) -> SecsResult<()> {
    let mut buffer = BytesMut::new();
    loop {
        let received = match t8 {
            // T8 runs only while a message is partially received; a
            // fresh chunk disarms it
            Some(t8) if decoder.in_message() => {
                debug!("T8 armed: {:?}", t8);
                match timeout(t8, rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => return Err(SecsError::InterCharacterTimeout),
                }
            }
            _ => rx.recv().await,
        };
        match received {
            None => {
                return if decoder.in_message() || !buffer.is_empty() {
                    Err(SecsError::StreamClosed)
                } else {
                    Ok(())
                };
            }
            Some(chunk) => {
                buffer.extend_from_slice(&chunk?);
                decoder.advance(&mut buffer)?;
            }
        }
    }
}

/// Encode and send one framed message over a byte stream
pub async fn write_message<S>(
    stream: &mut S,
    header: &MessageHeader,
    item: Option<&Item>,
) -> SecsResult<()>
where
    S: ByteStream + ?Sized,
{
    let mut encoder = Secs2Encoder::new();
    encoder.encode_frame(header, item)?;
    stream.write_all(encoder.as_bytes()).await?;
    stream.flush().await
}
