//! HSMS 10-byte message header codec
//!
//! Pure and stateless; this layout is the network-visible contract other
//! HSMS implementations depend on, so it must stay bit-exact.

use secs_core::{MessageHeader, MessageType, SecsError, SecsResult};

/// Encoded header length in bytes
pub const HEADER_LENGTH: usize = 10;

const REPLY_EXPECTED_MASK: u8 = 0b1000_0000;
const STREAM_MASK: u8 = 0b0111_1111;

/// Encode a message header into its 10-byte wire form
///
/// Layout: device id big-endian at \[0..2\), `s | reply bit` at \[2\],
/// `f` at \[3\], reserved zero at \[4\], message type at \[5\], system
/// bytes big-endian at \[6..10\).
pub fn encode_header(header: &MessageHeader) -> [u8; HEADER_LENGTH] {
    let mut buffer = [0u8; HEADER_LENGTH];
    buffer[0..2].copy_from_slice(&header.device_id.to_be_bytes());
    buffer[2] = (header.s & STREAM_MASK)
        | if header.reply_expected {
            REPLY_EXPECTED_MASK
        } else {
            0
        };
    buffer[3] = header.f;
    buffer[4] = 0; // reserved
    buffer[5] = header.message_type as u8;
    buffer[6..10].copy_from_slice(&header.system_bytes.to_be_bytes());
    buffer
}

/// Decode a 10-byte wire header
///
/// Fails with `Truncated` if fewer than 10 bytes are supplied and with
/// `MalformedFrame` on an unknown message type byte.
pub fn decode_header(buffer: &[u8]) -> SecsResult<MessageHeader> {
    if buffer.len() < HEADER_LENGTH {
        return Err(SecsError::Truncated {
            needed: HEADER_LENGTH,
            available: buffer.len(),
        });
    }
    Ok(MessageHeader {
        device_id: u16::from_be_bytes([buffer[0], buffer[1]]),
        reply_expected: buffer[2] & REPLY_EXPECTED_MASK != 0,
        s: buffer[2] & STREAM_MASK,
        f: buffer[3],
        message_type: MessageType::from_u8(buffer[5])?,
        system_bytes: u32::from_be_bytes([buffer[6], buffer[7], buffer[8], buffer[9]]),
    })
}
