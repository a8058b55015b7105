//! SECS-II item and message encoder

use crate::header::encode_header;
use crate::secs2::MAX_ITEM_LENGTH;
use secs_core::{Item, ItemPayload, MessageHeader, SecsError, SecsFormat, SecsResult};

/// SECS-II encoder writing items and whole messages into an owned buffer
pub struct Secs2Encoder {
    buffer: Vec<u8>,
}

impl Secs2Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode one item tree, depth-first, each list's header before its
    /// children
    pub fn encode_item(&mut self, item: &Item) -> SecsResult<()> {
        self.encode_item_header(item.format(), item.wire_length())?;
        match item.wire_payload() {
            ItemPayload::Children(children) => {
                for child in children {
                    self.encode_item(child)?;
                }
            }
            ItemPayload::Data(data) => self.buffer.extend_from_slice(&data),
        }
        Ok(())
    }

    /// Encode an item header: format byte plus the minimal 1..=3-byte
    /// big-endian length field
    ///
    /// Fails with `LengthOverflow` when `length` exceeds the 3-byte
    /// field capacity.
    pub fn encode_item_header(&mut self, format: SecsFormat, length: usize) -> SecsResult<()> {
        if length > MAX_ITEM_LENGTH {
            return Err(SecsError::LengthOverflow(length));
        }
        let code = format.code() << 2;
        let be = (length as u32).to_be_bytes();
        if length <= 0xFF {
            self.buffer.push(code | 1);
            self.buffer.push(be[3]);
        } else if length <= 0xFFFF {
            self.buffer.push(code | 2);
            self.buffer.extend_from_slice(&be[2..]);
        } else {
            self.buffer.push(code | 3);
            self.buffer.extend_from_slice(&be[1..]);
        }
        Ok(())
    }

    /// Encode a whole message: 10-byte header plus the optional root item
    pub fn encode_message(&mut self, header: &MessageHeader, item: Option<&Item>) -> SecsResult<()> {
        self.buffer.extend_from_slice(&encode_header(header));
        if let Some(item) = item {
            self.encode_item(item)?;
        }
        Ok(())
    }

    /// Encode a complete HSMS frame: the 4-byte big-endian total length
    /// (excluding itself) followed by the message bytes
    pub fn encode_frame(&mut self, header: &MessageHeader, item: Option<&Item>) -> SecsResult<()> {
        let start = self.buffer.len();
        self.buffer.extend_from_slice(&[0u8; 4]);
        self.encode_message(header, item)?;
        let total = self.buffer.len() - start - 4;
        self.buffer[start..start + 4].copy_from_slice(&(total as u32).to_be_bytes());
        Ok(())
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Clear the encoder buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Secs2Encoder {
    fn default() -> Self {
        Self::new()
    }
}
