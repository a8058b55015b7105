//! SECS-II item and message decoder (single-shot)
//!
//! Requires the full byte span to be available; the chunk-tolerant
//! streaming decoder in `secs-session` builds on the same framing rules.

use crate::header::{decode_header, HEADER_LENGTH};
use crate::secs2::{parse_format_byte, read_length_field};
use secs_core::{Item, MessageHeader, SecsError, SecsFormat, SecsResult};

/// Decoder over a fully-buffered byte slice
pub struct Secs2Decoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Secs2Decoder<'a> {
    /// Create a new decoder
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Decode one complete item tree
    pub fn decode_item(&mut self) -> SecsResult<Item> {
        let (format, length_size) = parse_format_byte(self.read_byte()?)?;
        let length = read_length_field(self.read_bytes(length_size)?);

        if format == SecsFormat::List {
            let mut children = Vec::with_capacity(length.min(255));
            for _ in 0..length {
                children.push(self.decode_item()?);
            }
            Ok(Item::list(children))
        } else {
            let bytes = self.read_bytes(length)?.to_vec();
            Item::from_wire_bytes(format, bytes)
        }
    }

    /// Decode a complete message buffer: header plus the optional body
    pub fn decode_message(&mut self) -> SecsResult<(MessageHeader, Option<Item>)> {
        let header = decode_header(&self.buffer[self.position..])?;
        self.position += HEADER_LENGTH;
        let item = if self.remaining() == 0 {
            None
        } else {
            Some(self.decode_item()?)
        };
        Ok((header, item))
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    fn read_byte(&mut self) -> SecsResult<u8> {
        if self.position >= self.buffer.len() {
            return Err(SecsError::MalformedFrame(
                "Item header runs past the end of the buffer".to_string(),
            ));
        }
        let byte = self.buffer[self.position];
        self.position += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> SecsResult<&'a [u8]> {
        if self.position + len > self.buffer.len() {
            return Err(SecsError::MalformedFrame(format!(
                "Declared length runs past the end of the buffer: need {}, have {}",
                len,
                self.buffer.len() - self.position
            )));
        }
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }
}
