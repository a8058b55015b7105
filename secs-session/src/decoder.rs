//! Incremental HSMS/SECS-II message decoder
//!
//! Reconstructs complete messages from a byte stream delivered in
//! arbitrary-sized chunks. A four-step resumable pipeline consumes an
//! internal buffer; a step that cannot make progress leaves the buffer
//! untouched and reports need-more, so the driving loop can await the
//! next fill instead of spinning. List nesting is tracked with an
//! explicit frame stack rather than call-stack recursion, since input
//! may arrive byte by byte across arbitrarily deep trees.

use bytes::{Buf, BytesMut};
use log::debug;
use secs_codec::header::{decode_header, HEADER_LENGTH};
use secs_codec::secs2::{parse_format_byte, read_length_field, Secs2Decoder};
use secs_core::{
    Item, MessageHeader, MessageType, SecsError, SecsFormat, SecsMessage, SecsResult,
};

/// Callback for HSMS control messages (header only, no SECS-II body)
pub type ControlHandler = Box<dyn FnMut(MessageHeader) + Send>;

/// Callback for data messages
pub type DataHandler = Box<dyn FnMut(MessageHeader, SecsMessage) + Send>;

/// Pipeline step the decoder will resume at on the next fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    /// Waiting for the 4-byte total message length
    TotalLength,
    /// Waiting for the 10-byte message header
    MessageHeader,
    /// Waiting for an item's format byte and length field
    ItemHeader,
    /// Waiting for an item's payload bytes
    ItemPayload,
}

/// One open List nesting level: children collected so far against the
/// declared child count
struct ListFrame {
    expected: usize,
    children: Vec<Item>,
}

/// Streaming HSMS message decoder
///
/// Single-writer: exactly one decode loop owns an instance; one instance
/// exists per transport connection. Any decode error leaves the nesting
/// state unusable and is connection-fatal; discard the decoder together
/// with the transport.
pub struct SecsDecoder {
    step: DecodeStep,
    /// Bytes of the current message not yet consumed
    message_remaining: u64,
    header: Option<MessageHeader>,
    format: SecsFormat,
    item_length: usize,
    stack: Vec<ListFrame>,
    on_control: ControlHandler,
    on_data: DataHandler,
}

impl SecsDecoder {
    /// Create a decoder with its two emission callbacks
    ///
    /// Both are invoked synchronously on the decode loop's task each
    /// time a complete message is assembled.
    pub fn new<C, D>(on_control: C, on_data: D) -> Self
    where
        C: FnMut(MessageHeader) + Send + 'static,
        D: FnMut(MessageHeader, SecsMessage) + Send + 'static,
    {
        Self {
            step: DecodeStep::TotalLength,
            message_remaining: 0,
            header: None,
            format: SecsFormat::List,
            item_length: 0,
            stack: Vec::new(),
            on_control: Box::new(on_control),
            on_data: Box::new(on_data),
        }
    }

    /// Whether a message is partially received (this is what arms the
    /// driving loop's T8 timer)
    pub fn in_message(&self) -> bool {
        self.message_remaining > 0
    }

    /// The step the decoder will resume at
    pub fn step(&self) -> DecodeStep {
        self.step
    }

    /// Consume as much of `buffer` as possible, emitting every completed
    /// message through the callbacks
    ///
    /// Consumed bytes are advanced out of `buffer`; returns once no step
    /// can progress without more input. Errors are connection-fatal.
    pub fn advance(&mut self, buffer: &mut BytesMut) -> SecsResult<()> {
        loop {
            let progressed = match self.step {
                DecodeStep::TotalLength => self.take_total_length(buffer)?,
                DecodeStep::MessageHeader => self.take_message_header(buffer)?,
                DecodeStep::ItemHeader => self.take_item_header(buffer)?,
                DecodeStep::ItemPayload => self.take_item_payload(buffer)?,
            };
            if !progressed {
                return Ok(());
            }
        }
    }

    fn take_total_length(&mut self, buffer: &mut BytesMut) -> SecsResult<bool> {
        if buffer.len() < 4 {
            return Ok(false);
        }
        self.message_remaining = u64::from(buffer.get_u32());
        debug!("message length: {}", self.message_remaining);
        if self.message_remaining < HEADER_LENGTH as u64 {
            return Err(SecsError::MalformedFrame(format!(
                "Total message length {} is shorter than the 10-byte header",
                self.message_remaining
            )));
        }
        self.step = DecodeStep::MessageHeader;
        Ok(true)
    }

    fn take_message_header(&mut self, buffer: &mut BytesMut) -> SecsResult<bool> {
        if buffer.len() < HEADER_LENGTH {
            return Ok(false);
        }
        let header = decode_header(&buffer[..HEADER_LENGTH])?;
        buffer.advance(HEADER_LENGTH);
        self.message_remaining -= HEADER_LENGTH as u64;

        if self.message_remaining == 0 {
            // header-only message, emit right away
            if header.message_type == MessageType::DataMessage {
                let message = SecsMessage::new(header.s, header.f, header.reply_expected, None)?;
                (self.on_data)(header, message);
            } else {
                (self.on_control)(header);
            }
            self.step = DecodeStep::TotalLength;
            return Ok(true);
        }

        if buffer.len() as u64 >= self.message_remaining {
            // whole body already buffered, decode it in one pass
            let body_length = self.message_remaining as usize;
            let mut single_shot = Secs2Decoder::new(&buffer[..body_length]);
            let item = single_shot.decode_item()?;
            if single_shot.remaining() != 0 {
                return Err(SecsError::MalformedFrame(format!(
                    "{} trailing bytes after the message body",
                    single_shot.remaining()
                )));
            }
            buffer.advance(body_length);
            self.message_remaining = 0;
            debug!("complete data message from fully buffered body");
            let message =
                SecsMessage::new(header.s, header.f, header.reply_expected, Some(item))?;
            (self.on_data)(header, message);
            self.step = DecodeStep::TotalLength;
            return Ok(true);
        }

        self.header = Some(header);
        self.step = DecodeStep::ItemHeader;
        Ok(true)
    }

    fn take_item_header(&mut self, buffer: &mut BytesMut) -> SecsResult<bool> {
        if buffer.is_empty() {
            return Ok(false);
        }
        let format_byte = buffer[0];
        let header_length = 1 + (format_byte & 0b11) as usize;
        if buffer.len() < header_length {
            return Ok(false);
        }
        let (format, _) = parse_format_byte(format_byte)?;
        self.format = format;
        self.item_length = read_length_field(&buffer[1..header_length]);
        buffer.advance(header_length);
        self.message_remaining = self
            .message_remaining
            .checked_sub(header_length as u64)
            .ok_or_else(|| {
                SecsError::MalformedFrame(
                    "Item header runs past the declared message length".to_string(),
                )
            })?;
        debug!("item header: {} length {}", self.format, self.item_length);
        self.step = DecodeStep::ItemPayload;
        Ok(true)
    }

    fn take_item_payload(&mut self, buffer: &mut BytesMut) -> SecsResult<bool> {
        let item = if self.format == SecsFormat::List {
            if self.item_length > 0 {
                // open a nesting level and go collect its children
                self.stack.push(ListFrame {
                    expected: self.item_length,
                    children: Vec::with_capacity(self.item_length.min(255)),
                });
                self.step = DecodeStep::ItemHeader;
                return Ok(true);
            }
            Item::list(Vec::new())
        } else {
            if buffer.len() < self.item_length {
                return Ok(false);
            }
            let bytes = buffer.split_to(self.item_length).to_vec();
            self.message_remaining = self
                .message_remaining
                .checked_sub(self.item_length as u64)
                .ok_or_else(|| {
                    SecsError::MalformedFrame(
                        "Item payload runs past the declared message length".to_string(),
                    )
                })?;
            Item::from_wire_bytes(self.format, bytes)?
        };
        self.complete_item(item)?;
        Ok(true)
    }

    /// Fold a finished item into the open List stack, collapsing filled
    /// frames upward; emits the message when the root completes
    fn complete_item(&mut self, mut item: Item) -> SecsResult<()> {
        loop {
            match self.stack.last_mut() {
                None => {
                    debug!("complete data message by incremental decode");
                    self.emit_data(item)?;
                    self.step = DecodeStep::TotalLength;
                    return Ok(());
                }
                Some(frame) => {
                    frame.children.push(item);
                    if frame.children.len() < frame.expected {
                        self.step = DecodeStep::ItemHeader;
                        return Ok(());
                    }
                }
            }
            let frame = self.stack.pop().ok_or_else(|| {
                SecsError::MalformedFrame("Decoder nesting stack underflow".to_string())
            })?;
            item = Item::list(frame.children);
            debug!("complete list: {}", item.count());
        }
    }

    fn emit_data(&mut self, item: Item) -> SecsResult<()> {
        let header = self.header.take().ok_or_else(|| {
            SecsError::MalformedFrame("Decoder state lost the message header".to_string())
        })?;
        if self.message_remaining != 0 {
            return Err(SecsError::MalformedFrame(format!(
                "{} message bytes left over after the root item completed",
                self.message_remaining
            )));
        }
        let message = SecsMessage::new(header.s, header.f, header.reply_expected, Some(item))?;
        (self.on_data)(header, message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secs_codec::Secs2Encoder;
    use std::sync::{Arc, Mutex};

    type Collected = Arc<Mutex<Vec<(MessageHeader, Option<SecsMessage>)>>>;

    fn collecting_decoder() -> (SecsDecoder, Collected) {
        let collected: Collected = Arc::new(Mutex::new(Vec::new()));
        let control_sink = Arc::clone(&collected);
        let data_sink = Arc::clone(&collected);
        let decoder = SecsDecoder::new(
            move |header| control_sink.lock().unwrap().push((header, None)),
            move |header, message| data_sink.lock().unwrap().push((header, Some(message))),
        );
        (decoder, collected)
    }

    fn frame(header: &MessageHeader, item: Option<&Item>) -> Vec<u8> {
        let mut encoder = Secs2Encoder::new();
        encoder.encode_frame(header, item).unwrap();
        encoder.into_bytes()
    }

    fn sample_item() -> Item {
        Item::list(vec![
            Item::ascii("PPID-7"),
            Item::list(vec![Item::u2(vec![0x0102, 3]), Item::list(vec![])]),
            Item::binary(vec![0xDE, 0xAD]),
            Item::boolean(vec![true]),
        ])
    }

    #[test]
    fn test_whole_frame_in_one_chunk() {
        let (mut decoder, collected) = collecting_decoder();
        let header = MessageHeader::data(1, 6, 11, true, 17);
        let item = sample_item();
        let mut buffer = BytesMut::from(&frame(&header, Some(&item))[..]);

        decoder.advance(&mut buffer).unwrap();
        assert!(buffer.is_empty());
        assert!(!decoder.in_message());

        let messages = collected.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let (got_header, got_message) = &messages[0];
        assert_eq!(*got_header, header);
        assert_eq!(got_message.as_ref().unwrap().item().unwrap(), &item);
    }

    #[test]
    fn test_chunking_invariance() {
        let header = MessageHeader::data(1, 2, 13, false, 5);
        let item = sample_item();
        let bytes = frame(&header, Some(&item));

        // reference: one-shot feed
        let (mut decoder, reference) = collecting_decoder();
        decoder
            .advance(&mut BytesMut::from(&bytes[..]))
            .unwrap();
        let reference = reference.lock().unwrap().clone();
        assert_eq!(reference.len(), 1);

        // split at every possible boundary
        for split in 1..bytes.len() {
            let (mut decoder, collected) = collecting_decoder();
            let mut buffer = BytesMut::new();
            buffer.extend_from_slice(&bytes[..split]);
            decoder.advance(&mut buffer).unwrap();
            buffer.extend_from_slice(&bytes[split..]);
            decoder.advance(&mut buffer).unwrap();
            assert_eq!(*collected.lock().unwrap(), reference, "split at {}", split);
        }

        // one byte at a time
        let (mut decoder, collected) = collecting_decoder();
        let mut buffer = BytesMut::new();
        for &byte in &bytes {
            buffer.extend_from_slice(&[byte]);
            decoder.advance(&mut buffer).unwrap();
        }
        assert_eq!(*collected.lock().unwrap(), reference);
    }

    #[test]
    fn test_back_to_back_messages() {
        let (mut decoder, collected) = collecting_decoder();
        let first = MessageHeader::data(1, 1, 13, false, 1);
        let second = MessageHeader::data(1, 6, 11, true, 2);
        let mut bytes = frame(&first, Some(&Item::u1(vec![0])));
        bytes.extend_from_slice(&frame(&second, Some(&Item::ascii("X"))));

        let mut buffer = BytesMut::from(&bytes[..]);
        decoder.advance(&mut buffer).unwrap();
        assert_eq!(collected.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_header_only_control_message() {
        let (mut decoder, collected) = collecting_decoder();
        let header = MessageHeader::control(MessageType::SelectRequest, 9);
        let mut buffer = BytesMut::from(&frame(&header, None)[..]);

        decoder.advance(&mut buffer).unwrap();
        let messages = collected.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, header);
        assert!(messages[0].1.is_none()); // via the control callback
    }

    #[test]
    fn test_header_only_data_message() {
        let (mut decoder, collected) = collecting_decoder();
        let header = MessageHeader::data(3, 1, 14, false, 21);
        let mut buffer = BytesMut::from(&frame(&header, None)[..]);

        decoder.advance(&mut buffer).unwrap();
        let messages = collected.lock().unwrap();
        assert_eq!(messages.len(), 1);
        let message = messages[0].1.as_ref().unwrap();
        assert!(message.item().is_none());
        assert_eq!(message.s(), 1);
        assert_eq!(message.f(), 14);
    }

    #[test]
    fn test_length_prefix_alone_awaits_more() {
        let (mut decoder, collected) = collecting_decoder();
        let mut buffer = BytesMut::from(&20u32.to_be_bytes()[..]);

        decoder.advance(&mut buffer).unwrap();
        assert!(buffer.is_empty());
        assert!(decoder.in_message());
        assert_eq!(decoder.step(), DecodeStep::MessageHeader);
        assert!(collected.lock().unwrap().is_empty());
    }

    #[test]
    fn test_partial_bytes_not_consumed() {
        let (mut decoder, _) = collecting_decoder();
        let mut buffer = BytesMut::from(&[0x00u8, 0x00][..]);
        decoder.advance(&mut buffer).unwrap();
        // fewer than 4 bytes: nothing consumed
        assert_eq!(buffer.len(), 2);
        assert_eq!(decoder.step(), DecodeStep::TotalLength);
    }

    #[test]
    fn test_total_length_below_header_size() {
        let (mut decoder, _) = collecting_decoder();
        let mut buffer = BytesMut::from(&4u32.to_be_bytes()[..]);
        assert!(matches!(
            decoder.advance(&mut buffer),
            Err(SecsError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_deeply_nested_byte_by_byte() {
        let (mut decoder, collected) = collecting_decoder();
        let item = Item::list(vec![Item::list(vec![Item::list(vec![Item::list(vec![
            Item::i4(vec![-7]),
        ])])])]);
        let header = MessageHeader::data(0, 7, 1, false, 3);
        let bytes = frame(&header, Some(&item));

        let mut buffer = BytesMut::new();
        for &byte in &bytes {
            buffer.extend_from_slice(&[byte]);
            decoder.advance(&mut buffer).unwrap();
        }
        let messages = collected.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1.as_ref().unwrap().item().unwrap(), &item);
    }

    #[test]
    fn test_malformed_body_is_fatal() {
        let (mut decoder, _) = collecting_decoder();
        // declared total length 12: header + 2 body bytes with a bogus
        // format code
        let mut bytes = 12u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&secs_codec::encode_header(&MessageHeader::data(
            0, 1, 1, false, 0,
        )));
        bytes.extend_from_slice(&[0b0000_0101, 0x00]);
        let mut buffer = BytesMut::from(&bytes[..]);
        assert!(decoder.advance(&mut buffer).is_err());
    }
}
