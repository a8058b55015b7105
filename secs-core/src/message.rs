//! HSMS message header and SECS message types

use crate::error::{SecsError, SecsResult};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HSMS message type (the SType header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// SECS-II data message
    DataMessage = 0,
    /// Select.req control message
    SelectRequest = 1,
    /// Select.rsp control message
    SelectResponse = 2,
    /// Deselect.req control message
    DeselectRequest = 3,
    /// Deselect.rsp control message
    DeselectResponse = 4,
    /// Linktest.req control message
    LinktestRequest = 5,
    /// Linktest.rsp control message
    LinktestResponse = 6,
    /// Reject.req control message
    RejectRequest = 7,
    /// Separate.req control message
    SeparateRequest = 9,
}

impl MessageType {
    /// Look up a message type by its SType byte
    pub fn from_u8(value: u8) -> SecsResult<Self> {
        match value {
            0 => Ok(MessageType::DataMessage),
            1 => Ok(MessageType::SelectRequest),
            2 => Ok(MessageType::SelectResponse),
            3 => Ok(MessageType::DeselectRequest),
            4 => Ok(MessageType::DeselectResponse),
            5 => Ok(MessageType::LinktestRequest),
            6 => Ok(MessageType::LinktestResponse),
            7 => Ok(MessageType::RejectRequest),
            9 => Ok(MessageType::SeparateRequest),
            _ => Err(SecsError::MalformedFrame(format!(
                "Unknown HSMS message type: {}",
                value
            ))),
        }
    }

    /// Check if this is an HSMS control message (anything but a data
    /// message)
    pub fn is_control(&self) -> bool {
        !matches!(self, MessageType::DataMessage)
    }
}

/// Decoded form of the 10-byte HSMS message header
///
/// `system_bytes` is the caller-assigned correlation id; the decoder
/// surfaces it unchanged and never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub device_id: u16,
    pub reply_expected: bool,
    /// Stream number, 7 bits (<= 127)
    pub s: u8,
    /// Function number
    pub f: u8,
    pub message_type: MessageType,
    pub system_bytes: u32,
}

impl MessageHeader {
    /// Header for a data message
    pub fn data(device_id: u16, s: u8, f: u8, reply_expected: bool, system_bytes: u32) -> Self {
        MessageHeader {
            device_id,
            reply_expected,
            s,
            f,
            message_type: MessageType::DataMessage,
            system_bytes,
        }
    }

    /// Header for an HSMS control message (no S/F, no body)
    pub fn control(message_type: MessageType, system_bytes: u32) -> Self {
        MessageHeader {
            device_id: 0xFFFF,
            reply_expected: false,
            s: 0,
            f: 0,
            message_type,
            system_bytes,
        }
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message_type == MessageType::DataMessage {
            write!(
                f,
                "S{}F{}{} device={} system={}",
                self.s,
                self.f,
                if self.reply_expected { " W" } else { "" },
                self.device_id,
                self.system_bytes
            )
        } else {
            write!(f, "{:?} system={}", self.message_type, self.system_bytes)
        }
    }
}

/// A SECS-II message: stream/function pair plus an optional root item
///
/// Owns its item tree exclusively once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecsMessage {
    s: u8,
    f: u8,
    reply_expected: bool,
    name: Option<String>,
    item: Option<Item>,
}

impl SecsMessage {
    /// Create a message; fails if the stream number exceeds 7 bits
    pub fn new(s: u8, f: u8, reply_expected: bool, item: Option<Item>) -> SecsResult<Self> {
        if s > 0x7F {
            return Err(SecsError::InvalidShape(format!(
                "Stream number {} out of range, max 127",
                s
            )));
        }
        Ok(SecsMessage {
            s,
            f,
            reply_expected,
            name: None,
            item,
        })
    }

    /// Attach a human-readable message name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Stream number
    pub fn s(&self) -> u8 {
        self.s
    }

    /// Function number
    pub fn f(&self) -> u8 {
        self.f
    }

    pub fn reply_expected(&self) -> bool {
        self.reply_expected
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The message body, absent for header-only messages
    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    /// Consume the message, taking ownership of the body
    pub fn into_item(self) -> Option<Item> {
        self.item
    }

    /// Match against an expectation pattern: same S/F, and the body
    /// matches structurally. A pattern without a body matches any body.
    pub fn is_match(&self, pattern: &SecsMessage) -> bool {
        if self.s != pattern.s || self.f != pattern.f {
            return false;
        }
        match (&self.item, &pattern.item) {
            (_, None) => true,
            (Some(candidate), Some(expected)) => candidate.is_match(expected),
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for SecsMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S{}F{}{}",
            self.s,
            self.f,
            if self.reply_expected { " W" } else { "" }
        )?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}
