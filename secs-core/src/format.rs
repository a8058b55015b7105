//! SECS-II item format codes

use crate::error::{SecsError, SecsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SECS-II item format
///
/// Discriminants are the 6-bit format codes of the SEMI E5 standard
/// (conventionally written in octal). On the wire the code occupies the
/// upper six bits of an item's header byte, shifted left by two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SecsFormat {
    /// Ordered sequence of child items
    List = 0o00,
    /// Raw byte array
    Binary = 0o10,
    /// Boolean array (one byte per element)
    Boolean = 0o11,
    /// 7-bit ASCII text
    Ascii = 0o20,
    /// JIS-8 text (extended single-byte encoding)
    Jis8 = 0o21,
    /// Signed integer 64-bit array
    I8 = 0o30,
    /// Signed integer 8-bit array
    I1 = 0o31,
    /// Signed integer 16-bit array
    I2 = 0o32,
    /// Signed integer 32-bit array
    I4 = 0o34,
    /// IEEE 754 double array
    F8 = 0o40,
    /// IEEE 754 single array
    F4 = 0o44,
    /// Unsigned integer 64-bit array
    U8 = 0o50,
    /// Unsigned integer 8-bit array
    U1 = 0o51,
    /// Unsigned integer 16-bit array
    U2 = 0o52,
    /// Unsigned integer 32-bit array
    U4 = 0o54,
}

impl SecsFormat {
    /// Look up a format by its 6-bit code
    pub fn from_code(code: u8) -> SecsResult<Self> {
        match code {
            0o00 => Ok(SecsFormat::List),
            0o10 => Ok(SecsFormat::Binary),
            0o11 => Ok(SecsFormat::Boolean),
            0o20 => Ok(SecsFormat::Ascii),
            0o21 => Ok(SecsFormat::Jis8),
            0o30 => Ok(SecsFormat::I8),
            0o31 => Ok(SecsFormat::I1),
            0o32 => Ok(SecsFormat::I2),
            0o34 => Ok(SecsFormat::I4),
            0o40 => Ok(SecsFormat::F8),
            0o44 => Ok(SecsFormat::F4),
            0o50 => Ok(SecsFormat::U8),
            0o51 => Ok(SecsFormat::U1),
            0o52 => Ok(SecsFormat::U2),
            0o54 => Ok(SecsFormat::U4),
            _ => Err(SecsError::MalformedFrame(format!(
                "Unknown SECS-II format code 0o{:o}",
                code
            ))),
        }
    }

    /// The 6-bit format code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Element width in bytes (0 for List; the count of a List is its
    /// child count, not a byte length)
    pub fn size_of(&self) -> usize {
        match self {
            SecsFormat::List => 0,
            SecsFormat::Binary
            | SecsFormat::Boolean
            | SecsFormat::Ascii
            | SecsFormat::Jis8
            | SecsFormat::I1
            | SecsFormat::U1 => 1,
            SecsFormat::I2 | SecsFormat::U2 => 2,
            SecsFormat::I4 | SecsFormat::U4 | SecsFormat::F4 => 4,
            SecsFormat::I8 | SecsFormat::U8 | SecsFormat::F8 => 8,
        }
    }

    /// Conventional short name (as used in SML and log output)
    pub fn name(&self) -> &'static str {
        match self {
            SecsFormat::List => "L",
            SecsFormat::Binary => "B",
            SecsFormat::Boolean => "Boolean",
            SecsFormat::Ascii => "A",
            SecsFormat::Jis8 => "J",
            SecsFormat::I1 => "I1",
            SecsFormat::I2 => "I2",
            SecsFormat::I4 => "I4",
            SecsFormat::I8 => "I8",
            SecsFormat::F4 => "F4",
            SecsFormat::F8 => "F8",
            SecsFormat::U1 => "U1",
            SecsFormat::U2 => "U2",
            SecsFormat::U4 => "U4",
            SecsFormat::U8 => "U8",
        }
    }

    /// Check if this format is a List
    pub fn is_list(&self) -> bool {
        matches!(self, SecsFormat::List)
    }

    /// Check if this format is one of the two text formats
    pub fn is_text(&self) -> bool {
        matches!(self, SecsFormat::Ascii | SecsFormat::Jis8)
    }
}

impl fmt::Display for SecsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
