//! SECS-II item binary codec
//!
//! Wire framing per item, applied recursively for lists (depth-first,
//! pre-order; a list's header precedes its children's bytes):
//!
//! 1. one header byte `(format_code << 2) | length_size`, where
//!    `length_size` is the minimal number of bytes (1..=3) needed for
//!    the item's data length;
//! 2. `length_size` big-endian length bytes — child count for lists,
//!    payload byte length for everything else;
//! 3. the payload: flat big-endian bytes for scalar items, the encoded
//!    children for lists.

pub mod decoder;
pub mod encoder;

pub use decoder::Secs2Decoder;
pub use encoder::Secs2Encoder;

use secs_core::{SecsError, SecsFormat, SecsResult};

/// Maximum item data length representable by the 3-byte length field
pub const MAX_ITEM_LENGTH: usize = 0xFF_FFFF;

/// Split an item's leading header byte into its format and the size of
/// the following length field
///
/// Fails with `MalformedFrame` on a zero length-field size or an
/// unknown format code.
pub fn parse_format_byte(byte: u8) -> SecsResult<(SecsFormat, usize)> {
    let length_size = (byte & 0b11) as usize;
    if length_size == 0 {
        return Err(SecsError::MalformedFrame(format!(
            "Item header byte 0x{:02X} declares a zero-size length field",
            byte
        )));
    }
    let format = SecsFormat::from_code(byte >> 2)?;
    Ok((format, length_size))
}

/// Read a 1..=3-byte big-endian length field
pub fn read_length_field(bytes: &[u8]) -> usize {
    bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_byte() {
        let (format, size) = parse_format_byte(0x21).unwrap();
        assert_eq!(format, SecsFormat::Binary);
        assert_eq!(size, 1);

        let (format, size) = parse_format_byte(0x02).unwrap();
        assert_eq!(format, SecsFormat::List);
        assert_eq!(size, 2);
    }

    #[test]
    fn test_parse_format_byte_rejects_zero_size() {
        assert!(matches!(
            parse_format_byte(0x20),
            Err(SecsError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_read_length_field() {
        assert_eq!(read_length_field(&[0x7F]), 0x7F);
        assert_eq!(read_length_field(&[0x01, 0x00]), 0x100);
        assert_eq!(read_length_field(&[0x01, 0x02, 0x03]), 0x010203);
    }
}
