//! SECS-II item tree
//!
//! An [`Item`] is a single SECS-II value node: a list of child items, a
//! text value, or a fixed-width scalar array. Scalar payloads are held as
//! flat byte buffers in big-endian element order, so the conversion
//! between host and wire byte order happens exactly once, at
//! construction or decode time.

use crate::error::{SecsError, SecsResult};
use crate::format::SecsFormat;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Payload {
    List(Vec<Item>),
    Text(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
}

/// A single SECS-II value node
///
/// Immutable after construction; "mutation" always builds a new item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    format: SecsFormat,
    payload: Payload,
}

/// Borrowed view of an item's wire payload, consumed by the codec
pub enum ItemPayload<'a> {
    /// List items carry no inline payload, only their children
    Children(&'a [Item]),
    /// Payload bytes in wire (big-endian) order
    Data(Cow<'a, [u8]>),
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width element type usable with [`Item::value`] / [`Item::values`]
///
/// Implemented for the integer, float and bool element types of the
/// SECS-II scalar formats. Sealed; the element width decides
/// compatibility with an item's format.
pub trait SecsValue: sealed::Sealed + Copy {
    /// Element width in bytes on the wire
    const WIDTH: usize;

    /// Read one element from a big-endian chunk of exactly `WIDTH` bytes
    fn from_be_chunk(chunk: &[u8]) -> Self;

    /// Append this element in big-endian order
    fn extend_be(&self, out: &mut Vec<u8>);
}

macro_rules! impl_secs_value {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl SecsValue for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn from_be_chunk(chunk: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(chunk);
                <$t>::from_be_bytes(raw)
            }

            fn extend_be(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        }
    )*};
}

impl_secs_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl sealed::Sealed for bool {}

impl SecsValue for bool {
    const WIDTH: usize = 1;

    fn from_be_chunk(chunk: &[u8]) -> Self {
        chunk[0] != 0
    }

    fn extend_be(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl Item {
    /// Constructs a list item from its children
    pub fn list(items: Vec<Item>) -> Self {
        Item {
            format: SecsFormat::List,
            payload: Payload::List(items),
        }
    }

    /// Constructs a binary (raw byte) item
    pub fn binary(bytes: Vec<u8>) -> Self {
        Item {
            format: SecsFormat::Binary,
            payload: Payload::Bytes(bytes),
        }
    }

    /// Constructs a boolean array item
    pub fn boolean(values: Vec<bool>) -> Self {
        Self::from_values(SecsFormat::Boolean, &values)
    }

    /// Constructs a 7-bit ASCII text item
    pub fn ascii(text: impl Into<String>) -> Self {
        Item {
            format: SecsFormat::Ascii,
            payload: Payload::Text(text.into()),
        }
    }

    /// Constructs a JIS-8 text item
    pub fn jis8(text: impl Into<String>) -> Self {
        Item {
            format: SecsFormat::Jis8,
            payload: Payload::Text(text.into()),
        }
    }

    /// Constructs a signed 8-bit integer array item
    pub fn i1(values: Vec<i8>) -> Self {
        Self::from_values(SecsFormat::I1, &values)
    }

    /// Constructs a signed 16-bit integer array item
    pub fn i2(values: Vec<i16>) -> Self {
        Self::from_values(SecsFormat::I2, &values)
    }

    /// Constructs a signed 32-bit integer array item
    pub fn i4(values: Vec<i32>) -> Self {
        Self::from_values(SecsFormat::I4, &values)
    }

    /// Constructs a signed 64-bit integer array item
    pub fn i8(values: Vec<i64>) -> Self {
        Self::from_values(SecsFormat::I8, &values)
    }

    /// Constructs an unsigned 8-bit integer array item
    pub fn u1(values: Vec<u8>) -> Self {
        Self::from_values(SecsFormat::U1, &values)
    }

    /// Constructs an unsigned 16-bit integer array item
    pub fn u2(values: Vec<u16>) -> Self {
        Self::from_values(SecsFormat::U2, &values)
    }

    /// Constructs an unsigned 32-bit integer array item
    pub fn u4(values: Vec<u32>) -> Self {
        Self::from_values(SecsFormat::U4, &values)
    }

    /// Constructs an unsigned 64-bit integer array item
    pub fn u8(values: Vec<u64>) -> Self {
        Self::from_values(SecsFormat::U8, &values)
    }

    /// Constructs a 32-bit float array item
    pub fn f4(values: Vec<f32>) -> Self {
        Self::from_values(SecsFormat::F4, &values)
    }

    /// Constructs a 64-bit float array item
    pub fn f8(values: Vec<f64>) -> Self {
        Self::from_values(SecsFormat::F8, &values)
    }

    fn from_values<T: SecsValue>(format: SecsFormat, values: &[T]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * T::WIDTH);
        for value in values {
            value.extend_be(&mut bytes);
        }
        Item {
            format,
            payload: Payload::Bytes(bytes),
        }
    }

    /// Builds a non-List item from its wire payload bytes
    ///
    /// Text formats are decoded with their fixed single-byte encodings;
    /// scalar formats keep the bytes in wire order. Fails with
    /// `MalformedFrame` if the payload length is not a multiple of the
    /// format's element width.
    pub fn from_wire_bytes(format: SecsFormat, bytes: Vec<u8>) -> SecsResult<Self> {
        match format {
            SecsFormat::List => Err(SecsError::InvalidShape(
                "List items carry no inline payload".to_string(),
            )),
            SecsFormat::Ascii | SecsFormat::Jis8 => Ok(Item {
                format,
                payload: Payload::Text(decode_text(format, &bytes)),
            }),
            _ => {
                let width = format.size_of();
                if bytes.len() % width != 0 {
                    return Err(SecsError::MalformedFrame(format!(
                        "{} payload length {} is not a multiple of element width {}",
                        format.name(),
                        bytes.len(),
                        width
                    )));
                }
                Ok(Item {
                    format,
                    payload: Payload::Bytes(bytes),
                })
            }
        }
    }

    /// The item's format
    pub fn format(&self) -> SecsFormat {
        self.format
    }

    /// Element count: child count for lists, character count for text,
    /// payload length divided by element width for scalar arrays
    pub fn count(&self) -> usize {
        match &self.payload {
            Payload::List(items) => items.len(),
            Payload::Text(text) => text.chars().count(),
            Payload::Bytes(bytes) => bytes.len() / self.format.size_of(),
        }
    }

    /// Child items of a list
    pub fn items(&self) -> SecsResult<&[Item]> {
        match &self.payload {
            Payload::List(items) => Ok(items),
            _ => Err(SecsError::InvalidShape(format!(
                "The item is not a list, it is {}",
                self.format.name()
            ))),
        }
    }

    /// Text value of an ASCII or JIS-8 item
    pub fn get_string(&self) -> SecsResult<&str> {
        match &self.payload {
            Payload::Text(text) => Ok(text),
            _ => Err(SecsError::InvalidShape(format!(
                "The item is not a string, it is {}",
                self.format.name()
            ))),
        }
    }

    /// Decoded scalar values of a numeric, boolean or binary item
    ///
    /// Fails with `InvalidShape` on list and text items, and with
    /// `TypeMismatch` when `T`'s width differs from the format's element
    /// width.
    pub fn values<T: SecsValue>(&self) -> SecsResult<Vec<T>> {
        let bytes = self.scalar_bytes()?;
        if T::WIDTH != self.format.size_of() {
            return Err(SecsError::TypeMismatch {
                expected: self.format.size_of(),
                actual: T::WIDTH,
            });
        }
        Ok(bytes.chunks_exact(T::WIDTH).map(T::from_be_chunk).collect())
    }

    /// First scalar value of the item; `InvalidShape` when empty
    pub fn value<T: SecsValue>(&self) -> SecsResult<T> {
        self.values::<T>()?
            .into_iter()
            .next()
            .ok_or_else(|| SecsError::InvalidShape("The item is empty".to_string()))
    }

    /// Borrowed wire payload, for the codec
    pub fn wire_payload(&self) -> ItemPayload<'_> {
        match &self.payload {
            Payload::List(items) => ItemPayload::Children(items),
            Payload::Text(text) => ItemPayload::Data(Cow::Owned(encode_text(self.format, text))),
            Payload::Bytes(bytes) => ItemPayload::Data(Cow::Borrowed(bytes)),
        }
    }

    /// Wire data length: payload byte length for non-List items, child
    /// count for lists (the value of the item's length field)
    pub fn wire_length(&self) -> usize {
        match &self.payload {
            Payload::List(items) => items.len(),
            Payload::Text(text) => text.chars().count(),
            Payload::Bytes(bytes) => bytes.len(),
        }
    }

    /// Structural match against a pattern item
    ///
    /// Formats must be equal. A pattern with count 0 matches any
    /// candidate of the same format (wildcard); otherwise counts must be
    /// equal and list children match pairwise, text matches by string
    /// equality, scalars by raw payload bytes.
    pub fn is_match(&self, pattern: &Item) -> bool {
        if self.format != pattern.format {
            return false;
        }
        if self.count() != pattern.count() {
            return pattern.count() == 0;
        }
        if self.count() == 0 {
            return true;
        }
        match (&self.payload, &pattern.payload) {
            (Payload::List(a), Payload::List(b)) => {
                a.iter().zip(b.iter()).all(|(x, y)| x.is_match(y))
            }
            (Payload::Text(a), Payload::Text(b)) => a == b,
            (Payload::Bytes(a), Payload::Bytes(b)) => a == b,
            _ => false,
        }
    }

    fn scalar_bytes(&self) -> SecsResult<&[u8]> {
        match &self.payload {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::List(_) => Err(SecsError::InvalidShape("The item is a list".to_string())),
            Payload::Text(_) => Err(SecsError::InvalidShape("The item is a string".to_string())),
        }
    }
}

// ASCII is strict 7-bit; JIS-8 is treated as the extended single-byte
// Latin class (code points through 0xFF). Out-of-range characters become
// '?' on encode and high bytes become '?' on ASCII decode.
fn encode_text(format: SecsFormat, text: &str) -> Vec<u8> {
    let limit: u32 = if format == SecsFormat::Ascii { 0x80 } else { 0x100 };
    text.chars()
        .map(|c| if (c as u32) < limit { c as u32 as u8 } else { b'?' })
        .collect()
}

fn decode_text(format: SecsFormat, bytes: &[u8]) -> String {
    if format == SecsFormat::Ascii {
        bytes
            .iter()
            .map(|&b| if b < 0x80 { b as char } else { '?' })
            .collect()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

impl fmt::Display for Item {
    /// `"Format [count]"` with a truncated value preview; log output
    /// only, not wire-exact
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.format.name(), self.count())?;
        match &self.payload {
            Payload::List(_) => Ok(()),
            Payload::Text(text) => {
                let preview: String = text.chars().take(32).collect();
                write!(f, ": {}", preview)?;
                if text.chars().count() > 32 {
                    write!(f, "..")?;
                }
                Ok(())
            }
            Payload::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }
                write!(f, ":")?;
                for byte in bytes.iter().take(16) {
                    write!(f, " {:02X}", byte)?;
                }
                if bytes.len() > 16 {
                    write!(f, " ..")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_accessors() {
        let item = Item::list(vec![Item::u1(vec![1]), Item::ascii("OK")]);
        assert_eq!(item.format(), SecsFormat::List);
        assert_eq!(item.count(), 2);
        assert_eq!(item.items().unwrap().len(), 2);
        assert!(item.get_string().is_err());
        assert!(item.values::<u8>().is_err());
    }

    #[test]
    fn test_scalar_big_endian_payload() {
        let item = Item::u2(vec![0x0102]);
        match item.wire_payload() {
            ItemPayload::Data(data) => assert_eq!(&data[..], &[0x01, 0x02]),
            ItemPayload::Children(_) => panic!("not a list"),
        }
        assert_eq!(item.value::<u16>().unwrap(), 0x0102);
    }

    #[test]
    fn test_values_type_mismatch() {
        let item = Item::u2(vec![7, 8]);
        assert_eq!(item.values::<u16>().unwrap(), vec![7, 8]);
        assert!(matches!(
            item.values::<u32>(),
            Err(SecsError::TypeMismatch {
                expected: 2,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_same_width_reinterpretation_allowed() {
        // width decides compatibility, not signedness
        let item = Item::u1(vec![0xFF]);
        assert_eq!(item.value::<i8>().unwrap(), -1);
    }

    #[test]
    fn test_from_wire_bytes_uneven_length() {
        assert!(matches!(
            Item::from_wire_bytes(SecsFormat::U4, vec![0, 1, 2]),
            Err(SecsError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_text_round_trip() {
        let item = Item::ascii("LOT-42");
        assert_eq!(item.count(), 6);
        assert_eq!(item.get_string().unwrap(), "LOT-42");
        let bytes = match item.wire_payload() {
            ItemPayload::Data(data) => data.into_owned(),
            ItemPayload::Children(_) => panic!("not a list"),
        };
        let decoded = Item::from_wire_bytes(SecsFormat::Ascii, bytes).unwrap();
        assert_eq!(decoded.get_string().unwrap(), "LOT-42");
    }

    #[test]
    fn test_ascii_substitutes_out_of_range() {
        let item = Item::ascii("µm");
        let bytes = match item.wire_payload() {
            ItemPayload::Data(data) => data.into_owned(),
            ItemPayload::Children(_) => panic!("not a list"),
        };
        assert_eq!(bytes, vec![b'?', b'm']);
    }

    #[test]
    fn test_wire_length_is_length_field_value() {
        // child count for lists, payload byte length otherwise
        let list = Item::list(vec![Item::u4(vec![1]), Item::u4(vec![2])]);
        assert_eq!(list.wire_length(), 2);
        assert_eq!(Item::u4(vec![1, 2]).wire_length(), 8);
        assert_eq!(Item::ascii("LOT").wire_length(), 3);
        assert_eq!(Item::list(vec![]).wire_length(), 0);
    }

    #[test]
    fn test_empty_items_compare_equal() {
        assert_eq!(Item::list(vec![]), Item::list(Vec::new()));
        assert_eq!(Item::u4(vec![]), Item::u4(Vec::new()));
        assert_ne!(Item::u4(vec![]), Item::u2(vec![]));
    }

    #[test]
    fn test_match_wildcard_by_count() {
        let candidate = Item::list(vec![Item::u1(vec![1]), Item::u1(vec![2])]);
        assert!(candidate.is_match(&Item::list(vec![])));
        assert!(Item::u2(vec![1, 2, 3]).is_match(&Item::u2(vec![])));
        assert!(!Item::u2(vec![1]).is_match(&Item::u4(vec![])));
    }

    #[test]
    fn test_match_pairwise_children() {
        let a = Item::list(vec![Item::ascii("A"), Item::u1(vec![1])]);
        let same = Item::list(vec![Item::ascii("A"), Item::u1(vec![1])]);
        let differs = Item::list(vec![Item::ascii("A"), Item::u1(vec![2])]);
        assert!(a.is_match(&same));
        assert!(!a.is_match(&differs));
    }

    #[test]
    fn test_match_exact_bytes() {
        assert!(Item::binary(vec![0, 1]).is_match(&Item::binary(vec![0, 1])));
        assert!(!Item::binary(vec![0, 1]).is_match(&Item::binary(vec![0, 2])));
        assert!(!Item::binary(vec![0, 1]).is_match(&Item::u1(vec![0, 1])));
    }

    #[test]
    fn test_display_summary() {
        assert_eq!(Item::u2(vec![0x0102]).to_string(), "U2 [1]: 01 02");
        assert_eq!(Item::list(vec![]).to_string(), "L [0]");
        assert_eq!(Item::ascii("GO").to_string(), "A [2]: GO");
    }
}
