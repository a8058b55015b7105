//! Binary codec for SECS-II items and HSMS message headers
//!
//! This crate provides the single-shot encoder/decoder pair for item
//! trees and whole messages, plus the pure 10-byte header codec. The
//! incremental streaming decoder lives in `secs-session` and re-enters
//! this crate's framing rules item by item.

pub mod header;
pub mod secs2;

pub use header::{decode_header, encode_header, HEADER_LENGTH};
pub use secs2::{Secs2Decoder, Secs2Encoder};
