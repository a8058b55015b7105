//! HSMS session layer
//!
//! Incremental decoding of HSMS frames from a chunked byte stream
//! ([`decoder::SecsDecoder`]) and the fill/drain loop that feeds it,
//! including the T8 inter-character timer ([`driver`]).
//!
//! Connection management (Select/Deselect/Linktest handling, T3/T5/T6/T7
//! timers, device-id routing) sits above this crate; it receives decoded
//! headers and messages through the decoder's callbacks.

pub mod decoder;
pub mod driver;

pub use decoder::{DecodeStep, SecsDecoder};
pub use driver::{drive, write_message};
