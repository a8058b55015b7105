//! Transport layer for HSMS
//!
//! HSMS is defined over TCP; this crate provides the abstract byte
//! stream consumed by the session layer's decode loop, plus the TCP
//! implementation.

pub mod stream;
pub mod tcp;

pub use stream::ByteStream;
pub use tcp::{TcpByteStream, TcpSettings};
