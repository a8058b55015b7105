//! secs - Rust implementation of the SECS-II/HSMS protocol
//!
//! This library implements the SEMI equipment communication standards:
//! SECS-II structured messages carried over the HSMS TCP/IP framing.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `secs-core`: Item data model, message types, error handling
//! - `secs-codec`: Header and SECS-II binary encoding/decoding
//! - `secs-transport`: Transport layer (TCP byte streams)
//! - `secs-session`: Streaming decoder and decode loop
//!
//! # Usage
//!
//! ```no_run
//! use secs::SecsDecoder;
//!
//! let decoder = SecsDecoder::new(
//!     |header| println!("control: {}", header),
//!     |_, message| println!("data: {}", message),
//! );
//! ```

pub use secs_codec as codec;
pub use secs_core as core;
pub use secs_session as session;
pub use secs_transport as transport;

pub use secs_core::{
    Item, ItemPayload, MessageHeader, MessageType, SecsError, SecsFormat, SecsMessage, SecsResult,
    SecsValue,
};
pub use secs_session::{drive, write_message, SecsDecoder};
