//! Core types for SECS-II/HSMS equipment-to-host communication
//!
//! This crate provides the SECS-II item data model, the HSMS message
//! header types, the structural matcher and the shared error taxonomy
//! used throughout the `secs_rs` workspace.

pub mod error;
pub mod format;
pub mod item;
pub mod message;

pub use error::{SecsError, SecsResult};
pub use format::SecsFormat;
pub use item::{Item, ItemPayload, SecsValue};
pub use message::{MessageHeader, MessageType, SecsMessage};
