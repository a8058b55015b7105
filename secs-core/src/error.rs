use thiserror::Error;

/// Main error type for SECS-II/HSMS operations
#[derive(Error, Debug)]
pub enum SecsError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Item data length {0} overflows the 3-byte length field")]
    LengthOverflow(usize),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Type mismatch: format element width is {expected}, requested width {actual}")]
    TypeMismatch { expected: usize, actual: usize },

    #[error("Stream closed while a message was partially received")]
    StreamClosed,

    #[error("Inter-character timeout (T8) expired")]
    InterCharacterTimeout,
}

/// Result type alias for SECS-II/HSMS operations
pub type SecsResult<T> = Result<T, SecsError>;
