//! Error types for the ticket codec

use thiserror::Error;

/// Ticket codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketError {
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Unsupported key length: {0} bytes")]
    UnsupportedKeyLength(usize),

    #[error("Malformed wire string: {0}")]
    MalformedWireString(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Truncated payload: {0}")]
    TruncatedPayload(String),

    #[error("Unsupported ticket version: {0}")]
    UnsupportedVersion(u8),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Result type for ticket codec operations
pub type Result<T> = std::result::Result<T, TicketError>;
