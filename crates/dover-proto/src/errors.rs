//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Text was not valid JSON, or not an object with a string `event` field.
    #[error("json decode failed: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Channel envelope named an event this client does not understand.
    #[error("unknown channel event: {0}")]
    UnknownEvent(String),

    /// Envelope decoded but its payload has the wrong shape for the event,
    /// e.g. a `my_response` whose `data` is not an object.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}
