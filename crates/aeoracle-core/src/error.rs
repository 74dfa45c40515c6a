//! Error types shared by every aeoracle crate.

use thiserror::Error;

/// Errors raised by a channel or HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, bad status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The channel is closed; nothing more can be sent.
    #[error("channel closed")]
    Closed,

    /// Response body could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Errors raised while building an outbound envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A required string field was empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The envelope could not be serialized.
    #[error("failed to serialize envelope: {0}")]
    Serialize(String),
}

/// Errors raised while decoding an inbound message.
///
/// These are always returned as values; a bad frame never tears down the
/// connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// The frame is valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// A key required for this message kind is absent or has the wrong type.
    #[error("missing required key `{0}`")]
    MissingField(&'static str),

    /// An envelope's `action` disagrees with its payload `type`.
    #[error("action `{action}` does not match payload type `{payload}`")]
    ActionMismatch { action: String, payload: String },

    /// A transaction payload carries a `vsn` this client does not speak.
    #[error("unsupported transaction version {found}, expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

/// Errors surfaced by the connection facade.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ConnectionError {
    /// Returns `true` if the underlying channel is gone.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Closed))
    }
}
