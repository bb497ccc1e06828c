//! Error types surfaced by session lifecycle operations.

use thiserror::Error;

/// The coarse error categories of §7: configuration, capacity, state, transport,
/// protocol and "not implemented" (the reserved WebSocket transport).
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session registry has no free slot.
    #[error("no free session slot (registry is at MAX_PARALLEL_SESSIONS capacity)")]
    Capacity,

    /// The requested operation isn't valid in the session's current state.
    #[error("invalid state: {0}")]
    State(&'static str),

    /// The client id doesn't refer to an initialized session.
    #[error("unknown session id")]
    UnknownSession,

    /// The underlying HTTP transport failed, returned a bad status, or the handshake/
    /// poll response had an unexpected shape.
    #[error("transport error: {0}")]
    Transport(#[from] engineio_client::Error),

    /// The handshake or a response failed to parse as the expected JSON/packet shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Deserializing a JSON payload failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The `websockets` transport selector was chosen; only `polling` is implemented.
    #[error("the websocket transport is not implemented")]
    NotImplemented,
}

pub type Result<T> = std::result::Result<T, Error>;
