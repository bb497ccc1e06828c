//! Error types returned by the Engine.IO packet codec, framer and polling transport.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or transporting Engine.IO packets.
#[derive(Error, Debug)]
pub enum Error {
    /// The packet buffer was malformed: empty, too short, or carried an out-of-range
    /// Engine.IO/Socket.IO kind byte.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A mutator was called in a state that doesn't support it (e.g. `set_sio_kind` on
    /// a packet whose Engine.IO kind isn't `Message`).
    #[error("invalid packet operation: {0}")]
    InvalidOperation(&'static str),

    /// The underlying HTTP request failed.
    #[error("transport error: {0}")]
    Http(#[from] hyper::Error),

    /// The server responded with a non-200 status code.
    #[error("unexpected HTTP status: {0}")]
    HttpStatus(hyper::StatusCode),

    /// A URL could not be built because a required value (e.g. the session id) was missing.
    #[error("cannot build URL: {0}")]
    UrlBuild(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
