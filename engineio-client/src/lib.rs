//! Low-level Engine.IO plumbing: the packet codec, the multi-packet framer, and the
//! HTTP long-polling transport.
//!
//! This crate has no notion of a "session" or a background poll loop — that
//! orchestration lives in `socketio-client`, which depends on this crate for wire-level
//! framing. This crate is usable on its own for anything that just needs to speak raw
//! Engine.IO frames over polling.

pub mod config;
pub mod error;
pub mod packet;
pub mod payload;
pub mod transport;

pub use error::Error;
pub use packet::{EioKind, Packet, SioKind};
pub use payload::{parse_batch, Batch, RECORD_SEPARATOR};
pub use transport::{get, new_http_client, polling_url as transport_polling_url, post, HttpClient};
