//! A Socket.IO/Engine.IO client for resource-constrained devices, built on HTTP
//! long-polling. See `client` for the public API: `init`/`begin`/`send_string`/
//! `close`/`destroy`, plus the advanced `get_and_lock`/`unlock`/`is_locked` pair.

mod client;
mod config;
mod error;
mod events;
mod registry;
mod session;
mod types;

pub use client::{
    begin, close, destroy, get_and_lock, init, is_connected, is_initialized, is_locked,
    polling_url, send_packet, send_string, unlock,
};
pub use config::{ClientConfig, ClientConfigBuilder, Transport, DEFAULT_NAMESPACE, MAX_PARALLEL_SESSIONS};
pub use error::{Error, Result};
pub use events::{EventKind, SessionEvent};
pub use registry::SessionGuard;
pub use types::ClientId;

pub use engineio_client::packet::Packet;

/// Subscribe to a session's lifecycle and message events. Returns `None` if the id
/// doesn't refer to an initialized session.
pub async fn subscribe(id: ClientId) -> Option<tokio::sync::broadcast::Receiver<SessionEvent>> {
    let session = registry::get(id).await?;
    Some(session.events.subscribe())
}
