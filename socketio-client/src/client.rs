//! The public API surface (spec §6): thin functions over the registry and session
//! modules, taking a [`ClientId`] rather than exposing `Session`/`Arc<Session>`
//! directly to callers.

use engineio_client::packet::Packet;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::registry::{self, SessionGuard};
use crate::types::ClientId;

/// Allocate a new session. See [`crate::ClientConfigBuilder`].
pub async fn init(config: ClientConfig) -> Result<ClientId> {
    registry::init(config).await
}

/// Tear down a session. Fails with [`Error::State`] if it's still polling; `close` it
/// first.
pub async fn destroy(id: ClientId) -> Result<()> {
    registry::destroy(id).await
}

pub async fn is_initialized(id: ClientId) -> bool {
    registry::is_initialized(id).await
}

/// True once a handshake has completed and the poll loop is running.
pub async fn is_connected(id: ClientId) -> Result<bool> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    Ok(session.is_connected().await)
}

/// Perform the handshake and start polling.
pub async fn begin(id: ClientId) -> Result<()> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    session.begin().await
}

/// Stop polling and send a graceful Close packet.
pub async fn close(id: ClientId) -> Result<()> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    session.close().await
}

/// Send a pre-built Engine.IO/Socket.IO packet.
pub async fn send_packet(id: ClientId, packet: Packet) -> Result<()> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    session.send_packet(packet).await
}

/// Build and send a Socket.IO event packet carrying `data` as its JSON argument array.
pub async fn send_string(id: ClientId, event: &str, data: &str) -> Result<()> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    session.send_string(event, data).await
}

/// The polling GET/POST URL for a session, or `None` before its handshake completes.
pub async fn polling_url(id: ClientId) -> Result<Option<String>> {
    let session = registry::get(id).await.ok_or(Error::UnknownSession)?;
    Ok(session.polling_url().await)
}

/// Bounds-checks and acquires the session's internal lock with an unbounded wait.
/// Pair with [`unlock`].
pub async fn get_and_lock(id: ClientId) -> Option<SessionGuard> {
    registry::get_and_lock(id).await
}

/// Release a lock acquired by [`get_and_lock`]. Equivalent to dropping the guard.
pub fn unlock(guard: SessionGuard) {
    registry::unlock(guard)
}

/// Diagnostic-only non-blocking probe: true if another task currently holds the
/// session's lock.
pub async fn is_locked(id: ClientId) -> bool {
    registry::is_locked(id).await
}
