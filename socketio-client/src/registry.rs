//! The session registry: a fixed-capacity table mapping a small integer `client_id`
//! to a session, plus the locking helpers every other operation is built on.
//!
//! The table is process-wide: client ids are meant to be small, stable handles an
//! embedding application can pass around freely, which is an ergonomic match for the
//! registry staying global rather than threaded through every call site.

use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::{ClientConfig, MAX_PARALLEL_SESSIONS};
use crate::error::{Error, Result};
use crate::session::{Session, SessionState};
use crate::types::ClientId;

type Slot = Option<Arc<Session>>;

static REGISTRY: OnceLock<Mutex<Vec<Slot>>> = OnceLock::new();

fn table() -> &'static Mutex<Vec<Slot>> {
    REGISTRY.get_or_init(|| Mutex::new((0..MAX_PARALLEL_SESSIONS).map(|_| None).collect()))
}

/// Allocate a new session in the lowest-indexed empty slot.
pub async fn init(config: ClientConfig) -> Result<ClientId> {
    let mut slots = table().lock().await;

    let slot = slots
        .iter()
        .position(Option::is_none)
        .ok_or(Error::Capacity)?;

    let client_id = slot as ClientId;
    slots[slot] = Some(Arc::new(Session::new(client_id, config)));

    Ok(client_id)
}

/// Tear down a session. Refuses if its poll loop is still running (the caller must
/// `close` first).
pub async fn destroy(id: ClientId) -> Result<()> {
    let mut slots = table().lock().await;
    let Some(slot) = slots.get_mut(id as usize) else {
        return Ok(());
    };
    let Some(session) = slot else {
        return Ok(());
    };

    if session.is_connected().await {
        return Err(Error::State(
            "polling client is running, close the session before destroying it",
        ));
    }

    *slot = None;
    Ok(())
}

pub async fn is_initialized(id: ClientId) -> bool {
    let slots = table().lock().await;
    slots.get(id as usize).is_some_and(Option::is_some)
}

/// Fetch the session `Arc` for a given id without locking its internal mutex.
pub(crate) async fn get(id: ClientId) -> Option<Arc<Session>> {
    let slots = table().lock().await;
    slots.get(id as usize).and_then(Clone::clone)
}

/// Fetch and lock a session's internal state. Returns `None` if the id doesn't refer
/// to an initialized session. Waits unboundedly for the lock.
///
/// The registry lock itself is released as soon as the `Arc<Session>` is cloned out of
/// it, so the caller isn't left holding the registry lock while it waits on the
/// session's lock.
pub async fn get_and_lock(id: ClientId) -> Option<SessionGuard> {
    let session = get(id).await?;
    let state = session.lock_owned().await;
    Some(SessionGuard { session, state })
}

/// Drop the guard to release the session's lock. Kept as a named operation even though
/// the `Drop` impl on [`SessionGuard`] already does this automatically.
pub fn unlock(guard: SessionGuard) {
    drop(guard);
}

/// Diagnostic-only: true if another task currently holds the session's lock.
pub async fn is_locked(id: ClientId) -> bool {
    let Some(session) = get(id).await else {
        return false;
    };
    session.is_locked_diagnostic()
}

/// A locked handle to a session, released when dropped.
///
/// Exposes only read-only diagnostics over the locked state rather than `Session`'s own
/// async methods: those methods (`send_packet`, `close`, `begin`) acquire the same lock
/// internally, so calling them while already holding a [`SessionGuard`] would deadlock
/// against tokio's non-reentrant mutex.
pub struct SessionGuard {
    session: Arc<Session>,
    state: OwnedMutexGuard<SessionState>,
}

impl SessionGuard {
    pub fn client_id(&self) -> ClientId {
        self.session.client_id
    }

    pub fn server_session_id(&self) -> Option<&str> {
        self.state.server_session_id.as_deref()
    }

    pub fn is_polling_running(&self) -> bool {
        self.state.polling_running
    }

    pub fn ping_interval_ms(&self) -> Option<u32> {
        self.state.ping_interval_ms
    }

    pub fn ping_timeout_ms(&self) -> Option<u32> {
        self.state.ping_timeout_ms
    }
}
