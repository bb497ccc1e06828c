//! The session descriptor, handshake/poll/close state machine, and the background
//! poll task.

use std::sync::Arc;
use std::time::Duration;

use engineio_client::packet::{EioKind, Packet};
use engineio_client::transport::{self, HttpClient};
use serde::Deserialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, Transport};
use crate::error::{Error, Result};
use crate::events::{EventBus, EventKind, SessionEvent};
use crate::types::ClientId;

/// Mitigates an unresolved server/library interaction bug: destroy and forget the post
/// client handle after every POST, rather than keeping one alive across requests.
const REBUILD_CLIENT_POST: bool = true;

#[derive(Deserialize)]
struct HandshakePayload {
    sid: String,
    #[serde(rename = "pingInterval")]
    ping_interval: u32,
    #[serde(rename = "pingTimeout")]
    ping_timeout: u32,
}

/// The mutable part of a session, guarded by a single `tokio::sync::Mutex` covering
/// every mutable field.
pub(crate) struct SessionState {
    pub(crate) server_session_id: Option<String>,
    pub(crate) ping_interval_ms: Option<u32>,
    pub(crate) ping_timeout_ms: Option<u32>,
    handshake_client: Option<HttpClient>,
    poll_client: Option<HttpClient>,
    post_client: Option<HttpClient>,
    pub(crate) polling_running: bool,
    poll_task: Option<JoinHandle<()>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            server_session_id: None,
            ping_interval_ms: None,
            ping_timeout_ms: None,
            handshake_client: None,
            poll_client: None,
            post_client: None,
            polling_running: false,
            poll_task: None,
        }
    }
}

/// An owned session record. Immutable connection parameters live outside the mutex
/// since they never change after `init`; everything negotiated or transport-owned
/// lives inside it.
pub struct Session {
    pub client_id: ClientId,
    pub events: EventBus,
    config: ClientConfig,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub(crate) fn new(client_id: ClientId, config: ClientConfig) -> Self {
        Session {
            client_id,
            events: EventBus::new(),
            config,
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Acquire an owned lock on this session's state, independent of the session's own
    /// `Arc` lifetime. Backs the registry's `get_and_lock`.
    pub(crate) async fn lock_owned(&self) -> OwnedMutexGuard<SessionState> {
        Arc::clone(&self.state).lock_owned().await
    }

    /// Diagnostic-only non-blocking probe: true if some task currently holds the lock.
    pub(crate) fn is_locked_diagnostic(&self) -> bool {
        self.state.try_lock().is_err()
    }

    pub async fn is_connected(&self) -> bool {
        let state = self.state.lock().await;
        state.server_session_id.is_some() && state.polling_running
    }

    /// The polling GET/POST URL for this session, or `None` if no handshake has
    /// completed yet.
    pub async fn polling_url(&self) -> Option<String> {
        let state = self.state.lock().await;
        transport::polling_url(
            &self.config.server_address,
            &self.config.sio_url_path,
            self.config.eio_version,
            state.server_session_id.as_deref(),
        )
    }

    /// Perform the handshake and, on success, spawn the poll task and post a
    /// `Connected` event.
    pub async fn begin(self: &Arc<Self>) -> Result<()> {
        match self.config.transport {
            Transport::Websockets => return Err(Error::NotImplemented),
            Transport::Polling => {}
        }

        let mut state = self.state.lock().await;
        if state.polling_running {
            return Err(Error::State(
                "polling client already running, close it properly first",
            ));
        }

        let result = self.handshake_polling(&mut state).await;
        match result {
            Ok(batch) => {
                state.polling_running = true;
                drop(state);
                self.spawn_poll_task().await;
                self.events.post(SessionEvent {
                    client_id: self.client_id,
                    kind: EventKind::Connected,
                    batch: Some(batch),
                });
                Ok(())
            }
            Err((err, batch)) => {
                drop(state);
                #[cfg(feature = "tracing")]
                tracing::warn!(client_id = self.client_id, "handshake failed: {err}");
                self.events.post(SessionEvent {
                    client_id: self.client_id,
                    kind: EventKind::ConnectError,
                    batch: (!batch.is_empty()).then_some(batch),
                });
                Err(err)
            }
        }
    }

    /// Perform the handshake GET and Connect POST. On failure, returns whatever
    /// packets the handshake GET actually produced alongside the error, so callers
    /// can post them on the `ConnectError` event per spec rather than losing them.
    async fn handshake_polling(
        &self,
        state: &mut SessionState,
    ) -> std::result::Result<Vec<Packet>, (Error, Vec<Packet>)> {
        let url = transport::handshake_url(
            &self.config.server_address,
            &self.config.sio_url_path,
            self.config.eio_version,
        );
        let client = state
            .handshake_client
            .get_or_insert_with(transport::new_http_client);

        let mac = (!self.config.base_mac.is_empty()).then_some(self.config.base_mac.as_str());
        let batch = transport::get(client, &url, mac)
            .await
            .map_err(|err| (Error::from(err), Vec::new()))?;

        if batch.len() != 1 {
            let err = Error::Protocol(format!(
                "expected 1 packet from handshake, got {}",
                batch.len()
            ));
            return Err((err, batch));
        }
        let open_packet = &batch[0];
        if open_packet.eio_kind != EioKind::Open {
            let err = Error::Protocol(format!(
                "expected an Open packet, got {:?}",
                open_packet.eio_kind
            ));
            return Err((err, batch));
        }
        let json = match open_packet.json() {
            Some(json) => json,
            None => {
                let err = Error::Protocol("Open packet carried no JSON payload".into());
                return Err((err, batch));
            }
        };
        let payload: HandshakePayload = match serde_json::from_str(json) {
            Ok(payload) => payload,
            Err(err) => return Err((Error::from(err), batch)),
        };

        state.server_session_id = Some(payload.sid);
        state.ping_interval_ms = Some(payload.ping_interval);
        state.ping_timeout_ms = Some(payload.ping_timeout);

        let auth_body = self
            .config
            .alloc_auth_body_cb
            .as_ref()
            .map(|cb| cb())
            .unwrap_or_default();
        let connect_packet = Packet::connect(&auth_body);
        if let Err(err) = self.send_packet_polling(state, &connect_packet).await {
            return Err((err, batch));
        }

        Ok(batch)
    }

    async fn spawn_poll_task(self: &Arc<Self>) {
        let session = Arc::clone(self);
        let handle = tokio::spawn(async move { poll_loop(session).await });
        let mut state = self.state.lock().await;
        state.poll_task = Some(handle);
    }

    /// Build a `Close` packet, stop the poll loop, wait for it to finish, then send
    /// the close packet.
    pub async fn close(&self) -> Result<()> {
        let close_packet = Packet::control(EioKind::Close);

        let poll_task = {
            let mut state = self.state.lock().await;
            if state.server_session_id.is_none() {
                return Err(Error::State("server session id not set, was begin() called?"));
            }
            state.polling_running = false;
            state.poll_task.take()
        };

        if let Some(task) = poll_task {
            let _ = task.await;
        }

        self.send_packet(close_packet).await
    }

    /// Dispatch a pre-built packet via the configured transport.
    pub async fn send_packet(&self, packet: Packet) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.server_session_id.is_none() {
            return Err(Error::State(
                "server session id not set, was this session's handshake completed?",
            ));
        }
        match self.config.transport {
            Transport::Polling => self.send_packet_polling(&mut state, &packet).await,
            Transport::Websockets => Err(Error::NotImplemented),
        }
    }

    /// Build and send a Socket.IO event packet.
    pub async fn send_string(&self, event: &str, data: &str) -> Result<()> {
        let packet = Packet::event(Some(event), data);
        self.send_packet(packet).await
    }

    async fn send_packet_polling(&self, state: &mut SessionState, packet: &Packet) -> Result<()> {
        let url = transport::polling_url(
            &self.config.server_address,
            &self.config.sio_url_path,
            self.config.eio_version,
            state.server_session_id.as_deref(),
        )
        .ok_or(Error::State("no session id available for POST"))?;

        let client = state
            .post_client
            .get_or_insert_with(transport::new_http_client);

        let batch = transport::post(client, &url, packet.as_bytes().to_vec()).await?;

        if batch.len() != 1 || batch[0].eio_kind != EioKind::OkServer {
            #[cfg(feature = "tracing")]
            tracing::error!(
                client_id = self.client_id,
                "expected a single 'ok' response from server after send, got {} packets",
                batch.len()
            );
        }

        if REBUILD_CLIENT_POST {
            state.post_client = None;
        }

        Ok(())
    }
}

/// The background poll task: repeatedly issues long-poll GETs and dispatches
/// received packets on the event bus, until `polling_running` becomes false.
async fn poll_loop(session: Arc<Session>) {
    loop {
        let (url, timeout_dur, client_snapshot) = {
            let mut state = session.state.lock().await;
            if !state.polling_running {
                break;
            }
            let url = match transport::polling_url(
                &session.config.server_address,
                &session.config.sio_url_path,
                session.config.eio_version,
                state.server_session_id.as_deref(),
            ) {
                Some(url) => url,
                None => break,
            };
            let timeout_ms = state.ping_timeout_ms.unwrap_or(20_000) as u64;
            // Deliberately generous: 2x the negotiated ping_timeout, scaled by a further
            // 1000x margin. Kept intact rather than retuned down to `2 * timeout_ms`,
            // since a live server negotiation has never been observed to confirm the
            // intended magnitude.
            let timeout_dur = Duration::from_millis(2 * timeout_ms * 1000);
            if state.poll_client.is_none() {
                state.poll_client = Some(transport::new_http_client());
            }
            let client = state.poll_client.clone().expect("just inserted above");
            (url, timeout_dur, client)
        };

        let result = tokio::time::timeout(timeout_dur, transport::get(&client_snapshot, &url, None)).await;

        let batch = match result {
            Ok(Ok(batch)) if batch.is_empty() => {
                #[cfg(feature = "tracing")]
                tracing::warn!(client_id = session.client_id, "polling GET returned an empty body");
                break;
            }
            Ok(Ok(batch)) => batch,
            Ok(Err(err)) => {
                #[cfg(feature = "tracing")]
                tracing::error!(client_id = session.client_id, "polling GET failed: {err}");
                break;
            }
            Err(_elapsed) => {
                #[cfg(feature = "tracing")]
                tracing::error!(client_id = session.client_id, "polling GET timed out");
                break;
            }
        };

        let mut should_teardown = false;
        for packet in &batch {
            match packet.eio_kind {
                EioKind::Ping => {
                    let pong = Packet::control(EioKind::Pong);
                    if let Err(err) = session.send_packet(pong).await {
                        #[cfg(feature = "tracing")]
                        tracing::error!(client_id = session.client_id, "failed to send pong: {err}");
                    }
                }
                EioKind::Close => {
                    should_teardown = true;
                }
                EioKind::Message => {}
                other => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(client_id = session.client_id, "unhandled packet kind {:?}", other);
                }
            }
        }

        if should_teardown {
            break;
        }

        let only_non_message = batch.len() == 1 && batch[0].eio_kind != EioKind::Message;
        if !only_non_message {
            session.events.post(SessionEvent {
                client_id: session.client_id,
                kind: EventKind::ReceivedMessage,
                batch: Some(batch),
            });
        }
    }

    session.events.post(SessionEvent {
        client_id: session.client_id,
        kind: EventKind::Disconnected,
        batch: None,
    });

    let mut state = session.state.lock().await;
    state.polling_running = false;
    state.poll_client = None;
}
