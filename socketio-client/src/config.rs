//! Client configuration: the options recognized at `init` time (§6), plus the
//! compile-time constants that bound the registry and transport.

use std::sync::Arc;

use engineio_client::config::{DEFAULT_EIO_VERSION, DEFAULT_SIO_URL_PATH};

/// Upper bound on the number of sessions the registry will hold at once.
pub const MAX_PARALLEL_SESSIONS: usize = 4;

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Which wire transport a session should use.
///
/// `Websockets` is accepted at configuration time to leave the door open for a future
/// variant, but `begin`/`send` return [`crate::error::Error::NotImplemented`] for it —
/// no WebSocket wire support is built here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Polling,
    Websockets,
}

/// A producer of an owned auth JSON string, invoked once at handshake time when
/// building the Connect packet's auth body.
pub type AuthBodyFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Configuration for one client session, built with [`ClientConfigBuilder`].
#[derive(Clone)]
pub struct ClientConfig {
    pub eio_version: u8,
    pub transport: Transport,
    pub base_mac: String,
    pub server_address: String,
    pub sio_url_path: String,
    pub nspc: String,
    pub alloc_auth_body_cb: Option<AuthBodyFn>,
}

/// Builds a [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    eio_version: Option<u8>,
    transport: Option<Transport>,
    base_mac: Option<String>,
    server_address: Option<String>,
    sio_url_path: Option<String>,
    nspc: Option<String>,
    alloc_auth_body_cb: Option<AuthBodyFn>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required. Host plus port, no scheme, no path (e.g. `"192.0.2.10:3000"`).
    pub fn server_address(mut self, address: impl Into<String>) -> Self {
        self.server_address = Some(address.into());
        self
    }

    /// Engine.IO major version. `0` (the default if never called) selects the
    /// compile-time default of `4`.
    pub fn eio_version(mut self, version: u8) -> Self {
        self.eio_version = Some(version);
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Opaque string sent as the HTTP `MAC` header during handshake.
    pub fn base_mac(mut self, mac: impl Into<String>) -> Self {
        self.base_mac = Some(mac.into());
        self
    }

    /// Defaults to `/socket.io` if never called.
    pub fn sio_url_path(mut self, path: impl Into<String>) -> Self {
        self.sio_url_path = Some(path.into());
        self
    }

    /// Defaults to `/` if never called.
    pub fn nspc(mut self, nspc: impl Into<String>) -> Self {
        self.nspc = Some(nspc.into());
        self
    }

    /// Register a producer of an auth JSON string, invoked once at handshake.
    pub fn alloc_auth_body_cb<F>(mut self, cb: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.alloc_auth_body_cb = Some(Arc::new(cb));
        self
    }

    /// Finish building. Fails with [`crate::error::Error::Config`] if `server_address`
    /// was never set.
    pub fn build(self) -> crate::error::Result<ClientConfig> {
        let server_address = self
            .server_address
            .ok_or_else(|| crate::error::Error::Config("server_address is required".into()))?;

        let eio_version = match self.eio_version {
            Some(0) | None => DEFAULT_EIO_VERSION,
            Some(v) => v,
        };

        Ok(ClientConfig {
            eio_version,
            transport: self.transport.unwrap_or(Transport::Polling),
            base_mac: self.base_mac.unwrap_or_default(),
            server_address,
            sio_url_path: self
                .sio_url_path
                .unwrap_or_else(|| DEFAULT_SIO_URL_PATH.to_string()),
            nspc: self.nspc.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            alloc_auth_body_cb: self.alloc_auth_body_cb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_without_server_address() {
        let res = ClientConfigBuilder::new().build();
        assert!(matches!(res, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn build_applies_defaults() {
        let cfg = ClientConfigBuilder::new()
            .server_address("example.com:80")
            .build()
            .unwrap();
        assert_eq!(cfg.eio_version, DEFAULT_EIO_VERSION);
        assert_eq!(cfg.sio_url_path, DEFAULT_SIO_URL_PATH);
        assert_eq!(cfg.nspc, DEFAULT_NAMESPACE);
        assert_eq!(cfg.transport, Transport::Polling);
    }

    #[test]
    fn eio_version_zero_selects_default() {
        let cfg = ClientConfigBuilder::new()
            .server_address("example.com:80")
            .eio_version(0)
            .build()
            .unwrap();
        assert_eq!(cfg.eio_version, DEFAULT_EIO_VERSION);
    }
}
