//! The polling transport: URL construction, the GET/POST request cycle, and the
//! response handling that turns an HTTP body into a [`Batch`].
//!
//! This module only knows how to perform one request at a time and hand back a
//! parsed batch; it has no notion of sessions, handshakes or poll loops — those live
//! in the `socketio-client` crate, which drives this one.

use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};

use crate::config::{random_token, MAX_RECV_BUFFER, TOKEN_LEN};
use crate::error::{Error, Result};
use crate::payload::{self, Batch};

/// A plain HTTP client over `http://` — no TLS connector is configured since this
/// transport never needs one.
pub type HttpClient = Client<HttpConnector>;

pub fn new_http_client() -> HttpClient {
    Client::new()
}

/// Build the handshake URL: `http://{address}{path}/?EIO={ver}&transport=polling&t={token}`.
pub fn handshake_url(address: &str, path: &str, eio_version: u8) -> String {
    let token = random_token(TOKEN_LEN);
    format!("http://{address}{path}/?EIO={eio_version}&transport=polling&t={token}")
}

/// Build the polling GET/POST URL, which is the handshake URL plus `&sid=`.
///
/// Returns `None` if no session id is available yet — the caller hasn't completed a
/// handshake.
pub fn polling_url(address: &str, path: &str, eio_version: u8, sid: Option<&str>) -> Option<String> {
    let sid = sid?;
    let base = handshake_url(address, path, eio_version);
    Some(format!("{base}&sid={sid}"))
}

/// Issue a GET against `url` and parse the response body into a batch.
pub async fn get(client: &HttpClient, url: &str, mac: Option<&str>) -> Result<Batch> {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(url)
        .header("Content-Type", "text/html")
        .header("Accept", "text/plain");
    if let Some(mac) = mac {
        builder = builder.header("MAC", mac);
    }
    let req = builder
        .body(Body::empty())
        .expect("request parts are all valid ASCII/known-good headers");
    perform(client, req).await
}

/// Issue a POST carrying `packet_bytes` as the body and parse the response into a batch.
pub async fn post(client: &HttpClient, url: &str, packet_bytes: Vec<u8>) -> Result<Batch> {
    let req = Request::builder()
        .method(Method::POST)
        .uri(url)
        .header("Content-Type", "text/plain;charset=UTF-8")
        .header("Accept", "*/*")
        .body(Body::from(packet_bytes))
        .expect("request parts are all valid ASCII/known-good headers");
    perform(client, req).await
}

async fn perform(client: &HttpClient, req: Request<Body>) -> Result<Batch> {
    let res = client.request(req).await?;
    if res.status() != StatusCode::OK {
        return Err(Error::HttpStatus(res.status()));
    }

    let content_length = res
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    let body = hyper::body::to_bytes(res.into_body()).await?;
    if body.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::debug!("polling response had an empty body");
        return Ok(Batch::new());
    }

    if let Some(len) = content_length {
        if len > body.len().max(MAX_RECV_BUFFER) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Content-Length {len} exceeds received body of {} bytes", body.len());
        }
    }

    payload::parse_batch(body.to_vec())
}
