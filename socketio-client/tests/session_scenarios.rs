//! Integration tests covering the scenario walkthroughs: handshake, ping/pong,
//! multi-packet dispatch, server-initiated close, and the two send-path cases.
//!
//! Each test drives a [`support::MockServer`] that replies to requests in the exact
//! order they arrive, so the response list below doubles as a script of the expected
//! request sequence (handshake GET, connect POST, then whatever the scenario needs).

mod support;

use std::time::Duration;

use engineio_client::RECORD_SEPARATOR;
use serial_test::serial;
use socketio_client::{ClientConfigBuilder, EventKind};
use support::{http_ok, MockServer};

/// Wait for the next event of `kind` on `rx`, ignoring anything else, bailing out if
/// none shows up within a couple of seconds.
async fn expect_event(
    rx: &mut tokio::sync::broadcast::Receiver<socketio_client::SessionEvent>,
    kind: EventKind,
) -> socketio_client::SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = rx.recv().await.expect("event bus closed unexpectedly");
            if event.kind == kind {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}

fn open_packet_body(sid: &str, ping_interval: u32, ping_timeout: u32) -> Vec<u8> {
    format!(
        r#"0{{"sid":"{sid}","upgrades":[],"pingInterval":{ping_interval},"pingTimeout":{ping_timeout},"maxPayload":1000000}}"#
    )
    .into_bytes()
}

/// The registry is a process-wide static capped at `MAX_PARALLEL_SESSIONS`; every test
/// that calls `init` must free its slot again or later tests in this binary start
/// failing with `Error::Capacity`. `destroy` refuses while the poll loop is still
/// running, so wait for it to wind down first (each scenario's mock eventually runs out
/// of scripted responses, which tears the poll loop down on its own).
async fn cleanup(id: socketio_client::ClientId) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while socketio_client::is_connected(id).await.unwrap_or(false) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for polling to stop before cleanup");
    socketio_client::destroy(id)
        .await
        .expect("destroy should succeed once polling has stopped");
}

#[tokio::test]
#[serial]
async fn handshake_happy_path() {
    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;

    let guard = socketio_client::get_and_lock(id).await.unwrap();
    assert_eq!(guard.server_session_id(), Some("abc123"));
    assert_eq!(guard.ping_interval_ms(), Some(25000));
    assert_eq!(guard.ping_timeout_ms(), Some(20000));
    assert!(guard.is_polling_running());
    socketio_client::unlock(guard);

    let requests = mock.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].body, b"40");

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn auth_body_callback_is_sent_in_the_connect_packet() {
    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .alloc_auth_body_cb(|| r#"{"token":"xyz"}"#.to_string())
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;

    let requests = mock.requests();
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].body, br#"40{"token":"xyz"}"#);

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn malformed_handshake_response_posts_connect_error_with_received_packets() {
    // Two packets in the handshake GET's response body violates the "exactly one Open
    // packet" precondition; no Connect POST should ever be sent.
    let mut body = open_packet_body("abc123", 25000, 20000);
    body.push(RECORD_SEPARATOR);
    body.extend_from_slice(b"2");

    let mock = MockServer::start(vec![http_ok(&body)]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    let result = socketio_client::begin(id).await;
    assert!(matches!(result, Err(socketio_client::Error::Protocol(_))));

    let connect_error = expect_event(&mut rx, EventKind::ConnectError).await;
    let batch = connect_error
        .batch
        .expect("ConnectError should carry whatever packets were received");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].eio_kind, engineio_client::EioKind::Open);
    assert_eq!(batch[1].eio_kind, engineio_client::EioKind::Ping);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1, "no Connect POST should be sent after a malformed handshake");

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn ping_is_answered_with_pong_and_no_message_event() {
    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
        http_ok(b"2"),
        http_ok(b"ok"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;
    // The poll loop runs out of scripted responses right after the pong and tears
    // down; waiting for that keeps the assertions below race-free.
    expect_event(&mut rx, EventKind::Disconnected).await;

    let pong_post = mock
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.body == b"3")
        .expect("expected a POST with body \"3\" answering the ping");
    assert_eq!(pong_post.body, b"3");

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn multi_packet_response_dispatches_one_received_message_event() {
    let mut multi_body = b"2".to_vec();
    multi_body.push(RECORD_SEPARATOR);
    multi_body.extend_from_slice(br#"42["tick",{"n":1}]"#);

    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
        http_ok(&multi_body),
        http_ok(b"ok"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;

    let received = expect_event(&mut rx, EventKind::ReceivedMessage).await;
    assert_eq!(received.len(), 2);
    let batch = received.batch.expect("ReceivedMessage carries a batch");
    assert_eq!(batch[0].eio_kind, engineio_client::EioKind::Ping);
    assert_eq!(batch[1].eio_kind, engineio_client::EioKind::Message);
    assert_eq!(batch[1].json(), Some(r#"["tick",{"n":1}]"#));

    let pong_post = mock
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.body == b"3");
    assert!(pong_post.is_some(), "ping in the batch should still be answered");

    expect_event(&mut rx, EventKind::Disconnected).await;
    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn server_initiated_close_posts_disconnected() {
    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
        http_ok(b"1"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;
    let disconnected = expect_event(&mut rx, EventKind::Disconnected).await;
    assert!(disconnected.batch.is_none());

    let guard = socketio_client::get_and_lock(id).await.unwrap();
    assert!(!guard.is_polling_running());
    socketio_client::unlock(guard);

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn send_before_handshake_fails_and_makes_no_request() {
    let mock = MockServer::start(vec![]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();

    let result = socketio_client::send_string(id, "x", "{}").await;
    assert!(matches!(result, Err(socketio_client::Error::State(_))));
    assert!(mock.requests().is_empty());

    cleanup(id).await;
}

#[tokio::test]
#[serial]
async fn send_event_after_handshake_produces_expected_post_body() {
    let mock = MockServer::start(vec![
        http_ok(&open_packet_body("abc123", 25000, 20000)),
        http_ok(b"ok"),
        // The poll loop's first GET tears the session down cleanly so there is no
        // concurrent poll request racing the explicit send below.
        http_ok(b"1"),
        http_ok(b"ok"),
    ]);

    let config = ClientConfigBuilder::new()
        .server_address(&mock.address)
        .build()
        .unwrap();
    let id = socketio_client::init(config).await.unwrap();
    let mut rx = socketio_client::subscribe(id).await.unwrap();

    socketio_client::begin(id).await.unwrap();
    expect_event(&mut rx, EventKind::Connected).await;
    expect_event(&mut rx, EventKind::Disconnected).await;

    socketio_client::send_string(id, "light", r#"{"on":true}"#)
        .await
        .unwrap();

    let send_post = mock
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.body == br#"42["light",{"on":true}]"#);
    assert!(send_post.is_some(), "expected the event POST body to match exactly");

    cleanup(id).await;
}
