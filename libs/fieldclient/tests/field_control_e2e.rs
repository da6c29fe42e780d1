//! End-to-end tests against a mock Tournament Manager server: socket open,
//! handshake, readiness on first notice, and the command path down to the
//! decoded wire request.

mod common;

use common::{MockTmServer, StubCredentials};
use fieldclient::{ClientError, ConnectionState, FieldSetClient};
use fieldwire::proto::FieldControl;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn client_for(server: &MockTmServer) -> FieldSetClient {
    FieldSetClient::new(Arc::new(StubCredentials), server.addr.to_string(), 1)
        .with_handshake_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn connect_sends_handshake_and_becomes_ready_on_first_notice() {
    let mut server = MockTmServer::start(Some(3)).await;
    let client = client_for(&server);

    client.connect().await.expect("connect");
    assert_eq!(client.state(), ConnectionState::Ready);
    assert_eq!(client.current_field(), Some(3));

    let handshake = server.handshake_rx.recv().await.expect("handshake frame");
    assert_eq!(handshake.len(), 128);
    assert!(handshake[..7].iter().all(|&b| b == 0));
    assert!(handshake[11..].iter().all(|&b| b == 0));

    // The embedded timestamp must be fresh wall-clock time.
    let sent = u32::from_le_bytes(handshake[7..11].try_into().unwrap());
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as u32;
    assert!(now.abs_diff(sent) < 300);
}

#[tokio::test]
async fn commands_reach_the_wire_with_code_and_observed_field() {
    let mut server = MockTmServer::start(Some(2)).await;
    let client = client_for(&server);
    client.connect().await.expect("connect");

    client.start_match().await.expect("start");
    client.abort_match().await.expect("abort");

    let start = server.requests_rx.recv().await.expect("start request");
    let control = start.field_control.expect("field control payload");
    assert_eq!(control.id, FieldControl::StartMatch as i32);
    assert_eq!(control.field_id, 2);

    let abort = server.requests_rx.recv().await.expect("abort request");
    let control = abort.field_control.expect("field control payload");
    assert_eq!(control.id, FieldControl::Abort as i32);
    assert_eq!(control.field_id, 2);
}

#[tokio::test]
async fn silent_server_times_out_the_handshake() {
    // No greeting: indistinguishable from a handshake rejected for clock skew.
    let server = MockTmServer::start(None).await;
    let client = FieldSetClient::new(Arc::new(StubCredentials), server.addr.to_string(), 1)
        .with_handshake_timeout(Duration::from_millis(200));

    let err = client.connect().await.expect_err("must time out");
    assert!(matches!(err, ClientError::HandshakeTimeout(_)));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn server_close_drops_the_client_to_disconnected() {
    let mut server = MockTmServer::start(Some(1)).await;
    let client = client_for(&server);
    client.connect().await.expect("connect");
    assert_eq!(client.state(), ConnectionState::Ready);

    // Consume the handshake so the channel does not hold the connection open.
    let _ = server.handshake_rx.recv().await;
    server.shutdown();

    let mut waited = Duration::ZERO;
    while client.state() != ConnectionState::Disconnected && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // Commands after the close fail until connect() is called again.
    assert!(matches!(
        client.start_match().await,
        Err(ClientError::NotConnected)
    ));
}
