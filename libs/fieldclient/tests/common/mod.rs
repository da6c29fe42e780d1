//! Common test utilities for fieldclient integration tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fieldclient::{Credential, CredentialSource};
use fieldwire::proto::{FieldSetNotice, FieldSetRequest, NOTICE_FIELD_ACTIVATED};
use fieldwire::{framing, DEFAULT_KEY};
use futures::{SinkExt, StreamExt};
use prost::Message as _;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;

/// Credential source that always succeeds without touching the network.
pub struct StubCredentials;

#[async_trait]
impl CredentialSource for StubCredentials {
    async fn ensure_credential(&self) -> fieldclient::session::Result<Credential> {
        Ok(Credential::new("stub", Utc::now() + Duration::hours(1)))
    }
}

/// A mock Tournament Manager: accepts the WebSocket, captures the handshake
/// frame, optionally greets with a field-activated notice, and records every
/// decoded field-set request.
pub struct MockTmServer {
    pub addr: SocketAddr,
    /// De-obfuscated handshake payloads, one per accepted connection.
    pub handshake_rx: UnboundedReceiver<Vec<u8>>,
    /// Decoded requests received after the handshake.
    pub requests_rx: UnboundedReceiver<FieldSetRequest>,
    shutdown: Arc<Notify>,
}

impl MockTmServer {
    /// Start the server. When `activate_field` is `Some(id)`, each connection
    /// is greeted with a field-activated notice right after its handshake;
    /// `None` models a server that rejected the handshake and stays silent.
    pub async fn start(activate_field: Option<u32>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let (handshake_tx, handshake_rx) = unbounded_channel();
        let (requests_tx, requests_rx) = unbounded_channel();

        let shutdown_accept = Arc::clone(&shutdown);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        tokio::spawn(Self::handle_connection(
                            stream,
                            activate_field,
                            handshake_tx.clone(),
                            requests_tx.clone(),
                            Arc::clone(&shutdown_accept),
                        ));
                    }
                    _ = shutdown_accept.notified() => break,
                }
            }
        });

        Self {
            addr,
            handshake_rx,
            requests_rx,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        activate_field: Option<u32>,
        handshake_tx: UnboundedSender<Vec<u8>>,
        requests_tx: UnboundedSender<FieldSetRequest>,
        shutdown: Arc<Notify>,
    ) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(_) => return,
        };
        let (mut write, mut read) = ws_stream.split();
        let mut saw_handshake = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(Ok(msg)) = msg else { break };
                    let raw = match msg {
                        Message::Binary(raw) => raw,
                        Message::Close(_) => break,
                        _ => continue,
                    };
                    let Ok(payload) = framing::deobfuscate(&raw) else { continue };

                    if !saw_handshake {
                        saw_handshake = true;
                        let _ = handshake_tx.send(payload);

                        if let Some(field_id) = activate_field {
                            let notice = FieldSetNotice {
                                id: NOTICE_FIELD_ACTIVATED,
                                field_id,
                            };
                            let mut bytes = Vec::new();
                            notice.encode(&mut bytes).unwrap();
                            let frame = framing::obfuscate(&bytes, DEFAULT_KEY);
                            if write.send(Message::Binary(frame)).await.is_err() {
                                break;
                            }
                        }
                        continue;
                    }

                    if let Ok(request) = FieldSetRequest::decode(payload.as_slice()) {
                        let _ = requests_tx.send(request);
                    }
                }
                _ = shutdown.notified() => break,
            }
        }
    }

    /// Close all connections and stop accepting.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockTmServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
