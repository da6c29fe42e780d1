//! Connection manager for a single field set.
//!
//! Owns the live socket and drives the open/handshake/send/receive lifecycle:
//! `connect()` obtains a credential, dials `ws://<addr>/fieldsets/<id>` with
//! the session cookie attached, sends the obfuscated 128-byte handshake, and
//! treats the first decodable notice as the server's acceptance. Inbound
//! notices keep the active-field id current; outbound commands require the
//! connection to be `Ready` and a field id to have been observed.
//!
//! Reconnection is deliberately not automatic: any socket-level failure drops
//! the client back to `Disconnected` and the caller re-invokes `connect()`,
//! keeping failure surfaces observable.

use crate::error::{ClientError, Result};
use crate::session::{Credential, CredentialSource};
use crate::state::{AtomicConnectionState, ConnectionState};
use crossbeam_channel::{unbounded, Receiver, Sender};
use fieldwire::proto::{self, FieldControl, FieldSetNotice, FieldSetRequest};
use fieldwire::{framing, handshake};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{http, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Default bounded wait for the server's first notice after the handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Events surfaced to the embedding application.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Socket open, handshake sent.
    Connected,
    /// First notice received; commands may now be sent.
    Ready,
    /// Socket closed or failed; `connect()` must be called again.
    Disconnected,
    /// The server announced the currently active field.
    FieldActivated(u32),
    /// Any decoded inbound notice, in arrival order.
    Notice(FieldSetNotice),
    /// An inbound frame failed to decode; the connection stays open.
    DecodeError(String),
}

/// Client for one field-set connection.
pub struct FieldSetClient {
    session: Arc<dyn CredentialSource>,
    address: String,
    field_set_id: u32,
    handshake_timeout: Duration,
    state: Arc<AtomicConnectionState>,
    /// Latest observed active field. Written only by the inbound task, read
    /// by the command path.
    current_field: Arc<RwLock<Option<u32>>>,
    /// Write half of the socket; `None` whenever disconnected.
    sink: Arc<Mutex<Option<WsSink>>>,
    /// Bumped on every connect/teardown so a reader task from an older
    /// connection cannot clobber the state of a newer one.
    epoch: Arc<AtomicU64>,
    event_tx: Sender<ClientEvent>,
    event_rx: Receiver<ClientEvent>,
}

impl FieldSetClient {
    pub fn new(
        session: Arc<dyn CredentialSource>,
        address: impl Into<String>,
        field_set_id: u32,
    ) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            session,
            address: address.into(),
            field_set_id,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            state: Arc::new(AtomicConnectionState::default()),
            current_field: Arc::new(RwLock::new(None)),
            sink: Arc::new(Mutex::new(None)),
            epoch: Arc::new(AtomicU64::new(0)),
            event_tx,
            event_rx,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Latest observed active field id, if any notice has carried one.
    pub fn current_field(&self) -> Option<u32> {
        *self.current_field.read()
    }

    /// Event stream receiver; clones share the same channel.
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.event_rx.clone()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Establish the connection. Idempotent: when already connecting or
    /// connected this returns without side effects. On any failure the state
    /// is rolled back to `Disconnected` and the error surfaces here.
    pub async fn connect(&self) -> Result<()> {
        if !self.state.transition(
            ConnectionState::Disconnected,
            ConnectionState::Authenticating,
        ) {
            debug!("connect() ignored, state is {:?}", self.state.get());
            return Ok(());
        }

        let my_epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;

        let credential = match self.session.ensure_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                self.state.set(ConnectionState::Disconnected);
                return Err(ClientError::Authentication(e));
            }
        };

        self.state.set(ConnectionState::Connecting);
        if let Err(e) = self.dial(&credential, my_epoch).await {
            self.teardown().await;
            return Err(e);
        }
        Ok(())
    }

    async fn dial(&self, credential: &Credential, my_epoch: u64) -> Result<()> {
        let url = format!("ws://{}/fieldsets/{}", self.address, self.field_set_id);
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::WebSocket(e.to_string()))?;
        let cookie = credential
            .cookie_header()
            .parse::<http::HeaderValue>()
            .map_err(|e| ClientError::WebSocket(format!("invalid cookie header: {e}")))?;
        request.headers_mut().insert(http::header::COOKIE, cookie);

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))?;
        info!("WebSocket connected to {}", url);
        let _ = self.event_tx.send(ClientEvent::Connected);

        let (mut sink, source) = stream.split();

        // Wall-clock time captured at send; the server rejects timestamps
        // more than 300 s off its own clock, silently.
        let hs = handshake::build_handshake(SystemTime::now());
        sink.send(Message::Binary(framing::obfuscate(&hs, framing::DEFAULT_KEY)))
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))?;
        self.state.set(ConnectionState::HandshakePending);
        debug!("Handshake sent, waiting for first notice");

        *self.sink.lock().await = Some(sink);

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(read_loop(
            source,
            my_epoch,
            Arc::clone(&self.epoch),
            Arc::clone(&self.state),
            Arc::clone(&self.current_field),
            Arc::clone(&self.sink),
            self.event_tx.clone(),
            ready_tx,
        ));

        match tokio::time::timeout(self.handshake_timeout, ready_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ClientError::WebSocket(
                "connection closed before first notice".into(),
            )),
            Err(_) => Err(ClientError::HandshakeTimeout(self.handshake_timeout)),
        }
    }

    /// Close the socket, if open, and return to `Disconnected`.
    pub async fn disconnect(&self) {
        self.teardown().await;
        let _ = self.event_tx.send(ClientEvent::Disconnected);
        info!("Disconnected from field set {}", self.field_set_id);
    }

    async fn teardown(&self) {
        // Orphan any reader task belonging to this connection.
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        self.state.set(ConnectionState::Disconnected);
    }

    /// Encode, obfuscate, and write a request. Requires `Ready`.
    pub async fn send(&self, request: &FieldSetRequest) -> Result<()> {
        match self.state.get() {
            ConnectionState::Ready => {}
            ConnectionState::Disconnected => return Err(ClientError::NotConnected),
            other => return Err(ClientError::InvalidState(other)),
        }

        let frame = framing::obfuscate(&proto::encode_request(request), framing::DEFAULT_KEY);

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(ClientError::NotConnected)?;
        if let Err(e) = sink.send(Message::Binary(frame)).await {
            // A failed write means the socket is gone.
            guard.take();
            self.state.set(ConnectionState::Disconnected);
            let _ = self.event_tx.send(ClientEvent::Disconnected);
            return Err(ClientError::WebSocket(e.to_string()));
        }
        Ok(())
    }

    pub async fn start_match(&self) -> Result<()> {
        self.field_control(FieldControl::StartMatch).await
    }

    pub async fn end_early(&self) -> Result<()> {
        self.field_control(FieldControl::EndEarly).await
    }

    pub async fn abort_match(&self) -> Result<()> {
        self.field_control(FieldControl::Abort).await
    }

    pub async fn reset_timer(&self) -> Result<()> {
        self.field_control(FieldControl::ResetTimer).await
    }

    async fn field_control(&self, op: FieldControl) -> Result<()> {
        match self.state.get() {
            ConnectionState::Ready => {}
            ConnectionState::Disconnected => return Err(ClientError::NotConnected),
            other => return Err(ClientError::InvalidState(other)),
        }

        // Never substitute a sentinel: without an observed field there is no
        // meaningful target for the command.
        let field_id = (*self.current_field.read()).ok_or(ClientError::NoActiveField)?;

        info!("Sending {:?} for field {}", op, field_id);
        self.send(&FieldSetRequest::field_control(op, field_id)).await
    }
}

#[allow(clippy::too_many_arguments)]
async fn read_loop(
    mut source: WsSource,
    my_epoch: u64,
    epoch: Arc<AtomicU64>,
    state: Arc<AtomicConnectionState>,
    current_field: Arc<RwLock<Option<u32>>>,
    sink: Arc<Mutex<Option<WsSink>>>,
    event_tx: Sender<ClientEvent>,
    ready_tx: oneshot::Sender<()>,
) {
    let mut ready_tx = Some(ready_tx);

    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Binary(raw)) => {
                handle_frame(&raw, &state, &current_field, &event_tx, &mut ready_tx);
            }
            Ok(Message::Close(_)) => {
                debug!("Server closed the connection");
                break;
            }
            // The protocol carries no text or ping traffic.
            Ok(_) => {}
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    // A reader from a torn-down connection must not clobber a newer one.
    if epoch.load(Ordering::Acquire) == my_epoch {
        sink.lock().await.take();
        state.set(ConnectionState::Disconnected);
        let _ = event_tx.send(ClientEvent::Disconnected);
        info!("WebSocket disconnected");
    }
}

/// Handle one inbound frame. Decode failures are reported and dropped; they
/// never change state or close the connection.
fn handle_frame(
    raw: &[u8],
    state: &AtomicConnectionState,
    current_field: &RwLock<Option<u32>>,
    event_tx: &Sender<ClientEvent>,
    ready_tx: &mut Option<oneshot::Sender<()>>,
) {
    let payload = match framing::deobfuscate(raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Dropping malformed frame: {}", e);
            let _ = event_tx.send(ClientEvent::DecodeError(e.to_string()));
            return;
        }
    };

    let notice = match proto::decode_notice(&payload) {
        Ok(notice) => notice,
        Err(e) => {
            warn!("Dropping undecodable notice: {}", e);
            let _ = event_tx.send(ClientEvent::DecodeError(e.to_string()));
            return;
        }
    };

    // Any valid notice doubles as the handshake acknowledgment.
    if state.transition(ConnectionState::HandshakePending, ConnectionState::Ready) {
        info!("First notice received, field set ready");
        if let Some(tx) = ready_tx.take() {
            let _ = tx.send(());
        }
        let _ = event_tx.send(ClientEvent::Ready);
    }

    if notice.id == proto::NOTICE_FIELD_ACTIVATED {
        *current_field.write() = Some(notice.field_id);
        debug!("Active field is now {}", notice.field_id);
        let _ = event_tx.send(ClientEvent::FieldActivated(notice.field_id));
    }

    let _ = event_tx.send(ClientEvent::Notice(notice));
}
