//! Synchronous WebSocket transport abstraction.
//!
//! The engine owns exactly one transport at a time and talks to it through
//! the [`SyncWebSocket`] trait: connect, send one text frame, block on the
//! next frame up to a deadline, and a buffered-frame hint used to drain
//! without blocking. The transport does not interpret frames and knows
//! nothing about command ids.
//!
//! [`WebSocketTransport`] is the production implementation over a blocking
//! tungstenite socket.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};
use url::Url;

use crate::timeout::Deadline;

/// Outcome of one blocking receive.
#[derive(Debug)]
pub enum ReceiveResult {
    /// One text frame.
    Message(String),
    /// The deadline expired before a frame arrived.
    Timeout,
    /// The transport is (or became) disconnected.
    Disconnected,
}

/// Single-owner synchronous WebSocket surface consumed by the engine.
pub trait SyncWebSocket {
    fn is_connected(&self) -> bool;

    /// Connect to `url`. A `false` return leaves the transport disconnected.
    fn connect(&mut self, url: &Url) -> bool;

    /// Send one text frame. A `false` return signals transport failure.
    fn send(&mut self, text: &str) -> bool;

    /// Block until a frame arrives or `deadline` expires. Expiry is checked
    /// before anything else, so an expired deadline polls nothing.
    fn receive_next(&mut self, deadline: &Deadline) -> ReceiveResult;

    /// Whether at least one frame is already buffered locally.
    fn has_next(&mut self) -> bool;
}

/// Builds a fresh transport for each connect attempt.
pub type SyncWebSocketFactory = Box<dyn Fn() -> Box<dyn SyncWebSocket>>;

// ---------------------------------------------------------------------------
// WebSocketTransport
// ---------------------------------------------------------------------------

type WsSocket = WebSocket<MaybeTlsStream<TcpStream>>;

// Floor for read timeouts: set_read_timeout rejects a zero duration.
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Blocking tungstenite transport.
///
/// Deadlines are enforced with read timeouts on the underlying TCP stream;
/// DevTools endpoints are plain `ws://`, so the TLS arms are left alone.
/// Frames pulled while polling for `has_next` are queued and handed out by
/// the next `receive_next`.
pub struct WebSocketTransport {
    socket: Option<WsSocket>,
    buffered: VecDeque<String>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self {
            socket: None,
            buffered: VecDeque::new(),
        }
    }

    /// A factory producing one fresh `WebSocketTransport` per connect
    /// attempt, for [`DevToolsClientImpl::new`](crate::DevToolsClientImpl::new).
    pub fn factory() -> SyncWebSocketFactory {
        Box::new(|| Box::new(WebSocketTransport::new()))
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        if let Some(socket) = self.socket.as_mut() {
            if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
                let _ = stream.set_read_timeout(timeout.map(|t| t.max(MIN_READ_TIMEOUT)));
            }
        }
    }

    fn drop_connection(&mut self) {
        self.socket = None;
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncWebSocket for WebSocketTransport {
    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn connect(&mut self, url: &Url) -> bool {
        match tungstenite::connect(url.as_str()) {
            Ok((socket, _)) => {
                tracing::info!(url = %url, "websocket connection established");
                self.socket = Some(socket);
                self.buffered.clear();
                true
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "websocket connect failed");
                self.socket = None;
                false
            }
        }
    }

    fn send(&mut self, text: &str) -> bool {
        let Some(socket) = self.socket.as_mut() else {
            return false;
        };
        match socket.send(Message::Text(text.to_string())) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "websocket send failed");
                self.drop_connection();
                false
            }
        }
    }

    fn receive_next(&mut self, deadline: &Deadline) -> ReceiveResult {
        if deadline.is_expired() {
            return ReceiveResult::Timeout;
        }
        if let Some(text) = self.buffered.pop_front() {
            return ReceiveResult::Message(text);
        }
        if self.socket.is_none() {
            return ReceiveResult::Disconnected;
        }

        loop {
            if deadline.is_expired() {
                return ReceiveResult::Timeout;
            }
            self.set_read_timeout(deadline.remaining());
            let socket = self.socket.as_mut().expect("socket present in read loop");
            match socket.read() {
                Ok(Message::Text(text)) => return ReceiveResult::Message(text),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return ReceiveResult::Message(text),
                    Err(_) => continue,
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("websocket closed by remote");
                    self.drop_connection();
                    return ReceiveResult::Disconnected;
                }
                Ok(_) => continue,
                Err(tungstenite::Error::Io(e))
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "websocket read failed");
                    self.drop_connection();
                    return ReceiveResult::Disconnected;
                }
            }
        }
    }

    fn has_next(&mut self) -> bool {
        if !self.buffered.is_empty() {
            return true;
        }
        if self.socket.is_none() {
            return false;
        }

        self.set_read_timeout(Some(MIN_READ_TIMEOUT));
        loop {
            let socket = self.socket.as_mut().expect("socket present in poll loop");
            match socket.read() {
                Ok(Message::Text(text)) => {
                    self.buffered.push_back(text);
                    return true;
                }
                Ok(Message::Binary(bytes)) => {
                    if let Ok(text) = String::from_utf8(bytes) {
                        self.buffered.push_back(text);
                        return true;
                    }
                }
                Ok(Message::Close(_)) => {
                    self.drop_connection();
                    return false;
                }
                Ok(_) => continue,
                Err(tungstenite::Error::Io(e))
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    return false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "websocket poll failed");
                    self.drop_connection();
                    return false;
                }
            }
        }
    }
}
