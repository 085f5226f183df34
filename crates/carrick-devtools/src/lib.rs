//! Synchronous DevTools protocol client engine.
//!
//! This crate is the message pump underneath a browser-automation server:
//! it drives a JSON-over-WebSocket request/response-plus-events protocol
//! against a headless or attached browser.
//!
//! What it handles:
//!
//! - Outbound command serialization with monotonically increasing ids and
//!   optional session routing
//! - Correlating responses with outstanding commands while events keep
//!   flowing in between them
//! - Ordered listener dispatch for events, connection establishment, and
//!   command completion
//! - Reentrant sends: a listener callback may issue commands whose
//!   responses arrive before the response the outer caller is waiting on
//! - Detecting the "dialog opened" condition that blocks commands issued
//!   while a modal prompt is up
//! - Connect/reconnect lifecycle with a bootstrap handshake and a
//!   frontend-closer hook
//!
//! # Architecture
//!
//! - **`transport`**: the [`SyncWebSocket`] trait and the blocking
//!   tungstenite implementation. One transport per client, built by a
//!   factory on every connect attempt.
//! - **`inspector`**: wire envelope parsing -- one JSON text becomes an
//!   event or a command response.
//! - **`error`**: the [`DevToolsError`] taxonomy and the classifier that
//!   maps raw inspector error payloads onto it.
//! - **`client`**: the engine itself, [`DevToolsClientImpl`], plus the
//!   [`DevToolsClient`] surface handed to listeners.
//! - **`listener`**: the [`DevToolsEventListener`] collaborator trait.
//!
//! The engine is single-threaded and cooperative. It does not interpret
//! method-specific parameter or result schemas, it does not pipeline
//! commands, and it does not persist state across reconnects.

pub mod client;
pub mod error;
pub mod inspector;
pub mod listener;
pub mod timeout;
pub mod transport;

// Re-export key types at the crate root for convenience.
pub use client::{
    DevToolsClient, DevToolsClientImpl, FrontendCloser, ParserFn, DEFAULT_COMMAND_TIMEOUT,
};
pub use error::{parse_inspector_error, DevToolsError};
pub use inspector::{
    parse_inspector_message, CommandEnvelope, InspectorCommandResponse, InspectorEvent,
    InspectorMessage, ResponseOutcome,
};
pub use listener::DevToolsEventListener;
pub use timeout::Deadline;
pub use transport::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory, WebSocketTransport};
