//! The DevTools protocol client engine.
//!
//! A [`DevToolsClientImpl`] owns one synchronous transport and pumps it on
//! the caller's thread: outbound commands get monotonically increasing ids,
//! inbound frames are routed to command slots or dispatched to listeners,
//! and listener callbacks may reenter the client to send further commands
//! while an outer send is still waiting for its own response.
//!
//! Reentrancy is the load-bearing part. Ids are issued in order but
//! responses arrive in any order, so every response is stored into its slot
//! regardless of which stack frame is waiting; a waiter returns as soon as
//! its own slot leaves the pending state. Listener notification for a frame
//! is resumed at the top of every pump call, so a listener that pumps
//! nested frames cannot starve its siblings of a notification they are owed.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{parse_inspector_error, DevToolsError};
use crate::inspector::{
    parse_inspector_message, CommandEnvelope, InspectorCommandResponse, InspectorEvent,
    InspectorMessage, ResponseOutcome,
};
use crate::listener::DevToolsEventListener;
use crate::timeout::Deadline;
use crate::transport::{ReceiveResult, SyncWebSocket, SyncWebSocketFactory};

/// Default deadline for awaited commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const DIALOG_OPENING_EVENT: &str = "Page.javascriptDialogOpening";
const DIALOG_CLOSED_EVENT: &str = "Page.javascriptDialogClosed";

// Priming script installed on every new document by the bootstrap handshake.
const NEW_DOCUMENT_SCRIPT: &str = "(function () {}) ();";

/// Parses one inbound frame. Replaceable for tests; the second argument is
/// the id currently being awaited, for diagnostics.
pub type ParserFn =
    Rc<dyn Fn(&dyn DevToolsClient, &str, Option<u64>) -> Result<InspectorMessage, DevToolsError>>;

/// Invoked before reconnecting after a connection drop, so a higher layer
/// can tear down frontend state. A non-ok return aborts the reconnect.
pub type FrontendCloser = Box<dyn Fn() -> Result<(), DevToolsError>>;

// ---------------------------------------------------------------------------
// DevToolsClient
// ---------------------------------------------------------------------------

/// The client surface exposed to callers, listeners, and layered managers.
pub trait DevToolsClient {
    /// Opaque client id, for logs and listener bookkeeping.
    fn id(&self) -> &str;

    /// Session routing key added to every envelope; empty for root clients.
    fn session_id(&self) -> &str;

    /// The id the next command will be assigned.
    fn next_message_id(&self) -> u64;

    /// Connect if not already connected. Idempotent while the connection
    /// holds. On a first connect or a reconnect this performs the bootstrap
    /// handshake and fires `on_connected` across listeners in registration
    /// order; on a reconnect the frontend closer runs first.
    fn connect_if_necessary(&self) -> Result<(), DevToolsError>;

    /// Register a listener. When the client is already connected, the
    /// listener's `on_connected` fires on the next pump cycle, before any
    /// event it would otherwise see.
    fn add_listener(&self, listener: Rc<dyn DevToolsEventListener>);

    /// Pump inbound frames until `predicate` reports true or the deadline
    /// expires. The predicate is consulted whenever no frame is buffered; a
    /// predicate error is returned as-is. A command response that matches
    /// no outstanding command fails the drain with an unknown error.
    fn handle_events_until(
        &self,
        predicate: &mut dyn FnMut() -> Result<bool, DevToolsError>,
        timeout: Duration,
    ) -> Result<(), DevToolsError>;

    /// Drain every frame the transport has already buffered.
    fn handle_received_events(&self) -> Result<(), DevToolsError>;

    /// Send a command and wait for it to complete, discarding the result.
    fn send_command(&self, method: &str, params: Value) -> Result<(), DevToolsError>;

    /// Send a command, wait for it to complete, and return its result.
    fn send_command_and_get_result(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, DevToolsError>;

    /// Send a command and return as soon as it is on the wire. No waiter is
    /// allocated; the response is absorbed when it arrives.
    fn send_command_and_ignore_response(
        &self,
        method: &str,
        params: Value,
    ) -> Result<(), DevToolsError>;
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandHandling {
    /// A caller blocks until the slot leaves the pending state.
    AwaitResult,
    /// No waiter; the slot absorbs the response and is dropped.
    IgnoreResult,
}

#[derive(Debug)]
enum SlotState {
    Pending,
    Fulfilled(Value),
    Failed(DevToolsError),
    /// Abandoned because a dialog opened; absorbs a late response, if any.
    BlockedByDialog,
}

#[derive(Debug)]
struct CommandSlot {
    method: String,
    handling: CommandHandling,
    state: SlotState,
}

struct ListenerEntry {
    listener: Rc<dyn DevToolsEventListener>,
    connected_fired: Cell<bool>,
}

/// An event mid-dispatch. Remaining listeners are notified either by the
/// dispatching frame or, if a listener pumps nested frames, at the top of
/// the next pump call.
struct PendingEvent {
    method: String,
    params: Value,
    remaining: VecDeque<Rc<ListenerEntry>>,
    first_error: Option<DevToolsError>,
}

/// A successful command response mid-notification, same resumption rules
/// as [`PendingEvent`].
struct PendingCommandNotice {
    method: String,
    result: Value,
    deadline: Deadline,
    remaining: VecDeque<Rc<ListenerEntry>>,
    first_error: Option<DevToolsError>,
}

// ---------------------------------------------------------------------------
// DevToolsClientImpl
// ---------------------------------------------------------------------------

/// The WebSocket-backed protocol client engine.
///
/// Single-threaded and cooperative: the pump runs on the caller's thread,
/// listener callbacks run synchronously on it, and the only suspension
/// points are the transport's bounded receives. State lives behind
/// `Cell`/`RefCell` so callbacks can reenter the send operations through
/// `&self`; no borrow is held across a receive, a parse, or a callback.
pub struct DevToolsClientImpl {
    client_id: String,
    session_id: String,
    url: Url,
    factory: SyncWebSocketFactory,
    socket: RefCell<Box<dyn SyncWebSocket>>,
    connected: Cell<bool>,
    closer_armed: Cell<bool>,
    frontend_closer: RefCell<Option<FrontendCloser>>,
    parser: RefCell<ParserFn>,
    next_id: Cell<u64>,
    commands: RefCell<HashMap<u64, CommandSlot>>,
    listeners: RefCell<Vec<Rc<ListenerEntry>>>,
    pending_event: RefCell<Option<PendingEvent>>,
    pending_command_notice: RefCell<Option<PendingCommandNotice>>,
    dialog_open: Cell<bool>,
    dialog_exempt_id: Cell<u64>,
    pump_depth: Cell<usize>,
    command_timeout: Cell<Duration>,
}

impl DevToolsClientImpl {
    /// Create a disconnected client. `session_id` may be empty; when it is
    /// not, it is added to every outbound envelope and inbound frames for
    /// other sessions are ignored.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        url: Url,
        factory: SyncWebSocketFactory,
    ) -> Self {
        let socket = factory();
        Self {
            client_id: id.into(),
            session_id: session_id.into(),
            url,
            factory,
            socket: RefCell::new(socket),
            connected: Cell::new(false),
            closer_armed: Cell::new(false),
            frontend_closer: RefCell::new(None),
            parser: RefCell::new(Rc::new(|_client, text, awaited| {
                parse_inspector_message(text, awaited)
            })),
            next_id: Cell::new(1),
            commands: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
            pending_event: RefCell::new(None),
            pending_command_notice: RefCell::new(None),
            dialog_open: Cell::new(false),
            dialog_exempt_id: Cell::new(0),
            pump_depth: Cell::new(0),
            command_timeout: Cell::new(DEFAULT_COMMAND_TIMEOUT),
        }
    }

    /// Install the hook invoked before a reconnect. Runs at most once per
    /// connection drop.
    pub fn set_frontend_closer<F>(&self, closer: F)
    where
        F: Fn() -> Result<(), DevToolsError> + 'static,
    {
        *self.frontend_closer.borrow_mut() = Some(Box::new(closer));
    }

    /// Replace the envelope parser. Test seam: injected parsers may reenter
    /// the client through the handle they are passed.
    pub fn set_parser_for_testing<F>(&self, parser: F)
    where
        F: Fn(&dyn DevToolsClient, &str, Option<u64>) -> Result<InspectorMessage, DevToolsError>
            + 'static,
    {
        *self.parser.borrow_mut() = Rc::new(parser);
    }

    /// Override the default deadline used by the untimed send operations.
    pub fn set_command_timeout(&self, timeout: Duration) {
        self.command_timeout.set(timeout);
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    fn connect_internal(&self) -> Result<(), DevToolsError> {
        if self.pump_depth.get() > 0 {
            return Err(DevToolsError::Unknown(
                "cannot connect when nested".to_string(),
            ));
        }
        if self.connected.get() && self.socket.borrow().is_connected() {
            return Ok(());
        }

        if self.closer_armed.get() {
            let closer = self.frontend_closer.borrow_mut().take();
            if let Some(closer) = closer {
                let result = closer();
                let mut slot = self.frontend_closer.borrow_mut();
                if slot.is_none() {
                    *slot = Some(closer);
                }
                drop(slot);
                result?;
            }
            self.closer_armed.set(false);
        }

        *self.socket.borrow_mut() = (self.factory)();
        if !self.socket.borrow_mut().connect(&self.url) {
            self.connected.set(false);
            return Err(DevToolsError::Disconnected(
                "unable to connect to browser".to_string(),
            ));
        }
        tracing::info!(client = %self.client_id, url = %self.url, "devtools client connected");

        self.connected.set(true);
        self.dialog_open.set(false);
        self.commands.borrow_mut().clear();
        *self.pending_event.borrow_mut() = None;
        *self.pending_command_notice.borrow_mut() = None;
        for entry in self.listeners.borrow().iter() {
            entry.connected_fired.set(false);
        }

        // Bootstrap handshake: put the endpoint into a known state. Only
        // the sends are awaited; the responses drain on later pump cycles.
        self.send_command_internal(
            "Page.addScriptToEvaluateOnNewDocument",
            serde_json::json!({ "source": NEW_DOCUMENT_SCRIPT }),
            CommandHandling::IgnoreResult,
            self.command_timeout.get(),
        )?;
        self.send_command_internal(
            "Runtime.evaluate",
            serde_json::json!({ "expression": "1" }),
            CommandHandling::IgnoreResult,
            self.command_timeout.get(),
        )?;

        self.notify_connected_listeners()
    }

    fn mark_disconnected(&self) {
        if self.connected.get() {
            self.connected.set(false);
            self.closer_armed.set(true);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.get() && self.socket.borrow().is_connected()
    }

    // -----------------------------------------------------------------------
    // Public pump operations
    // -----------------------------------------------------------------------

    /// Send a command with an explicit deadline and return its result.
    pub fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, DevToolsError> {
        self.send_command_internal(method, params, CommandHandling::AwaitResult, timeout)
    }

    fn drain_until(
        &self,
        predicate: &mut dyn FnMut() -> Result<bool, DevToolsError>,
        deadline: &Deadline,
    ) -> Result<(), DevToolsError> {
        if !self.is_connected() {
            return Err(DevToolsError::Disconnected(
                "not connected to DevTools".to_string(),
            ));
        }
        loop {
            if !self.socket.borrow_mut().has_next() {
                if predicate()? {
                    return Ok(());
                }
                if deadline.is_expired() {
                    return Err(DevToolsError::Timeout(
                        "timed out waiting for event".to_string(),
                    ));
                }
            }
            self.pump(None, deadline)?;
        }
    }

    // -----------------------------------------------------------------------
    // Send path
    // -----------------------------------------------------------------------

    fn send_command_internal(
        &self,
        method: &str,
        params: Value,
        handling: CommandHandling,
        timeout: Duration,
    ) -> Result<Value, DevToolsError> {
        if !self.is_connected() {
            return Err(DevToolsError::Disconnected(
                "not connected to DevTools".to_string(),
            ));
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let session_id = (!self.session_id.is_empty()).then_some(self.session_id.as_str());
        let envelope = CommandEnvelope {
            id,
            method,
            params: &params,
            session_id,
        };
        let text = serde_json::to_string(&envelope)
            .map_err(|e| DevToolsError::Unknown(format!("failed to serialize command: {e}")))?;

        self.commands.borrow_mut().insert(
            id,
            CommandSlot {
                method: method.to_string(),
                handling,
                state: SlotState::Pending,
            },
        );

        tracing::debug!(client = %self.client_id, id, method, "sending command");
        if !self.socket.borrow_mut().send(&text) {
            self.commands.borrow_mut().remove(&id);
            self.mark_disconnected();
            return Err(DevToolsError::Disconnected(
                "unable to send message to browser".to_string(),
            ));
        }

        if handling == CommandHandling::IgnoreResult {
            return Ok(Value::Null);
        }

        // An open dialog blocks every command issued after the latch; the
        // slot stays behind to absorb a response should one ever arrive.
        if self.dialog_open.get() && id > self.dialog_exempt_id.get() {
            if let Some(slot) = self.commands.borrow_mut().get_mut(&id) {
                slot.state = SlotState::BlockedByDialog;
            }
            return Err(DevToolsError::UnexpectedAlertOpen);
        }

        let deadline = Deadline::new(timeout);
        self.await_response(id, &deadline)
    }

    fn await_response(&self, id: u64, deadline: &Deadline) -> Result<Value, DevToolsError> {
        loop {
            enum Progress {
                Pending,
                Ready,
                Blocked,
            }
            let progress = {
                let commands = self.commands.borrow();
                match commands.get(&id).map(|slot| &slot.state) {
                    Some(SlotState::Pending) => Progress::Pending,
                    Some(SlotState::BlockedByDialog) => Progress::Blocked,
                    Some(_) => Progress::Ready,
                    None => {
                        return Err(DevToolsError::Unknown(format!(
                            "command slot for id {id} vanished"
                        )))
                    }
                }
            };

            match progress {
                Progress::Blocked => return Err(DevToolsError::UnexpectedAlertOpen),
                Progress::Ready => {
                    let slot = self
                        .commands
                        .borrow_mut()
                        .remove(&id)
                        .expect("slot present");
                    return match slot.state {
                        SlotState::Fulfilled(value) => Ok(value),
                        SlotState::Failed(error) => Err(error),
                        _ => unreachable!("ready slot is terminal"),
                    };
                }
                Progress::Pending => {}
            }

            if let Err(error) = self.pump(Some(id), deadline) {
                let terminal = {
                    let commands = self.commands.borrow();
                    matches!(
                        commands.get(&id).map(|slot| &slot.state),
                        Some(SlotState::Fulfilled(_)) | Some(SlotState::Failed(_))
                    )
                };
                if terminal {
                    // The outcome arrived on the same pump call that
                    // failed; the failure wins, the slot is dropped.
                    self.commands.borrow_mut().remove(&id);
                } else if matches!(
                    self.commands.borrow().get(&id).map(|slot| &slot.state),
                    Some(SlotState::BlockedByDialog)
                ) {
                    return Err(DevToolsError::UnexpectedAlertOpen);
                }
                // On a timeout the pending slot stays put: a late response
                // completes it silently and the table is cleared on the
                // next connect.
                return Err(error);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pump
    // -----------------------------------------------------------------------

    fn pump(&self, awaited: Option<u64>, deadline: &Deadline) -> Result<(), DevToolsError> {
        self.pump_depth.set(self.pump_depth.get() + 1);
        let result = self.process_next_message(awaited, deadline);
        self.pump_depth.set(self.pump_depth.get() - 1);
        result
    }

    /// Pull exactly one frame and route it. Before pulling, finish any
    /// listener notification an enclosing frame still owes.
    fn process_next_message(
        &self,
        awaited: Option<u64>,
        deadline: &Deadline,
    ) -> Result<(), DevToolsError> {
        self.flush_pending_command_notice()?;
        self.flush_pending_event()?;

        let received = self.socket.borrow_mut().receive_next(deadline);
        let text = match received {
            ReceiveResult::Disconnected => {
                self.mark_disconnected();
                return Err(DevToolsError::Disconnected(
                    "lost connection to browser".to_string(),
                ));
            }
            ReceiveResult::Timeout => {
                return Err(DevToolsError::Timeout(
                    "no message received before deadline".to_string(),
                ));
            }
            ReceiveResult::Message(text) => text,
        };

        let parser = Rc::clone(&*self.parser.borrow());
        let message = (*parser)(self, &text, awaited)?;

        let frame_session = match &message {
            InspectorMessage::Event(event) => event.session_id.as_str(),
            InspectorMessage::CommandResponse(response) => response.session_id.as_str(),
        };
        if !frame_session.is_empty() && frame_session != self.session_id {
            tracing::debug!(
                client = %self.client_id,
                frame_session,
                "ignoring frame for another session"
            );
            return Ok(());
        }

        match message {
            InspectorMessage::Event(event) => self.process_event(event, awaited),
            InspectorMessage::CommandResponse(response) => {
                self.process_command_response(response, awaited, deadline)
            }
        }
    }

    fn process_event(
        &self,
        event: InspectorEvent,
        awaited: Option<u64>,
    ) -> Result<(), DevToolsError> {
        if event.method == DIALOG_OPENING_EVENT {
            // Latch before delivering: the command at the top of the call
            // stack keeps its claim to a response, everything younger is
            // blocked, and so is everything issued until the dialog closes.
            let exempt = awaited.unwrap_or(0);
            self.dialog_open.set(true);
            self.dialog_exempt_id.set(exempt);
            let mut commands = self.commands.borrow_mut();
            for (id, slot) in commands.iter_mut() {
                if *id > exempt
                    && slot.handling == CommandHandling::AwaitResult
                    && matches!(slot.state, SlotState::Pending)
                {
                    slot.state = SlotState::BlockedByDialog;
                }
            }
            drop(commands);
            tracing::debug!(
                client = %self.client_id,
                exempt_up_to = exempt,
                "dialog opening; blocking younger commands"
            );
        } else if event.method == DIALOG_CLOSED_EVENT {
            self.dialog_open.set(false);
        }

        self.notify_connected_listeners()?;

        let remaining: VecDeque<Rc<ListenerEntry>> =
            self.listeners.borrow().iter().cloned().collect();
        *self.pending_event.borrow_mut() = Some(PendingEvent {
            method: event.method,
            params: event.params,
            remaining,
            first_error: None,
        });
        self.flush_pending_event()
    }

    fn process_command_response(
        &self,
        response: InspectorCommandResponse,
        _awaited: Option<u64>,
        deadline: &Deadline,
    ) -> Result<(), DevToolsError> {
        let id = response.id;

        enum SlotView {
            Missing,
            Abandoned,
            Live { method: String },
        }
        let view = {
            let commands = self.commands.borrow();
            match commands.get(&id) {
                None => SlotView::Missing,
                Some(slot) => match slot.state {
                    SlotState::BlockedByDialog => SlotView::Abandoned,
                    SlotState::Pending => SlotView::Live {
                        method: slot.method.clone(),
                    },
                    _ => SlotView::Missing,
                },
            }
        };

        let method = match view {
            SlotView::Missing => {
                return match response.outcome {
                    // A stale error for a command nobody remembers: the
                    // session that owned it is gone. Drop it and move on.
                    ResponseOutcome::Error(raw) => {
                        tracing::debug!(
                            client = %self.client_id,
                            id,
                            error = %raw,
                            "discarding error response for unknown command id"
                        );
                        Ok(())
                    }
                    ResponseOutcome::Result(_) => Err(DevToolsError::Unknown(format!(
                        "unexpected command response with id {id}"
                    ))),
                };
            }
            SlotView::Abandoned => {
                tracing::debug!(
                    client = %self.client_id,
                    id,
                    "absorbing late response for dialog-blocked command"
                );
                self.commands.borrow_mut().remove(&id);
                return Ok(());
            }
            SlotView::Live { method } => method,
        };

        let mut notify_result = Ok(());
        if let ResponseOutcome::Result(value) = &response.outcome {
            let remaining: VecDeque<Rc<ListenerEntry>> =
                self.listeners.borrow().iter().cloned().collect();
            *self.pending_command_notice.borrow_mut() = Some(PendingCommandNotice {
                method,
                result: value.clone(),
                deadline: *deadline,
                remaining,
                first_error: None,
            });
            notify_result = self.flush_pending_command_notice();
        }

        let mut commands = self.commands.borrow_mut();
        let absorb = commands
            .get(&id)
            .map(|slot| slot.handling == CommandHandling::IgnoreResult)
            .unwrap_or(false);
        if absorb {
            commands.remove(&id);
        } else if let Some(slot) = commands.get_mut(&id) {
            slot.state = match response.outcome {
                ResponseOutcome::Result(value) => SlotState::Fulfilled(value),
                ResponseOutcome::Error(raw) => SlotState::Failed(parse_inspector_error(&raw)),
            };
        }
        drop(commands);

        notify_result
    }

    // -----------------------------------------------------------------------
    // Listener notification
    // -----------------------------------------------------------------------

    /// Fire `on_connected` for every listener that has not seen it this
    /// connection epoch, in registration order. A callback error leaves the
    /// remaining listeners unnotified for a later cycle.
    fn notify_connected_listeners(&self) -> Result<(), DevToolsError> {
        loop {
            let next = self
                .listeners
                .borrow()
                .iter()
                .find(|entry| !entry.connected_fired.get())
                .cloned();
            let Some(entry) = next else {
                return Ok(());
            };
            entry.connected_fired.set(true);
            entry.listener.on_connected(self)?;
        }
    }

    fn flush_pending_event(&self) -> Result<(), DevToolsError> {
        loop {
            let step = {
                let mut guard = self.pending_event.borrow_mut();
                let Some(pending) = guard.as_mut() else {
                    return Ok(());
                };
                match pending.remaining.pop_front() {
                    Some(entry) => (entry, pending.method.clone(), pending.params.clone()),
                    None => {
                        let error = pending.first_error.take();
                        *guard = None;
                        return match error {
                            Some(e) => Err(e),
                            None => Ok(()),
                        };
                    }
                }
            };
            let (entry, method, params) = step;
            if let Err(error) = entry.listener.on_event(self, &method, &params) {
                let mut guard = self.pending_event.borrow_mut();
                match guard.as_mut() {
                    Some(pending) => {
                        if pending.first_error.is_none() {
                            pending.first_error = Some(error);
                        }
                    }
                    // A nested pump already finished this dispatch.
                    None => return Err(error),
                }
            }
        }
    }

    fn flush_pending_command_notice(&self) -> Result<(), DevToolsError> {
        loop {
            let step = {
                let mut guard = self.pending_command_notice.borrow_mut();
                let Some(pending) = guard.as_mut() else {
                    return Ok(());
                };
                match pending.remaining.pop_front() {
                    Some(entry) => (
                        entry,
                        pending.method.clone(),
                        pending.result.clone(),
                        pending.deadline,
                    ),
                    None => {
                        let error = pending.first_error.take();
                        *guard = None;
                        return match error {
                            Some(e) => Err(e),
                            None => Ok(()),
                        };
                    }
                }
            };
            let (entry, method, result, deadline) = step;
            if let Err(error) =
                entry
                    .listener
                    .on_command_success(self, &method, &result, &deadline)
            {
                let mut guard = self.pending_command_notice.borrow_mut();
                match guard.as_mut() {
                    Some(pending) => {
                        if pending.first_error.is_none() {
                            pending.first_error = Some(error);
                        }
                    }
                    None => return Err(error),
                }
            }
        }
    }
}

impl DevToolsClient for DevToolsClientImpl {
    fn id(&self) -> &str {
        &self.client_id
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn next_message_id(&self) -> u64 {
        self.next_id.get()
    }

    fn connect_if_necessary(&self) -> Result<(), DevToolsError> {
        self.connect_internal()
    }

    fn add_listener(&self, listener: Rc<dyn DevToolsEventListener>) {
        self.listeners.borrow_mut().push(Rc::new(ListenerEntry {
            listener,
            connected_fired: Cell::new(false),
        }));
    }

    fn handle_events_until(
        &self,
        predicate: &mut dyn FnMut() -> Result<bool, DevToolsError>,
        timeout: Duration,
    ) -> Result<(), DevToolsError> {
        self.drain_until(predicate, &Deadline::new(timeout))
    }

    fn handle_received_events(&self) -> Result<(), DevToolsError> {
        self.drain_until(&mut || Ok(true), &Deadline::unbounded())
    }

    fn send_command(&self, method: &str, params: Value) -> Result<(), DevToolsError> {
        self.send_command_internal(
            method,
            params,
            CommandHandling::AwaitResult,
            self.command_timeout.get(),
        )
        .map(|_| ())
    }

    fn send_command_and_get_result(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, DevToolsError> {
        self.send_command_internal(
            method,
            params,
            CommandHandling::AwaitResult,
            self.command_timeout.get(),
        )
    }

    fn send_command_and_ignore_response(
        &self,
        method: &str,
        params: Value,
    ) -> Result<(), DevToolsError> {
        self.send_command_internal(
            method,
            params,
            CommandHandling::IgnoreResult,
            self.command_timeout.get(),
        )
        .map(|_| ())
    }
}
