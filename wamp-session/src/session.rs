// Copyright © 2024 Nathaniel Hardesty
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the “Software”), to
// deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
// sell copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
// IN THE SOFTWARE.

//! ## SESSION
//! **Based on `semi_e37::generic::Client` and spec.md §4.3**
//!
//! The [Session] owns the conversation with a router: it allocates request
//! IDs, tracks in-flight requests in an "outbox" the way
//! `semi_e37::generic::Client` does (there keyed by `MessageID`, here by a
//! plain [Id]), and runs a single dispatch thread that both completes those
//! in-flight requests and routes inbound `EVENT`/`INVOCATION` messages to
//! user-supplied handlers.
//!
//! [Session]: Session

use crate::config::SessionConfig;
use crate::error::{
    CallError, ConnectError, JoinError, LeaveError, PeerError, ProvideError, PublishError, SubscribeError,
    UnprovideError, UnsubscribeError, WaitError,
};
use crate::types::{
    AuthenticateResponse, CallOptions, CallResult, Challenge, ChallengeHandler, Event, EventHandler, Invocation,
    Procedure, ProcedureOutcome, Registration, Subscription,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wamp_messages::{decode, encode, Id, Message, MessageType, Uri, Value};
use wamp_rawsocket::Transport;

/// ## ENDPOINT
/// **Based on spec.md §5 ("Polymorphic transports")**
///
/// Which rawsocket backing [Session::connect] should establish.
pub enum Endpoint<'a> {
    Tcp { addr: &'a str },
    Tls { host: &'a str, port: u16 },
    #[cfg(unix)]
    Unix { path: &'a Path },
}

/// ## SESSION STATE
/// **Based on spec.md §4.3.3**
#[derive(Clone)]
enum SessionState {
    Disconnected,
    Connected,
    Challenging,
    Established { session_id: Id, welcome_details: Value },
    Closing { session_id: Id, welcome_details: Value },
    Closed,
}

/// ## SESSION STATUS
/// **Based on spec.md §3 ("Session state")**
///
/// The coarse-grained state an embedder can observe via [Session::status].
/// Mirrors [SessionState] but drops the payload each variant carries
/// internally, since `session_id`/`welcome_details` are reached through
/// [Session::session_id]/[Session::welcome_details] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Challenging,
    Established,
    Closing,
    Closed,
}

impl From<&SessionState> for SessionStatus {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Disconnected => Self::Disconnected,
            SessionState::Connected => Self::Connecting,
            SessionState::Challenging => Self::Challenging,
            SessionState::Established { .. } => Self::Established,
            SessionState::Closing { .. } => Self::Closing,
            SessionState::Closed => Self::Closed,
        }
    }
}

fn empty_map() -> Value {
    Value::Map(vec![])
}

fn roles_details(config: &SessionConfig) -> Value {
    let role = |name: &str| (Value::from(name), empty_map());
    let mut details = vec![(
        Value::from("roles"),
        Value::Map(vec![
            role("caller"),
            role("callee"),
            role("publisher"),
            role("subscriber"),
        ]),
    )];
    if !config.authmethods.is_empty() {
        details.push((
            Value::from("authmethods"),
            Value::Array(config.authmethods.iter().cloned().map(Value::from).collect()),
        ));
    }
    if let Some(authid) = &config.authid {
        details.push((Value::from("authid"), Value::from(authid.clone())));
    }
    Value::Map(details)
}

/// ## SESSION
///
/// See the [module documentation][crate::session] for an overview.
pub struct Session {
    config: SessionConfig,
    transport: RwLock<Option<Arc<Transport>>>,
    state: RwLock<SessionState>,
    next_id: AtomicU64,
    leave_initiated: AtomicBool,
    pending_hello: Mutex<Option<oneshot::Sender<Message>>>,
    pending_goodbye: Mutex<Option<oneshot::Sender<Message>>>,
    pending: Mutex<HashMap<Id, oneshot::Sender<Message>>>,
    subscriptions: RwLock<HashMap<Id, Vec<EventHandler>>>,
    registrations: RwLock<HashMap<Id, Procedure>>,
    challenge_handler: RwLock<ChallengeHandler>,
}

impl Session {
    /// ### NEW SESSION
    ///
    /// Creates a [Session] in the disconnected state, ready for
    /// [connect][Session::connect]. The default [challenge handler][ChallengeHandler]
    /// rejects every `CHALLENGE`, per SUPPLEMENTED FEATURE 2.
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            transport: RwLock::new(None),
            state: RwLock::new(SessionState::Disconnected),
            next_id: AtomicU64::new(1),
            leave_initiated: AtomicBool::new(false),
            pending_hello: Mutex::new(None),
            pending_goodbye: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            registrations: RwLock::new(HashMap::new()),
            challenge_handler: RwLock::new(Box::new(|_challenge| {
                Err("no challenge handler installed".to_string())
            })),
        })
    }

    /// ### CONFIG
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// ### STATUS
    /// **Based on spec.md §3 ("Session state")**
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(&*self.state.read().unwrap())
    }

    /// ### SESSION ID
    /// **Based on spec.md §3: "session_id is defined iff state is
    /// ESTABLISHED or CLOSING"**
    pub fn session_id(&self) -> Option<Id> {
        match &*self.state.read().unwrap() {
            SessionState::Established { session_id, .. } | SessionState::Closing { session_id, .. } => Some(*session_id),
            _ => None,
        }
    }

    /// ### WELCOME DETAILS
    /// **Based on spec.md §3: "an opaque welcome details mapping ... retained
    /// for introspection"**
    pub fn welcome_details(&self) -> Option<Value> {
        match &*self.state.read().unwrap() {
            SessionState::Established { welcome_details, .. } | SessionState::Closing { welcome_details, .. } => {
                Some(welcome_details.clone())
            }
            _ => None,
        }
    }

    /// ### SET CHALLENGE HANDLER
    /// **Based on SUPPLEMENTED FEATURE 2**
    pub fn set_challenge_handler(&self, handler: ChallengeHandler) {
        *self.challenge_handler.write().unwrap() = handler;
    }

    /// ### CONNECT
    /// **Based on spec.md §4.3.1 ("start()") and SUPPLEMENTED FEATURE 1**
    ///
    /// Attaches a transport and performs the rawsocket handshake. Does not
    /// send `HELLO` — see [Session::join] for that.
    pub fn connect(self: &Arc<Self>, endpoint: Endpoint) -> Result<(), ConnectError> {
        {
            let state = self.state.read().unwrap();
            if !matches!(*state, SessionState::Disconnected) {
                return Err(ConnectError::AlreadyConnected);
            }
        }

        let (transport, inbound) = match endpoint {
            Endpoint::Tcp { addr } => {
                Transport::connect_tcp(addr, self.config.connect_timeout, self.config.max_frame_exponent)?
            }
            Endpoint::Tls { host, port } => {
                Transport::connect_tls(host, port, self.config.connect_timeout, self.config.max_frame_exponent)?
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => Transport::connect_unix(path, self.config.max_frame_exponent)?,
        };

        *self.transport.write().unwrap() = Some(Arc::new(transport));
        *self.state.write().unwrap() = SessionState::Connected;

        let clone = self.clone();
        thread::spawn(move || clone.dispatch(inbound));

        Ok(())
    }

    /// ### STOP
    /// **Based on spec.md §4.3.1 ("stop()")**
    ///
    /// Detaches the transport. Infallible: if already disconnected, this is
    /// a no-op.
    pub fn stop(self: &Arc<Self>) {
        self.sweep();
    }

    /// ### JOIN
    /// **Based on spec.md §4.3.1 ("join()") and §4.3.3**
    pub fn join(self: &Arc<Self>, realm: Option<String>) -> JoinHandle<Result<Id, JoinError>> {
        let clone = self.clone();
        thread::spawn(move || clone.join_blocking(realm))
    }

    fn join_blocking(self: &Arc<Self>, realm: Option<String>) -> Result<Id, JoinError> {
        {
            let state = self.state.read().unwrap();
            if !matches!(*state, SessionState::Connected) {
                return Err(JoinError::NotConnected);
            }
        }

        let realm = realm.unwrap_or_else(|| self.config.realm.clone());
        let message = Message::Hello { realm, details: roles_details(&self.config) };

        let receiver = {
            let mut slot = self.pending_hello.lock().unwrap();
            self.transmit(&message).map_err(|_| JoinError::Disconnect)?;
            *self.state.write().unwrap() = SessionState::Challenging;
            let (sender, receiver) = oneshot::channel();
            *slot = Some(sender);
            receiver
        };

        let reply = wait_for(receiver, self.config.join_timeout)?;
        match reply {
            Message::Welcome { session, details } => {
                *self.state.write().unwrap() = SessionState::Established { session_id: session, welcome_details: details };
                Ok(session)
            }
            Message::Abort { details, reason } => {
                self.sweep();
                Err(JoinError::Aborted { reason, details })
            }
            _ => Err(JoinError::Disconnect),
        }
    }

    /// ### LEAVE
    /// **Based on spec.md §4.3.1 ("leave()")**
    pub fn leave(self: &Arc<Self>, reason: Option<String>) -> JoinHandle<Result<Uri, LeaveError>> {
        let clone = self.clone();
        thread::spawn(move || clone.leave_blocking(reason))
    }

    fn leave_blocking(self: &Arc<Self>, reason: Option<String>) -> Result<Uri, LeaveError> {
        let (session_id, welcome_details) = match &*self.state.read().unwrap() {
            SessionState::Established { session_id, welcome_details } => (*session_id, welcome_details.clone()),
            _ => return Err(LeaveError::NotEstablished),
        };

        let local_reason = reason.unwrap_or_else(|| "wamp.close.close_normal".to_string());
        let message = Message::Goodbye { details: empty_map(), reason: local_reason.clone() };

        let receiver = {
            let mut slot = self.pending_goodbye.lock().unwrap();
            self.leave_initiated.store(true, Ordering::Release);
            self.transmit(&message).map_err(|_| LeaveError::Disconnect)?;
            *self.state.write().unwrap() = SessionState::Closing { session_id, welcome_details };
            let (sender, receiver) = oneshot::channel();
            *slot = Some(sender);
            receiver
        };

        match wait_for(receiver, self.config.request_timeout) {
            Ok(Message::Goodbye { reason, .. }) => {
                self.sweep();
                Ok(reason)
            }
            Ok(_) => {
                self.sweep();
                Err(LeaveError::Disconnect)
            }
            // spec.md §4.3.3 CLOSING: "timeout -> resolve leave future with
            // local reason; -> CLOSED" — unlike every other timeout, this one
            // is not an error: the local GOODBYE reason is returned as-is.
            Err(WaitError::Timeout) => {
                self.sweep();
                Ok(local_reason)
            }
            Err(WaitError::Disconnect) => Err(LeaveError::Disconnect),
        }
    }

    /// ### PUBLISH
    /// **Based on spec.md §4.3.1 ("publish()")**
    ///
    /// The no-ack form only (spec.md §1's non-goals exclude acknowledged
    /// publish): resolves as soon as the frame has been handed to the
    /// transport.
    pub fn publish(
        self: &Arc<Self>,
        topic: &str,
        args: Option<Value>,
        kwargs: Option<Value>,
        options: Value,
    ) -> Result<(), PublishError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(PublishError::NotEstablished);
        }
        let request = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = Message::Publish { request, options, topic: topic.to_string(), args, kwargs };
        self.transmit(&message)?;
        Ok(())
    }

    /// ### SUBSCRIBE
    /// **Based on spec.md §4.3.1 ("subscribe()")**
    pub fn subscribe(
        self: &Arc<Self>,
        topic: &str,
        handler: EventHandler,
        options: Value,
    ) -> JoinHandle<Result<Subscription, SubscribeError>> {
        let topic = topic.to_string();
        let clone = self.clone();
        thread::spawn(move || clone.subscribe_blocking(topic, handler, options))
    }

    fn subscribe_blocking(
        self: &Arc<Self>,
        topic: String,
        handler: EventHandler,
        options: Value,
    ) -> Result<Subscription, SubscribeError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(SubscribeError::NotEstablished);
        }
        let (id, receiver) = self
            .send_tracked(|request| Message::Subscribe { request, options, topic })
            .map_err(|_| SubscribeError::Disconnect)?;
        let reply = wait_for(receiver, self.config.request_timeout).map_err(|error| {
            self.pending.lock().unwrap().remove(&id);
            SubscribeError::from(error)
        })?;
        match reply {
            Message::Subscribed { subscription, .. } => {
                self.subscriptions.write().unwrap().entry(subscription).or_default().push(handler);
                Ok(Subscription(subscription))
            }
            Message::Error { error, args, kwargs, .. } => Err(SubscribeError::Rejected(PeerError { error, args, kwargs })),
            _ => Err(SubscribeError::Disconnect),
        }
    }

    /// ### UNSUBSCRIBE
    /// **Based on spec.md §4.3.1 ("unsubscribe()") and SUPPLEMENTED FEATURE 4**
    pub fn unsubscribe(self: &Arc<Self>, subscription: Subscription) -> JoinHandle<Result<(), UnsubscribeError>> {
        let clone = self.clone();
        thread::spawn(move || clone.unsubscribe_blocking(subscription))
    }

    fn unsubscribe_blocking(self: &Arc<Self>, subscription: Subscription) -> Result<(), UnsubscribeError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(UnsubscribeError::NotEstablished);
        }
        let subscription_id = subscription.id();
        let (id, receiver) = self
            .send_tracked(|request| Message::Unsubscribe { request, subscription: subscription_id })
            .map_err(|_| UnsubscribeError::Disconnect)?;
        let reply = wait_for(receiver, self.config.request_timeout).map_err(|error| {
            self.pending.lock().unwrap().remove(&id);
            UnsubscribeError::from(error)
        })?;
        match reply {
            Message::Unsubscribed { .. } => {
                self.subscriptions.write().unwrap().remove(&subscription_id);
                Ok(())
            }
            Message::Error { error, args, kwargs, .. } => Err(UnsubscribeError::Rejected(PeerError { error, args, kwargs })),
            _ => Err(UnsubscribeError::Disconnect),
        }
    }

    /// ### CALL
    /// **Based on spec.md §4.3.1 ("call()")**
    pub fn call(
        self: &Arc<Self>,
        procedure: &str,
        args: Option<Value>,
        kwargs: Option<Value>,
        options: CallOptions,
    ) -> JoinHandle<Result<CallResult, CallError>> {
        let procedure = procedure.to_string();
        let clone = self.clone();
        thread::spawn(move || clone.call_blocking(procedure, args, kwargs, options))
    }

    fn call_blocking(
        self: &Arc<Self>,
        procedure: String,
        args: Option<Value>,
        kwargs: Option<Value>,
        options: CallOptions,
    ) -> Result<CallResult, CallError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(CallError::NotEstablished);
        }
        let timeout = options.timeout.unwrap_or(self.config.call_timeout);
        let mut options_value = match options.extra {
            Value::Map(pairs) => pairs,
            _ => vec![],
        };
        if let Some(timeout) = options.timeout {
            options_value.push((Value::from("timeout"), Value::from(timeout.as_millis() as u64)));
        }

        let (id, receiver) = self
            .send_tracked(move |request| Message::Call {
                request,
                options: Value::Map(options_value),
                procedure,
                args,
                kwargs,
            })
            .map_err(|_| CallError::Disconnect)?;
        let reply = wait_for(receiver, timeout).map_err(|error| {
            self.pending.lock().unwrap().remove(&id);
            CallError::from(error)
        })?;
        match reply {
            Message::Result { details, args, kwargs, .. } => Ok(CallResult { details, args, kwargs }),
            Message::Error { error, args, kwargs, .. } => Err(CallError::Rejected(PeerError { error, args, kwargs })),
            _ => Err(CallError::Disconnect),
        }
    }

    /// ### PROVIDE
    /// **Based on spec.md §4.3.1 ("provide()")**
    pub fn provide(
        self: &Arc<Self>,
        uri: &str,
        procedure: Procedure,
        options: Value,
    ) -> JoinHandle<Result<Registration, ProvideError>> {
        let uri = uri.to_string();
        let clone = self.clone();
        thread::spawn(move || clone.provide_blocking(uri, procedure, options))
    }

    fn provide_blocking(self: &Arc<Self>, uri: String, procedure: Procedure, options: Value) -> Result<Registration, ProvideError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(ProvideError::NotEstablished);
        }
        let (id, receiver) = self
            .send_tracked(|request| Message::Register { request, options, procedure: uri })
            .map_err(|_| ProvideError::Disconnect)?;
        let reply = wait_for(receiver, self.config.request_timeout).map_err(|error| {
            self.pending.lock().unwrap().remove(&id);
            ProvideError::from(error)
        })?;
        match reply {
            Message::Registered { registration, .. } => {
                self.registrations.write().unwrap().insert(registration, procedure);
                Ok(Registration(registration))
            }
            Message::Error { error, args, kwargs, .. } => Err(ProvideError::Rejected(PeerError { error, args, kwargs })),
            _ => Err(ProvideError::Disconnect),
        }
    }

    /// ### UNPROVIDE
    /// **Based on spec.md §3 ("UNREGISTER"/"UNREGISTERED")**
    pub fn unprovide(self: &Arc<Self>, registration: Registration) -> JoinHandle<Result<(), UnprovideError>> {
        let clone = self.clone();
        thread::spawn(move || clone.unprovide_blocking(registration))
    }

    fn unprovide_blocking(self: &Arc<Self>, registration: Registration) -> Result<(), UnprovideError> {
        if !matches!(*self.state.read().unwrap(), SessionState::Established { .. }) {
            return Err(UnprovideError::NotEstablished);
        }
        let registration_id = registration.id();
        let (id, receiver) = self
            .send_tracked(|request| Message::Unregister { request, registration: registration_id })
            .map_err(|_| UnprovideError::Disconnect)?;
        let reply = wait_for(receiver, self.config.request_timeout).map_err(|error| {
            self.pending.lock().unwrap().remove(&id);
            UnprovideError::from(error)
        })?;
        match reply {
            Message::Unregistered { .. } => {
                self.registrations.write().unwrap().remove(&registration_id);
                Ok(())
            }
            Message::Error { error, args, kwargs, .. } => Err(UnprovideError::Rejected(PeerError { error, args, kwargs })),
            _ => Err(UnprovideError::Disconnect),
        }
    }

    fn send_tracked(
        self: &Arc<Self>,
        build: impl FnOnce(Id) -> Message,
    ) -> Result<(Id, oneshot::Receiver<Message>), wamp_rawsocket::TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = build(id);
        let mut pending = self.pending.lock().unwrap();
        self.transmit(&message)?;
        let (sender, receiver) = oneshot::channel();
        pending.insert(id, sender);
        Ok((id, receiver))
    }

    fn transmit(&self, message: &Message) -> Result<(), wamp_rawsocket::TransportError> {
        let bytes = encode(message);
        let transport = self.transport.read().unwrap().clone();
        match transport {
            Some(transport) => match transport.send(bytes) {
                Ok(()) => Ok(()),
                Err(error) => {
                    self.sweep();
                    Err(error)
                }
            },
            None => Err(wamp_rawsocket::TransportError::Closed),
        }
    }

    /// The dispatch thread body: one frame in, one [Message] decoded and
    /// routed, repeat, matching `semi_e37::generic::Client::receive`'s loop
    /// shape but over a single inbound channel rather than a
    /// timeout-polled connection state.
    fn dispatch(self: Arc<Self>, inbound: std::sync::mpsc::Receiver<Vec<u8>>) {
        for payload in inbound.iter() {
            match decode(&payload) {
                Ok(message) => self.handle_message(message),
                Err(error) => tracing::warn!(%error, "dropping malformed frame"),
            }
        }
        self.sweep();
    }

    fn handle_message(self: &Arc<Self>, message: Message) {
        match message {
            Message::Welcome { .. } | Message::Abort { .. } => {
                if let Some(sender) = self.pending_hello.lock().unwrap().take() {
                    let _ = sender.send(message);
                } else {
                    tracing::debug!("WELCOME/ABORT received with no join() awaiting it");
                }
            }
            Message::Challenge { authmethod, extra } => self.handle_challenge(authmethod, extra),
            Message::Goodbye { details, reason } => self.handle_goodbye(details, reason),
            Message::Error { request, .. } => self.fulfill(request, message),
            Message::Published { request, .. } => self.fulfill(request, message),
            Message::Subscribed { request, .. } => self.fulfill(request, message),
            Message::Unsubscribed { request } => self.fulfill(request, message),
            Message::Result { request, .. } => self.fulfill(request, message),
            Message::Registered { request, .. } => self.fulfill(request, message),
            Message::Unregistered { request } => self.fulfill(request, message),
            Message::Event { subscription, details, args, kwargs, .. } => {
                let handlers_exist = {
                    let subscriptions = self.subscriptions.read().unwrap();
                    match subscriptions.get(&subscription) {
                        Some(handlers) if !handlers.is_empty() => {
                            for handler in handlers {
                                let event = Event { details: details.clone(), args: args.clone(), kwargs: kwargs.clone() };
                                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event))).is_err() {
                                    tracing::warn!(subscription, "EVENT handler panicked, continuing dispatch");
                                }
                            }
                            true
                        }
                        _ => false,
                    }
                };
                if !handlers_exist {
                    tracing::debug!(subscription, "EVENT for unknown subscription, ignoring");
                }
            }
            Message::Invocation { request, registration, details, args, kwargs } => {
                self.handle_invocation(request, registration, details, args, kwargs);
            }
            other => {
                tracing::debug!(message_type = ?other.message_type(), "ignoring message not valid inbound to a client");
            }
        }
    }

    fn fulfill(&self, request: Id, message: Message) {
        match self.pending.lock().unwrap().remove(&request) {
            Some(sender) => {
                let _ = sender.send(message);
            }
            None => tracing::debug!(request, "reply for unknown or already-timed-out request, ignoring"),
        }
    }

    fn handle_challenge(self: &Arc<Self>, authmethod: String, extra: Value) {
        let outcome = (self.challenge_handler.read().unwrap())(Challenge { authmethod, extra });
        match outcome {
            Ok(AuthenticateResponse { signature, extra }) => {
                let _ = self.transmit(&Message::Authenticate { signature, extra });
            }
            Err(reason) => {
                tracing::warn!(%reason, "authentication challenge rejected, aborting");
                let abort = Message::Abort {
                    details: empty_map(),
                    reason: "wamp.error.authentication_failed".to_string(),
                };
                let _ = self.transmit(&abort);
                if let Some(sender) = self.pending_hello.lock().unwrap().take() {
                    let _ = sender.send(abort);
                }
                self.sweep();
            }
        }
    }

    fn handle_goodbye(self: &Arc<Self>, details: Value, reason: Uri) {
        if self.leave_initiated.load(Ordering::Acquire) {
            if let Some(sender) = self.pending_goodbye.lock().unwrap().take() {
                let _ = sender.send(Message::Goodbye { details, reason });
                return;
            }
        }
        tracing::debug!(%reason, "peer closed session, echoing GOODBYE");
        let _ = self.transmit(&Message::Goodbye { details: empty_map(), reason: "wamp.close.goodbye_and_out".to_string() });
        self.sweep();
    }

    fn handle_invocation(self: &Arc<Self>, request: Id, registration: Id, details: Value, args: Option<Value>, kwargs: Option<Value>) {
        let outcome = {
            let registrations = self.registrations.read().unwrap();
            registrations.get(&registration).map(|procedure| {
                let invocation = Invocation { details, args, kwargs };
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| procedure(invocation))) {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::warn!(registration, "INVOCATION procedure panicked, returning error to caller");
                        ProcedureOutcome::Error { error: "wamp.error.runtime_error".to_string(), args: None, kwargs: None }
                    }
                }
            })
        };
        let reply = match outcome {
            Some(ProcedureOutcome::Yield { options, args, kwargs }) => Message::Yield { request, options, args, kwargs },
            Some(ProcedureOutcome::Error { error, args, kwargs }) => {
                Message::Error { request_type: MessageType::Invocation as u64, request, details: empty_map(), error, args, kwargs }
            }
            None => Message::Error {
                request_type: MessageType::Invocation as u64,
                request,
                details: empty_map(),
                error: "wamp.error.no_such_procedure".to_string(),
                args: None,
                kwargs: None,
            },
        };
        let _ = self.transmit(&reply);
    }

    /// Tears the session down: fails every outstanding request, drops every
    /// subscription/registration, and closes the transport. Idempotent, per
    /// spec.md §4.3.3's "any state, transport lost -> fail all pending,
    /// drop all subscriptions/registrations -> CLOSED".
    fn sweep(&self) {
        {
            let mut state = self.state.write().unwrap();
            if matches!(*state, SessionState::Closed) {
                return;
            }
            *state = SessionState::Closed;
        }
        self.pending_hello.lock().unwrap().take();
        self.pending_goodbye.lock().unwrap().take();
        self.pending.lock().unwrap().clear();
        self.subscriptions.write().unwrap().clear();
        self.registrations.write().unwrap().clear();
        if let Some(transport) = self.transport.write().unwrap().take() {
            transport.close();
        }
    }
}

fn wait_for(receiver: oneshot::Receiver<Message>, timeout: Duration) -> Result<Message, WaitError> {
    receiver.recv_timeout(timeout).map_err(|error| match error {
        oneshot::RecvTimeoutError::Timeout => WaitError::Timeout,
        oneshot::RecvTimeoutError::Disconnected => WaitError::Disconnect,
    })
}
