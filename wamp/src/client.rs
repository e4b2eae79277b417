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

//! ## CLIENT
//! **Based on `original_source/autobahn::wamp_session` and `semi_e37`'s top-level doc**
//!
//! [Client] is a thin, typed wrapper over [wamp_session::Session]: it
//! serializes/deserializes arguments through `serde` rather than requiring
//! callers to build [Value] trees by hand, the way the original's templated
//! `publish<T...>`/`call<T...>` overloads spare C++ callers from building
//! `msgpack::object`s by hand. The raw [Session] remains reachable via
//! [Client::session] for callers who need direct control over options or
//! keyword arguments.
//!
//! [Client]: Client
//! [Value]:  wamp_session::Value

use crate::error::{TypedCallError, TypedProvideError, TypedPublishError, TypedSubscribeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use wamp_messages::Message;
use wamp_session::{
    CallOptions, Endpoint, Event, EventHandler, Invocation, ProcedureOutcome, Registration, Session, SessionConfig,
    Subscription, Value,
};

/// Wraps a single positional value in the `args` array the wire format
/// expects, unless it already encoded to an array (a tuple, e.g. call
/// arguments, naturally does).
fn as_positional_args(value: Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(value),
        Value::Nil => None,
        other => Some(Value::Array(vec![other])),
    }
}

/// ## CLIENT
pub struct Client {
    session: Arc<Session>,
}

impl Deref for Client {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl Client {
    /// ### NEW CLIENT
    pub fn new(config: SessionConfig) -> Self {
        Self { session: Session::new(config) }
    }

    /// Direct access to the underlying [Session] for callers who need the
    /// raw [Value]-based API (e.g. keyword arguments, vendor options).
    ///
    /// [Session]: Session
    /// [Value]:   Value
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// ### CONNECT
    pub fn connect(&self, endpoint: Endpoint) -> Result<(), wamp_session::ConnectError> {
        self.session.connect(endpoint)
    }

    /// ### JOIN
    pub fn join(&self, realm: Option<String>) -> JoinHandle<Result<wamp_messages::Id, wamp_session::JoinError>> {
        self.session.join(realm)
    }

    /// ### LEAVE
    pub fn leave(&self, reason: Option<String>) -> JoinHandle<Result<wamp_messages::Uri, wamp_session::LeaveError>> {
        self.session.leave(reason)
    }

    /// ### STOP
    pub fn stop(&self) {
        self.session.stop()
    }

    /// ### PUBLISH (typed)
    ///
    /// Serializes `args` with `serde` and publishes it as the event's
    /// positional arguments.
    pub fn publish_args<T: Serialize>(&self, topic: &str, args: T, options: Value) -> Result<(), TypedPublishError> {
        let value = rmpv::ext::to_value(&args).map_err(|error| TypedPublishError::Encode(error.to_string()))?;
        self.session
            .publish(topic, as_positional_args(value), None, options)
            .map_err(Into::into)
    }

    /// ### SUBSCRIBE (typed)
    ///
    /// `handler` receives the event's positional arguments deserialized
    /// into `T`; events whose payload does not match `T` are logged and
    /// dropped rather than delivered.
    pub fn subscribe_typed<T, F>(
        &self,
        topic: &str,
        options: Value,
        handler: F,
    ) -> JoinHandle<Result<Subscription, TypedSubscribeError>>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let wrapped: EventHandler = Box::new(move |event: Event| match Message::args_as::<T>(&event.args) {
            Ok(value) => handler(value),
            Err(error) => tracing::warn!(%error, "dropping EVENT whose payload does not match the subscriber's type"),
        });
        let handle = self.session.subscribe(topic, wrapped, options);
        thread::spawn(move || handle.join().expect("subscribe thread panicked").map_err(Into::into))
    }

    /// ### UNSUBSCRIBE
    pub fn unsubscribe(&self, subscription: Subscription) -> JoinHandle<Result<(), wamp_session::UnsubscribeError>> {
        self.session.unsubscribe(subscription)
    }

    /// ### CALL (typed)
    ///
    /// Serializes `args` with `serde`, sends the call, and deserializes the
    /// result's positional arguments into `R`.
    pub fn call_typed<A, R>(&self, procedure: &str, args: A, options: CallOptions) -> JoinHandle<Result<R, TypedCallError>>
    where
        A: Serialize + Send + 'static,
        R: DeserializeOwned + Send + 'static,
    {
        let procedure = procedure.to_string();
        let session = self.session.clone();
        thread::spawn(move || {
            let value = rmpv::ext::to_value(&args).map_err(|error| TypedCallError::Encode(error.to_string()))?;
            let result = session
                .call(&procedure, as_positional_args(value), None, options)
                .join()
                .expect("call thread panicked")?;
            Message::args_as::<R>(&result.args).map_err(|error| TypedCallError::Decode(error.to_string()))
        })
    }

    /// ### PROVIDE (typed)
    ///
    /// `handler` is invoked with the invocation's positional arguments
    /// deserialized into `A`; its `Ok(R)` becomes the `YIELD`'s positional
    /// result, its `Err((error_uri, args, kwargs))` becomes `ERROR`.
    pub fn provide_typed<A, R, F>(
        &self,
        uri: &str,
        options: Value,
        handler: F,
    ) -> JoinHandle<Result<Registration, TypedProvideError>>
    where
        A: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(A) -> Result<R, (String, Option<Value>, Option<Value>)> + Send + Sync + 'static,
    {
        let procedure = Box::new(move |invocation: Invocation| -> ProcedureOutcome {
            let args = match Message::args_as::<A>(&invocation.args) {
                Ok(args) => args,
                Err(error) => {
                    return ProcedureOutcome::Error {
                        error: "wamp.error.invalid_argument".to_string(),
                        args: Some(Value::Array(vec![Value::from(error.to_string())])),
                        kwargs: None,
                    }
                }
            };
            match handler(args) {
                Ok(result) => match rmpv::ext::to_value(&result) {
                    Ok(value) => ProcedureOutcome::Yield { options: Value::Map(vec![]), args: as_positional_args(value), kwargs: None },
                    Err(error) => ProcedureOutcome::Error {
                        error: "wamp.error.invalid_argument".to_string(),
                        args: Some(Value::Array(vec![Value::from(error.to_string())])),
                        kwargs: None,
                    },
                },
                Err((error, args, kwargs)) => ProcedureOutcome::Error { error, args, kwargs },
            }
        });
        let handle = self.session.provide(uri, procedure, options);
        thread::spawn(move || handle.join().expect("provide thread panicked").map_err(Into::into))
    }

    /// ### UNPROVIDE
    pub fn unprovide(&self, registration: Registration) -> JoinHandle<Result<(), wamp_session::UnprovideError>> {
        self.session.unprovide(registration)
    }
}
