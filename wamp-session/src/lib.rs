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

//! # SESSION
//!
//! The session state machine and dispatcher described by this workspace's
//! core design: owns the conversation with a router over a
//! `wamp-rawsocket` [Transport][wamp_rawsocket::Transport], pairs
//! correlated request/reply messages, and routes inbound `EVENT`s and
//! `INVOCATION`s to user-supplied handlers.
//!
//! Construct a [Session] with [Session::new], attach a transport with
//! [Session::connect], then [Session::join] a realm before using
//! [Session::publish]/[Session::subscribe]/[Session::call]/[Session::provide].
//!
//! [Session]: Session

mod config;
mod error;
mod session;
mod types;

pub use config::SessionConfig;
pub use error::{
    CallError, ConnectError, JoinError, LeaveError, PeerError, ProvideError, PublishError, SubscribeError,
    UnprovideError, UnsubscribeError,
};
pub use session::{Endpoint, Session, SessionStatus};
pub use types::{
    AuthenticateResponse, CallOptions, CallResult, Challenge, ChallengeHandler, Event, EventHandler, Invocation,
    Procedure, ProcedureOutcome, Registration, Subscription,
};

pub use wamp_messages::{Id, Uri, Value};

#[cfg(test)]
mod tests;
