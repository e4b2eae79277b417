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

use wamp_messages::{Uri, Value};
use wamp_rawsocket::TransportError;

/// ## PEER ERROR
/// **Based on spec.md §3 ("ERROR")**
///
/// The payload of a router-sent `ERROR` message, carried verbatim into
/// whichever operation's error type rejected it.
#[derive(Clone, Debug)]
pub struct PeerError {
    pub error: Uri,
    pub args: Option<Value>,
    pub kwargs: Option<Value>,
}

/// ## WAIT ERROR
///
/// The two ways a `Session`'s internal request/reply wait can end without a
/// successful reply, shared by every operation built on
/// `Session::request_reply`.
#[derive(Debug, thiserror::Error)]
pub(crate) enum WaitError {
    #[error("transport disconnected while awaiting reply")]
    Disconnect,
    #[error("timed out awaiting reply")]
    Timeout,
}

/// ## CONNECT ERROR
/// **Based on spec.md §4.3.1 ("start()")**
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("session already connected")]
    AlreadyConnected,
}

/// ## JOIN ERROR
/// **Based on spec.md §4.3.1 ("join") and original_source/autobahn (abort details)**
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("router aborted: {reason}")]
    Aborted { reason: Uri, details: Value },

    #[error("transport disconnected before WELCOME")]
    Disconnect,

    #[error("timed out awaiting WELCOME")]
    Timeout,

    #[error("not connected")]
    NotConnected,
}

impl From<WaitError> for JoinError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}

/// ## LEAVE ERROR
/// **Based on spec.md §4.3.1 ("leave")**
#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("transport disconnected before peer GOODBYE")]
    Disconnect,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for LeaveError {
    fn from(error: WaitError) -> Self {
        match error {
            // spec.md §4.3.3 CLOSING: a leave timeout resolves the leave
            // future with the local reason rather than erroring, so
            // `leave_blocking` never routes `WaitError::Timeout` through
            // this conversion; only a transport drop does.
            WaitError::Disconnect | WaitError::Timeout => Self::Disconnect,
        }
    }
}

/// ## PUBLISH ERROR
/// **Based on spec.md §4.3.1 ("publish")**
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("session not established")]
    NotEstablished,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// ## SUBSCRIBE ERROR
#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("router rejected subscription: {}", .0.error)]
    Rejected(PeerError),

    #[error("transport disconnected before SUBSCRIBED")]
    Disconnect,

    #[error("timed out awaiting SUBSCRIBED")]
    Timeout,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for SubscribeError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}

/// ## UNSUBSCRIBE ERROR
#[derive(Debug, thiserror::Error)]
pub enum UnsubscribeError {
    #[error("router rejected unsubscribe: {}", .0.error)]
    Rejected(PeerError),

    #[error("transport disconnected before UNSUBSCRIBED")]
    Disconnect,

    #[error("timed out awaiting UNSUBSCRIBED")]
    Timeout,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for UnsubscribeError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}

/// ## CALL ERROR
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("router returned error: {}", .0.error)]
    Rejected(PeerError),

    #[error("transport disconnected before RESULT")]
    Disconnect,

    #[error("timed out awaiting RESULT")]
    Timeout,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for CallError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}

/// ## PROVIDE ERROR
#[derive(Debug, thiserror::Error)]
pub enum ProvideError {
    #[error("router rejected registration: {}", .0.error)]
    Rejected(PeerError),

    #[error("transport disconnected before REGISTERED")]
    Disconnect,

    #[error("timed out awaiting REGISTERED")]
    Timeout,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for ProvideError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}

/// ## UNPROVIDE ERROR
#[derive(Debug, thiserror::Error)]
pub enum UnprovideError {
    #[error("router rejected unregister: {}", .0.error)]
    Rejected(PeerError),

    #[error("transport disconnected before UNREGISTERED")]
    Disconnect,

    #[error("timed out awaiting UNREGISTERED")]
    Timeout,

    #[error("session not established")]
    NotEstablished,
}

impl From<WaitError> for UnprovideError {
    fn from(error: WaitError) -> Self {
        match error {
            WaitError::Disconnect => Self::Disconnect,
            WaitError::Timeout => Self::Timeout,
        }
    }
}
