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

//! # RAWSOCKET TRANSPORT
//!
//! Implements the WAMP rawsocket framing transport: a fixed 4-byte
//! [handshake] followed by 4-byte-prefixed frames over a reliable byte
//! stream. This crate does not know anything about WAMP messages
//! themselves (see `wamp-messages`) or about session semantics (see
//! `wamp-session`); it only ships and receives opaque byte payloads.
//!
//! To use a [Transport]:
//!
//! - Connect with [Transport::connect_tcp], [Transport::connect_tls], or
//!   [Transport::connect_unix], each of which performs the [handshake] and
//!   returns a ready [Transport] plus the [Receiver] of inbound payloads.
//! - [Transport::send] queues a payload for transmission.
//! - [Transport::close] tears the connection down; dropping the [Transport]
//!   does the same.
//!
//! [handshake]: crate::handshake
//! [Transport]: Transport
//! [Receiver]:  std::sync::mpsc::Receiver

mod error;
mod frame;
pub mod handshake;
mod stream;
mod transport;

pub use error::TransportError;
pub use frame::{max_frame_bytes, FrameType};
pub use transport::Transport;
