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

//! # WAMP MESSAGE MODEL & CODEC
//!
//! This crate defines the wire-level [Message] type exchanged between a WAMP
//! client and a router, together with the [encode] and [decode] functions
//! that convert a [Message] to and from the MessagePack-based binary object
//! model used by the `rawsocket` transport.
//!
//! A protocol message is, on the wire, a MessagePack array whose first
//! element is an integer [MessageType] code and whose remaining elements are
//! type-specific (see each [Message] variant's documentation). Decoding does
//! not re-validate argument/keyword-argument payloads against a schema: they
//! are retained as an owned [rmpv::Value] tree (the "argument arena") so
//! that typed extraction can happen later, in the caller's own time, via
//! [Message::args_as]/[Message::kwargs_as].
//!
//! [Message]:  Message
//! [encode]:   encode
//! [decode]:   decode

mod error;
mod message;

pub use error::DecodeError;
pub use message::{decode, encode, Id, Message, MessageType, Uri};

/// Re-exported so that callers building or inspecting argument/keyword-argument
/// payloads do not need to depend on `rmpv` directly at a different version.
pub use rmpv::Value;
