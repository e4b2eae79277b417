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

//! # WAMP
//!
//! Typed facade over [wamp_session]: a [Client] that serializes/deserializes
//! arguments with `serde` instead of requiring callers to build
//! [Value][wamp_session::Value] trees by hand. Everything [wamp_session]
//! exposes (the raw [Session][wamp_session::Session], its config, its
//! untyped [Event][wamp_session::Event]/[Invocation][wamp_session::Invocation]
//! types) is re-exported here so the facade is a strict superset, not a
//! separate API surface.

mod client;
mod error;

pub use client::Client;
pub use error::{TypedCallError, TypedProvideError, TypedPublishError, TypedSubscribeError};

pub use wamp_messages::{Id, Uri};
pub use wamp_session::*;

#[cfg(test)]
mod tests;
