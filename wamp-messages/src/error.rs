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

/// ## DECODE ERROR
///
/// Represents a failure to turn a received frame's bytes into a [Message].
///
/// [Message]: crate::Message
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// ### MALFORMED FRAME
    ///
    /// The bytes did not parse as a MessagePack value, or parsed as a value
    /// that isn't an array, or is an array too short to carry the fields its
    /// type code requires.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// ### UNKNOWN MESSAGE TYPE
    ///
    /// The leading array element was an integer but not one of the type
    /// codes this crate recognizes. Per WAMP's forward-compatibility rule,
    /// this is not by itself fatal to a session; the caller decides whether
    /// to log and ignore it.
    #[error("unknown message type {0}")]
    UnknownMessageType(u64),

    /// ### TYPE MISMATCH
    ///
    /// A typed view was requested over an argument or keyword-argument
    /// payload (or a sub-field of one) whose shape did not match the
    /// requested Rust type. Unlike the other two variants, this is raised
    /// lazily, only when the caller asks for a typed view.
    #[error("type mismatch extracting {0}")]
    TypeMismatch(String),
}
