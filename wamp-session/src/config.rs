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

use std::time::Duration;

/// ## SESSION CONFIG
/// **Based on `semi_e37::generic::ParameterSettings`**
///
/// Immutable settings provided to [Session::new][crate::Session::new], in
/// the teacher's style of a plain, builder-less, `Default`-implementing
/// struct with public fields rather than a fluent builder.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Realm offered to [join][crate::Session::join] when the caller does
    /// not name one explicitly.
    pub realm: String,

    /// Authentication methods offered in `HELLO.Details.authmethods`.
    pub authmethods: Vec<String>,

    /// Authentication ID offered in `HELLO.Details.authid`, if any.
    pub authid: Option<String>,

    /// How long [call][crate::Session::call] waits for a `RESULT`/`ERROR`
    /// before failing with a timeout, absent a per-call override.
    pub call_timeout: Duration,

    /// How long [join][crate::Session::join] waits for `WELCOME`/`ABORT`.
    pub join_timeout: Duration,

    /// How long [subscribe][crate::Session::subscribe],
    /// [unsubscribe][crate::Session::unsubscribe],
    /// [provide][crate::Session::provide], and
    /// [leave][crate::Session::leave] wait for their respective replies.
    pub request_timeout: Duration,

    /// How long [connect][crate::Session::connect] waits to establish the
    /// underlying byte stream.
    pub connect_timeout: Duration,

    /// Max payload length exponent this client offers during the rawsocket
    /// handshake (spec.md §4.2: "max frame = 2^(9+exp) bytes"). `0xF` is 16
    /// MiB, the value spec.md calls "typical".
    pub max_frame_exponent: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            realm: String::new(),
            authmethods: Vec::new(),
            authid: None,
            call_timeout: Duration::from_secs(10),
            join_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_frame_exponent: 0xF,
        }
    }
}
