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

/// ## TRANSPORT ERROR
/// **Based on spec.md §4.2 ("Errors")**
///
/// All variants are terminal: a [Transport] that has failed does not
/// auto-reconnect. The caller (the Session) is expected to treat any of
/// these as `Disconnect`, sweeping its pending tables.
///
/// [Transport]: crate::Transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// ### CONNECT FAILED
    ///
    /// The underlying byte stream (TCP, TLS, or Unix domain socket) could
    /// not be established.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// ### HANDSHAKE REJECTED
    ///
    /// The peer's 4-byte handshake reply did not accept this client's offer:
    /// its magic byte differed, it named a serializer the peer does not
    /// support, or it carried a router-specified error code in the high
    /// nibble of byte 1 with a zero low nibble. `code` is that raw second
    /// byte, preserved for diagnostics.
    #[error("handshake rejected (code {code:#04x})")]
    HandshakeRejected { code: u8 },

    /// ### READ ERROR
    ///
    /// A frame could not be read from the stream after a successful
    /// handshake.
    #[error("read error: {0}")]
    ReadError(#[source] std::io::Error),

    /// ### WRITE ERROR
    ///
    /// A frame could not be written to the stream.
    #[error("write error: {0}")]
    WriteError(#[source] std::io::Error),

    /// ### FRAME TOO LARGE
    ///
    /// A frame header advertised a payload length exceeding the peer's
    /// negotiated maximum.
    #[error("frame of {len} bytes exceeds negotiated maximum of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// ### CLOSED
    ///
    /// The transport has already been closed (locally or by the peer); the
    /// operation cannot proceed.
    #[error("transport closed")]
    Closed,
}
