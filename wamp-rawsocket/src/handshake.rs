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

//! ## HANDSHAKE
//! **Based on spec.md §4.2 ("Handshake")**
//!
//! 4 bytes sent, 4 bytes received, before any [frame] may be exchanged.
//!
//! [frame]: crate::frame

use crate::error::TransportError;
use std::io::{Read, Write};

/// The MessagePack serializer ID (spec.md §4.3.4: "Offered serializer is
/// MessagePack (ID 2)").
pub const SERIALIZER_MESSAGEPACK: u8 = 2;

const MAGIC: u8 = 0x7F;

/// ### PERFORM HANDSHAKE
///
/// Sends this client's offer (`max_frame_exponent`, `serializer`) and
/// validates the peer's reply, returning the peer's chosen max-frame
/// exponent on success.
pub fn perform<S: Read + Write>(stream: &mut S, max_frame_exponent: u8, serializer: u8) -> Result<u8, TransportError> {
    let offer = [MAGIC, (max_frame_exponent << 4) | (serializer & 0x0F), 0, 0];
    stream.write_all(&offer).map_err(TransportError::WriteError)?;

    let mut reply = [0u8; 4];
    stream.read_exact(&mut reply).map_err(TransportError::ReadError)?;

    if reply[0] != MAGIC {
        return Err(TransportError::HandshakeRejected { code: reply[1] });
    }
    let peer_serializer = reply[1] & 0x0F;
    if peer_serializer == 0 {
        // Low nibble zero: the high nibble is a router-specified error code.
        return Err(TransportError::HandshakeRejected { code: reply[1] });
    }
    if peer_serializer != serializer {
        return Err(TransportError::HandshakeRejected { code: reply[1] });
    }

    Ok(reply[1] >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Loopback {
        written: Vec<u8>,
        read_from: Cursor<Vec<u8>>,
    }

    impl Read for Loopback {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.read_from.read(buf)
        }
    }
    impl Write for Loopback {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn accepts_matching_reply() {
        let mut stream = Loopback { written: vec![], read_from: Cursor::new(vec![MAGIC, (0xF << 4) | 2, 0, 0]) };
        let peer_exponent = perform(&mut stream, 0xF, SERIALIZER_MESSAGEPACK).unwrap();
        assert_eq!(peer_exponent, 0xF);
        assert_eq!(stream.written, vec![MAGIC, (0xF << 4) | 2, 0, 0]);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut stream = Loopback { written: vec![], read_from: Cursor::new(vec![0x00, 0, 0, 0]) };
        assert!(matches!(
            perform(&mut stream, 0xF, SERIALIZER_MESSAGEPACK),
            Err(TransportError::HandshakeRejected { .. })
        ));
    }

    #[test]
    fn rejects_error_code_reply() {
        let mut stream = Loopback { written: vec![], read_from: Cursor::new(vec![MAGIC, 0x10, 0, 0]) };
        match perform(&mut stream, 0xF, SERIALIZER_MESSAGEPACK) {
            Err(TransportError::HandshakeRejected { code }) => assert_eq!(code, 0x10),
            other => panic!("expected HandshakeRejected, got {other:?}"),
        }
    }
}
