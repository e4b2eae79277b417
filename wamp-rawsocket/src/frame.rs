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

//! ## FRAMING
//! **Based on spec.md §4.2 ("Framing")**
//!
//! After a successful [handshake], every message is preceded by a 4-byte
//! big-endian header: the top 8 bits name a [FrameType], the low 24 bits
//! give the payload length. [Ping]s are answered with [Pong]s of identical
//! payload by the transport itself; neither reaches the Session.
//!
//! [handshake]: crate::handshake
//! [Ping]:      FrameType::Ping
//! [Pong]:      FrameType::Pong

use crate::error::TransportError;
use std::io::{Read, Write};

/// ### FRAME TYPE
///
/// The high byte of a [frame header].
///
/// [frame header]: crate::frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameType {
    Regular,
    Ping,
    Pong,
}

impl FrameType {
    fn code(self) -> u8 {
        match self {
            Self::Regular => 0,
            Self::Ping => 1,
            Self::Pong => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Regular),
            1 => Some(Self::Ping),
            2 => Some(Self::Pong),
            _ => None,
        }
    }
}

/// ### WRITE FRAME
///
/// Writes a single frame header followed by `payload` to `stream`.
pub fn write_frame<S: Write>(stream: &mut S, frame_type: FrameType, payload: &[u8]) -> Result<(), TransportError> {
    let len = payload.len();
    let mut header = [0u8; 4];
    header[0] = frame_type.code();
    header[1] = (len >> 16) as u8;
    header[2] = (len >> 8) as u8;
    header[3] = len as u8;
    stream.write_all(&header).map_err(TransportError::WriteError)?;
    stream.write_all(payload).map_err(TransportError::WriteError)?;
    Ok(())
}

/// ### READ FRAME
///
/// Blocks until a full frame header and payload have been read from
/// `stream`, rejecting any frame whose advertised length exceeds
/// `max_frame_bytes`.
pub fn read_frame<S: Read>(stream: &mut S, max_frame_bytes: usize) -> Result<(FrameType, Vec<u8>), TransportError> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).map_err(TransportError::ReadError)?;

    let frame_type = FrameType::from_code(header[0]).ok_or_else(|| {
        TransportError::ReadError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unknown frame type code {}", header[0]),
        ))
    })?;
    let len = ((header[1] as usize) << 16) | ((header[2] as usize) << 8) | header[3] as usize;

    if len > max_frame_bytes {
        return Err(TransportError::FrameTooLarge { len, max: max_frame_bytes });
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).map_err(TransportError::ReadError)?;
    Ok((frame_type, payload))
}

/// ### MAX FRAME BYTES
///
/// Converts a handshake exponent (spec.md §4.2: "max frame = 2^(9+exp)
/// bytes") into the byte count it denotes.
pub fn max_frame_bytes(exponent: u8) -> usize {
    1usize << (9 + exponent as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, FrameType::Regular, b"hello").unwrap();
        let (frame_type, payload) = read_frame(&mut &buffer[..], 1 << 20).unwrap();
        assert_eq!(frame_type, FrameType::Regular);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, FrameType::Regular, &[0u8; 100]).unwrap();
        let result = read_frame(&mut &buffer[..], 10);
        assert!(matches!(result, Err(TransportError::FrameTooLarge { len: 100, max: 10 })));
    }

    #[test]
    fn max_frame_bytes_matches_spec_formula() {
        assert_eq!(max_frame_bytes(0), 512);
        assert_eq!(max_frame_bytes(0xF), 16 * 1024 * 1024);
    }
}
