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

//! ## DUPLEX STREAM
//!
//! The capability set a [Transport] needs from its underlying byte stream,
//! independent of which backing (TCP, TLS, Unix domain socket) supplies it.
//! Spec.md §5 calls this out explicitly: "Model as an abstract capability
//! set {connect, read, write, close}; supply TCP, TLS, UDS implementations
//! as tagged variants or dynamic-dispatch objects chosen at construction."
//! This crate chooses dynamic dispatch: [Transport::spawn] takes a
//! `Box<dyn DuplexStream>`.
//!
//! [Transport]: crate::Transport

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// ### DUPLEX STREAM
///
/// A full-duplex byte stream that additionally supports a read timeout (so
/// the reader task can periodically recheck whether it has been asked to
/// close, the same polling shape the teacher's receive loop uses) and a
/// hard shutdown (so close() does not have to wait out that timeout).
pub trait DuplexStream: Read + Write + Send {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
    fn shutdown(&mut self);
}

impl DuplexStream for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&mut self) {
        let _ = TcpStream::shutdown(self, Shutdown::Both);
    }
}

#[cfg(unix)]
impl DuplexStream for std::os::unix::net::UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&mut self) {
        let _ = std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both);
    }
}

impl<T: DuplexStream> DuplexStream for rustls::StreamOwned<rustls::ClientConnection, T> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.sock.set_read_timeout(timeout)
    }

    fn shutdown(&mut self) {
        self.sock.shutdown();
    }
}
