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

//! ## TRANSPORT
//! **Based on `semi_e37::primitive::Client` and spec.md §4.2**
//!
//! A [Transport] is the rawsocket framing layer: it performs the 4-byte
//! [handshake], then owns one reader task and one writer task over the same
//! socket, exactly as `semi_e37::primitive::Client` owns one receive thread
//! over its `TcpStream`. Where the teacher spawns that thread itself from
//! `connect()`, this crate's [Transport::spawn] is a single entry point all
//! three backings (TCP, TLS, Unix domain socket) funnel through once they
//! have produced a boxed [DuplexStream].
//!
//! [handshake]:    crate::handshake
//! [Transport]:    Transport
//! [DuplexStream]: crate::stream::DuplexStream

use crate::error::TransportError;
use crate::frame::{max_frame_bytes, read_frame, write_frame, FrameType};
use crate::handshake::{self, SERIALIZER_MESSAGEPACK};
use crate::stream::DuplexStream;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Bound on the outbound frame queue (spec.md §4.2: "Outbound sends are
/// serialised through a bounded queue... when the queue is full, the
/// Session's send path suspends"). `send` blocks once this many frames are
/// queued ahead of it.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// How long the reader task's read call may block before it rechecks
/// whether it has been asked to close. Mirrors the teacher's reliance on a
/// socket read timeout (there, [T8]) to periodically recheck
/// `connection_state` rather than blocking forever.
///
/// [T8]: crate
const POLL_INTERVAL: Duration = Duration::from_millis(200);

enum OutboundFrame {
    Regular(Vec<u8>),
    Pong(Vec<u8>),
}

/// ## TRANSPORT
///
/// A connected, handshaken rawsocket transport. Payloads handed to [send]
/// are queued for the writer task; payloads the reader task receives as
/// [regular frames] are delivered, in order, on the [Receiver] returned
/// alongside this [Transport].
///
/// [send]:           Transport::send
/// [regular frames]: crate::frame::FrameType::Regular
/// [Receiver]:       std::sync::mpsc::Receiver
/// [Transport]:      Transport
pub struct Transport {
    outbound: SyncSender<OutboundFrame>,
    stream: Arc<Mutex<Box<dyn DuplexStream>>>,
    closed: Arc<AtomicBool>,
    peer_max_frame_exponent: u8,
}

impl Transport {
    /// ### CONNECT (TCP)
    ///
    /// Establishes a TCP connection to `addr`, then performs the rawsocket
    /// [handshake] and spawns the reader/writer tasks.
    ///
    /// [handshake]: crate::handshake
    pub fn connect_tcp(addr: &str, connect_timeout: Duration, max_frame_exponent: u8) -> Result<(Self, Receiver<Vec<u8>>), TransportError> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(TransportError::ConnectFailed)?
            .next()
            .ok_or_else(|| TransportError::ConnectFailed(std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, addr)))?;
        let stream = TcpStream::connect_timeout(&socket_addr, connect_timeout).map_err(TransportError::ConnectFailed)?;
        Self::spawn(Box::new(stream), max_frame_exponent)
    }

    /// ### CONNECT (TLS over TCP)
    ///
    /// Establishes a TCP connection to `(host, port)`, wraps it in a rustls
    /// client session validated against the platform's web PKI roots, then
    /// performs the rawsocket [handshake] over the encrypted channel.
    ///
    /// [handshake]: crate::handshake
    pub fn connect_tls(host: &str, port: u16, connect_timeout: Duration, max_frame_exponent: u8) -> Result<(Self, Receiver<Vec<u8>>), TransportError> {
        let socket_addr = (host, port)
            .to_socket_addrs()
            .map_err(TransportError::ConnectFailed)?
            .next()
            .ok_or_else(|| TransportError::ConnectFailed(std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, host)))?;
        let tcp = TcpStream::connect_timeout(&socket_addr, connect_timeout).map_err(TransportError::ConnectFailed)?;

        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let server_name = rustls_pki_types::ServerName::try_from(host.to_string())
            .map_err(|error| TransportError::ConnectFailed(std::io::Error::new(std::io::ErrorKind::InvalidInput, error)))?;
        let connection = rustls::ClientConnection::new(Arc::new(config), server_name)
            .map_err(|error| TransportError::ConnectFailed(std::io::Error::new(std::io::ErrorKind::Other, error)))?;
        let stream = rustls::StreamOwned::new(connection, tcp);
        Self::spawn(Box::new(stream), max_frame_exponent)
    }

    /// ### CONNECT (Unix domain socket)
    ///
    /// Connects to the Unix domain socket at `path`, then performs the
    /// rawsocket [handshake].
    ///
    /// [handshake]: crate::handshake
    #[cfg(unix)]
    pub fn connect_unix(path: &Path, max_frame_exponent: u8) -> Result<(Self, Receiver<Vec<u8>>), TransportError> {
        let stream = std::os::unix::net::UnixStream::connect(path).map_err(TransportError::ConnectFailed)?;
        Self::spawn(Box::new(stream), max_frame_exponent)
    }

    fn spawn(mut stream: Box<dyn DuplexStream>, max_frame_exponent: u8) -> Result<(Self, Receiver<Vec<u8>>), TransportError> {
        let peer_max_frame_exponent = handshake::perform(&mut stream, max_frame_exponent, SERIALIZER_MESSAGEPACK)?;
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(TransportError::ReadError)?;

        let stream = Arc::new(Mutex::new(stream));
        let closed = Arc::new(AtomicBool::new(false));
        let (outbound_sender, outbound_receiver) = sync_channel::<OutboundFrame>(OUTBOUND_QUEUE_DEPTH);
        let (inbound_sender, inbound_receiver) = std::sync::mpsc::channel::<Vec<u8>>();

        let max_frame = max_frame_bytes(peer_max_frame_exponent.min(max_frame_exponent));

        let reader_stream = stream.clone();
        let reader_closed = closed.clone();
        let reader_outbound = outbound_sender.clone();
        thread::spawn(move || Self::reader_task(reader_stream, reader_closed, reader_outbound, inbound_sender, max_frame));

        let writer_stream = stream.clone();
        let writer_closed = closed.clone();
        thread::spawn(move || Self::writer_task(writer_stream, writer_closed, outbound_receiver));

        Ok((
            Self { outbound: outbound_sender, stream, closed, peer_max_frame_exponent },
            inbound_receiver,
        ))
    }

    /// ### SEND
    ///
    /// Queues `payload` as a regular frame for transmission. Blocks if the
    /// writer task's queue is full (spec.md §4.2's backpressure rule), and
    /// fails with [TransportError::Closed] once the transport has closed.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(OutboundFrame::Regular(payload))
            .map_err(|_| TransportError::Closed)
    }

    /// ### CLOSE
    ///
    /// Shuts the underlying stream down immediately, waking the reader and
    /// writer tasks out of any in-progress blocking call. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stream.lock().unwrap().shutdown();
    }

    /// The peer's negotiated max-frame exponent, as returned during the
    /// handshake.
    pub fn peer_max_frame_exponent(&self) -> u8 {
        self.peer_max_frame_exponent
    }

    fn reader_task(
        stream: Arc<Mutex<Box<dyn DuplexStream>>>,
        closed: Arc<AtomicBool>,
        outbound: SyncSender<OutboundFrame>,
        inbound: std::sync::mpsc::Sender<Vec<u8>>,
        max_frame: usize,
    ) {
        while !closed.load(Ordering::Acquire) {
            let result = {
                let mut guard = stream.lock().unwrap();
                read_frame(&mut **guard, max_frame)
            };
            match result {
                Ok((FrameType::Regular, payload)) => {
                    if inbound.send(payload).is_err() {
                        break;
                    }
                }
                Ok((FrameType::Ping, payload)) => {
                    tracing::trace!(len = payload.len(), "echoing ping as pong");
                    if outbound.send(OutboundFrame::Pong(payload)).is_err() {
                        break;
                    }
                }
                Ok((FrameType::Pong, _)) => {
                    // Unsolicited or answered pong; not delivered to the Session.
                }
                Err(TransportError::ReadError(ref io_error)) if Self::is_timeout(io_error) => continue,
                Err(error) => {
                    tracing::debug!(%error, "transport read failed, closing");
                    closed.store(true, Ordering::Release);
                    stream.lock().unwrap().shutdown();
                    break;
                }
            }
        }
    }

    fn writer_task(stream: Arc<Mutex<Box<dyn DuplexStream>>>, closed: Arc<AtomicBool>, outbound: Receiver<OutboundFrame>) {
        while let Ok(frame) = outbound.recv() {
            if closed.load(Ordering::Acquire) {
                break;
            }
            let (frame_type, payload) = match frame {
                OutboundFrame::Regular(payload) => (FrameType::Regular, payload),
                OutboundFrame::Pong(payload) => (FrameType::Pong, payload),
            };
            let result = {
                let mut guard = stream.lock().unwrap();
                write_frame(&mut **guard, frame_type, &payload)
            };
            if let Err(error) = result {
                tracing::debug!(%error, "transport write failed, closing");
                closed.store(true, Ordering::Release);
                stream.lock().unwrap().shutdown();
                break;
            }
        }
    }

    fn is_timeout(error: &std::io::Error) -> bool {
        matches!(error.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}
