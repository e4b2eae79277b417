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

//! Scripted-router integration tests, in the spirit of spec.md §8's E2E
//! scenarios. A background thread plays the router: it accepts one
//! connection, performs the rawsocket handshake, and then reads/writes
//! frames by hand (there being no transport mock to inject — the teacher's
//! own primitive client is no less concrete about its TCP socket).

use crate::{CallOptions, ConnectError, Endpoint, JoinError, Session, SessionConfig};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use wamp_messages::{decode, encode, Message, Value};

fn write_frame(stream: &mut TcpStream, frame_type: u8, payload: &[u8]) {
    let len = payload.len();
    let header = [frame_type, (len >> 16) as u8, (len >> 8) as u8, len as u8];
    stream.write_all(&header).unwrap();
    stream.write_all(payload).unwrap();
}

fn read_frame(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).unwrap();
    let len = ((header[1] as usize) << 16) | ((header[2] as usize) << 8) | header[3] as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).unwrap();
    (header[0], payload)
}

fn accept_handshake(stream: &mut TcpStream) {
    let mut offer = [0u8; 4];
    stream.read_exact(&mut offer).unwrap();
    stream.write_all(&[0x7F, offer[1], 0, 0]).unwrap();
}

fn read_message(stream: &mut TcpStream) -> Message {
    let (_frame_type, payload) = read_frame(stream);
    decode(&payload).unwrap()
}

fn write_message(stream: &mut TcpStream, message: &Message) {
    write_frame(stream, 0, &encode(message));
}

fn spawn_router(listener: TcpListener, script: impl FnOnce(TcpStream) + Send + 'static) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        accept_handshake(&mut stream);
        script(stream)
    })
}

fn new_session() -> std::sync::Arc<Session> {
    Session::new(SessionConfig { realm: "test.realm".into(), ..Default::default() })
}

#[test]
fn join_success_yields_session_id() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        match read_message(&mut stream) {
            Message::Hello { realm, .. } => assert_eq!(realm, "test.realm"),
            other => panic!("expected HELLO, got {other:?}"),
        }
        write_message(&mut stream, &Message::Welcome { session: 42, details: Value::Map(vec![]) });
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    let session_id = session.join(None).join().unwrap().unwrap();
    assert_eq!(session_id, 42);

    router.join().unwrap();
}

#[test]
fn join_aborted_surfaces_reason() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream);
        write_message(
            &mut stream,
            &Message::Abort { details: Value::Map(vec![]), reason: "wamp.error.no_such_realm".into() },
        );
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    let result = session.join(None).join().unwrap();
    match result {
        Err(JoinError::Aborted { reason, .. }) => assert_eq!(reason, "wamp.error.no_such_realm"),
        other => panic!("expected Aborted, got {other:?}"),
    }

    router.join().unwrap();
}

#[test]
fn call_round_trip_returns_result() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 7, details: Value::Map(vec![]) });
        match read_message(&mut stream) {
            Message::Call { request, procedure, args, .. } => {
                assert_eq!(procedure, "com.example.add");
                assert_eq!(args, Some(Value::Array(vec![Value::from(2), Value::from(3)])));
                write_message(
                    &mut stream,
                    &Message::Result {
                        request,
                        details: Value::Map(vec![]),
                        args: Some(Value::Array(vec![Value::from(5)])),
                        kwargs: None,
                    },
                );
            }
            other => panic!("expected CALL, got {other:?}"),
        }
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    let result = session
        .call(
            "com.example.add",
            Some(Value::Array(vec![Value::from(2), Value::from(3)])),
            None,
            CallOptions::default(),
        )
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(result.args, Some(Value::Array(vec![Value::from(5)])));

    router.join().unwrap();
}

#[test]
fn disconnect_mid_call_fails_with_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        let _ = read_message(&mut stream); // CALL
        drop(stream); // vanish without replying
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    let result = session
        .call("com.example.add", None, None, CallOptions::default())
        .join()
        .unwrap();
    assert!(matches!(result, Err(crate::CallError::Disconnect)));

    router.join().unwrap();
}

#[test]
fn connect_twice_is_rejected() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |stream| {
        // Keep the connection open long enough for the second connect to fail locally.
        thread::sleep(Duration::from_millis(100));
        drop(stream);
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    let second = session.connect(Endpoint::Tcp { addr: &addr });
    assert!(matches!(second, Err(ConnectError::AlreadyConnected)));

    router.join().unwrap();
}

#[test]
fn session_id_and_welcome_details_available_once_established() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        let details = Value::Map(vec![(Value::from("roles"), Value::Map(vec![]))]);
        write_message(&mut stream, &Message::Welcome { session: 99, details });
        let _ = read_message(&mut stream); // GOODBYE
        write_message(&mut stream, &Message::Goodbye { details: Value::Map(vec![]), reason: "wamp.close.close_normal".into() });
    });

    let session = new_session();
    assert_eq!(session.session_id(), None);
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    assert_eq!(session.session_id(), Some(99));
    assert!(session.welcome_details().is_some());

    session.leave(None).join().unwrap().unwrap();
    assert_eq!(session.session_id(), None);

    router.join().unwrap();
}

#[test]
fn publish_rejected_while_closing() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        let _ = read_message(&mut stream); // GOODBYE
        // Deliberately delay the reply so the session observably sits in Closing.
        thread::sleep(Duration::from_millis(100));
        write_message(&mut stream, &Message::Goodbye { details: Value::Map(vec![]), reason: "wamp.close.close_normal".into() });
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    let leave_handle = session.leave(None);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(session.status(), crate::SessionStatus::Closing);
    let publish_result = session.publish("com.example.topic", None, None, Value::Map(vec![]));
    assert!(matches!(publish_result, Err(crate::PublishError::NotEstablished)));

    leave_handle.join().unwrap().unwrap();

    router.join().unwrap();
}

#[test]
fn invocation_round_trip_yields_result() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        let registration = match read_message(&mut stream) {
            Message::Register { request, procedure, .. } => {
                assert_eq!(procedure, "com.example.double");
                write_message(&mut stream, &Message::Registered { request, registration: 9001 });
                9001
            }
            other => panic!("expected REGISTER, got {other:?}"),
        };
        // Give the client time to record the registration before the
        // INVOCATION for it arrives.
        thread::sleep(Duration::from_millis(50));
        write_message(
            &mut stream,
            &Message::Invocation {
                request: 55,
                registration,
                details: Value::Map(vec![]),
                args: Some(Value::Array(vec![Value::from(21)])),
                kwargs: None,
            },
        );
        match read_message(&mut stream) {
            Message::Yield { request, args, .. } => {
                assert_eq!(request, 55);
                assert_eq!(args, Some(Value::Array(vec![Value::from(42)])));
            }
            other => panic!("expected YIELD, got {other:?}"),
        }
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    session
        .provide(
            "com.example.double",
            Box::new(|invocation| {
                let n = match &invocation.args {
                    Some(Value::Array(values)) => values[0].as_i64().unwrap(),
                    _ => panic!("expected args"),
                };
                crate::ProcedureOutcome::Yield {
                    options: Value::Map(vec![]),
                    args: Some(Value::Array(vec![Value::from(n * 2)])),
                    kwargs: None,
                }
            }),
            Value::Map(vec![]),
        )
        .join()
        .unwrap()
        .unwrap();

    router.join().unwrap();
}

#[test]
fn event_is_delivered_to_every_handler_sharing_a_subscription_id() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        for _ in 0..2 {
            match read_message(&mut stream) {
                Message::Subscribe { request, topic, .. } => {
                    assert_eq!(topic, "com.example.topic");
                    // A real broker returns the same subscription ID for
                    // repeated subscribes to one topic within a session.
                    write_message(&mut stream, &Message::Subscribed { request, subscription: 777 });
                }
                other => panic!("expected SUBSCRIBE, got {other:?}"),
            }
        }
        // Give the client time to record the second handler before the
        // EVENT for that subscription ID arrives.
        thread::sleep(Duration::from_millis(50));
        write_message(
            &mut stream,
            &Message::Event { subscription: 777, publication: 1, details: Value::Map(vec![]), args: None, kwargs: None },
        );
    });

    let session = new_session();
    session.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    session.join(None).join().unwrap().unwrap();

    let first_hits = std::sync::Arc::new(AtomicUsize::new(0));
    let second_hits = std::sync::Arc::new(AtomicUsize::new(0));

    let first_counter = first_hits.clone();
    let first = session
        .subscribe("com.example.topic", Box::new(move |_event| { first_counter.fetch_add(1, Ordering::SeqCst); }), Value::Map(vec![]))
        .join()
        .unwrap()
        .unwrap();
    let second_counter = second_hits.clone();
    let second = session
        .subscribe("com.example.topic", Box::new(move |_event| { second_counter.fetch_add(1, Ordering::SeqCst); }), Value::Map(vec![]))
        .join()
        .unwrap()
        .unwrap();

    assert_eq!(first.id(), second.id());

    router.join().unwrap();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);
}
