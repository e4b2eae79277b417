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

//! Scripted-router integration tests for the typed facade, mirroring
//! `wamp-session`'s own test harness since `Client` is a thin wrapper around
//! a [wamp_session::Session].

use crate::Client;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use wamp_messages::{decode, encode, Message, Value};
use wamp_session::{CallOptions, Endpoint, SessionConfig};

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

fn new_client() -> Client {
    Client::new(SessionConfig { realm: "test.realm".into(), ..Default::default() })
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

#[test]
fn call_typed_round_trips_struct_arguments() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        match read_message(&mut stream) {
            Message::Call { request, args, .. } => {
                let point: Point = Message::args_as(&args).unwrap();
                assert_eq!(point, Point { x: 1, y: 2 });
                write_message(
                    &mut stream,
                    &Message::Result {
                        request,
                        details: Value::Map(vec![]),
                        args: Some(Value::Array(vec![Value::from(3)])),
                        kwargs: None,
                    },
                );
            }
            other => panic!("expected CALL, got {other:?}"),
        }
    });

    let client = new_client();
    client.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    client.join(None).join().unwrap().unwrap();

    let sum: i64 = client
        .call_typed("com.example.sum", Point { x: 1, y: 2 }, CallOptions::default())
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(sum, 3);

    router.join().unwrap();
}

#[test]
fn publish_args_encodes_positional_payload() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        match read_message(&mut stream) {
            Message::Publish { topic, args, .. } => {
                assert_eq!(topic, "com.example.moved");
                let point: Point = Message::args_as(&args).unwrap();
                assert_eq!(point, Point { x: 4, y: 5 });
            }
            other => panic!("expected PUBLISH, got {other:?}"),
        }
    });

    let client = new_client();
    client.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    client.join(None).join().unwrap().unwrap();
    client
        .publish_args("com.example.moved", Point { x: 4, y: 5 }, Value::Map(vec![]))
        .unwrap();

    router.join().unwrap();
}

#[test]
fn subscribe_typed_delivers_deserialized_event() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let router = spawn_router(listener, |mut stream| {
        let _ = read_message(&mut stream); // HELLO
        write_message(&mut stream, &Message::Welcome { session: 1, details: Value::Map(vec![]) });
        match read_message(&mut stream) {
            Message::Subscribe { request, .. } => {
                write_message(&mut stream, &Message::Subscribed { request, subscription: 99 });
            }
            other => panic!("expected SUBSCRIBE, got {other:?}"),
        }
        write_message(
            &mut stream,
            &Message::Event {
                subscription: 99,
                publication: 1,
                details: Value::Map(vec![]),
                args: Some(Value::Array(vec![Value::from(6), Value::from(7)])),
                kwargs: None,
            },
        );
    });

    let client = new_client();
    client.connect(Endpoint::Tcp { addr: &addr }).unwrap();
    client.join(None).join().unwrap().unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    client
        .subscribe_typed::<Point, _>("com.example.moved", Value::Map(vec![]), move |point| {
            tx.send(point).unwrap();
        })
        .join()
        .unwrap()
        .unwrap();

    let received = rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
    assert_eq!(received, Point { x: 6, y: 7 });

    router.join().unwrap();
}
