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

use std::{sync::Arc, thread, time::Duration};
use wamp::Client;
use wamp_session::{CallOptions, Endpoint, SessionConfig, Value};

fn main() {
    tracing_subscriber::fmt::init();

    let config = SessionConfig { realm: "realm1".into(), ..Default::default() };
    let client = Arc::new(Client::new(config));

    client.connect(Endpoint::Tcp { addr: "127.0.0.1:8080" }).unwrap();
    let session_id = client.join(None).join().unwrap().unwrap();
    println!("joined session {session_id}");

    // PROVIDE
    let provide_client = client.clone();
    provide_client
        .provide_typed::<(i64, i64), i64, _>("com.example.add", Value::Map(vec![]), |(a, b)| Ok(a + b))
        .join()
        .unwrap()
        .unwrap();

    // SUBSCRIBE
    let subscribe_client = client.clone();
    subscribe_client
        .subscribe_typed::<String, _>("com.example.onhello", Value::Map(vec![]), |greeting| {
            println!("EVENT {greeting}");
        })
        .join()
        .unwrap()
        .unwrap();

    // CALL
    let call_client = client.clone();
    let call_thread = thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(2));
        let sum: Result<i64, _> = call_client
            .call_typed("com.example.add", (1i64, 2i64), CallOptions::default())
            .join()
            .unwrap();
        match sum {
            Ok(sum) => println!("CALL com.example.add -> {sum}"),
            Err(error) => {
                println!("CALL failed: {error}");
                break;
            }
        }
    });

    // PUBLISH
    let publish_client = client.clone();
    let publish_thread = thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(5));
        if publish_client
            .publish_args("com.example.onhello", "hello from wamp-demo".to_string(), Value::Map(vec![]))
            .is_err()
        {
            break;
        }
    });

    call_thread.join().unwrap();
    publish_thread.join().unwrap();

    client.leave(None).join().unwrap().ok();
    client.stop();
}
