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

//! ## MESSAGE
//! **Based on the WAMP v2 Basic Profile.**
//!
//! Defines the [Message] enum and its [encode]/[decode] functions against the
//! MessagePack-based binary object model ([rmpv::Value]).

use crate::error::DecodeError;
use rmpv::Value;

/// ### REQUEST / SESSION / SUBSCRIPTION / REGISTRATION ID
///
/// A 64-bit integer used throughout WAMP to correlate a reply to a request,
/// to name a session, or to name a router-assigned subscription or
/// registration. All four uses share a single wire representation, so a
/// single alias is used rather than four newtypes, matching the way the
/// protocol itself overloads the integer ID space.
pub type Id = u64;

/// ### URI
///
/// A dotted identifier naming a realm, a topic, a procedure, or an error.
/// WAMP does not require any particular on-the-wire representation beyond
/// "a string", so no validation of URI shape is performed here; routers are
/// responsible for rejecting malformed URIs.
pub type Uri = String;

/// ## MESSAGE TYPE
/// **Based on spec.md §3 ("Message")**
///
/// The leading element of every [Message]'s MessagePack array. Only the
/// types the Session must accept are listed; any other integer decodes to
/// [DecodeError::UnknownMessageType].
///
/// [Message]: Message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum MessageType {
    Hello = 1,
    Welcome = 2,
    Abort = 3,
    Challenge = 4,
    Authenticate = 5,
    Goodbye = 6,
    Error = 8,
    Publish = 16,
    Published = 17,
    Subscribe = 32,
    Subscribed = 33,
    Unsubscribe = 34,
    Unsubscribed = 35,
    Event = 36,
    Call = 48,
    Result = 50,
    Register = 64,
    Registered = 65,
    Unregister = 66,
    Unregistered = 67,
    Invocation = 68,
    Yield = 70,
}

impl TryFrom<u64> for MessageType {
    type Error = DecodeError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Self::Hello,
            2 => Self::Welcome,
            3 => Self::Abort,
            4 => Self::Challenge,
            5 => Self::Authenticate,
            6 => Self::Goodbye,
            8 => Self::Error,
            16 => Self::Publish,
            17 => Self::Published,
            32 => Self::Subscribe,
            33 => Self::Subscribed,
            34 => Self::Unsubscribe,
            35 => Self::Unsubscribed,
            36 => Self::Event,
            48 => Self::Call,
            50 => Self::Result,
            64 => Self::Register,
            65 => Self::Registered,
            66 => Self::Unregister,
            67 => Self::Unregistered,
            68 => Self::Invocation,
            70 => Self::Yield,
            other => return Err(DecodeError::UnknownMessageType(other)),
        })
    }
}

/// ## MESSAGE
/// **Based on spec.md §3 ("Message") and §4.1 (Codec)**
///
/// An in-memory representation of a single WAMP protocol message, already
/// split into named fields. `args`/`kwargs` remain as opaque [Value] trees
/// (the "argument arena" spec.md §4.1 and §5 describe): use
/// [Message::args_as]/[Message::kwargs_as] for a typed view.
///
/// [Value]: rmpv::Value
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Hello {
        realm: Uri,
        details: Value,
    },
    Welcome {
        session: Id,
        details: Value,
    },
    Abort {
        details: Value,
        reason: Uri,
    },
    Challenge {
        authmethod: String,
        extra: Value,
    },
    Authenticate {
        signature: String,
        extra: Value,
    },
    Goodbye {
        details: Value,
        reason: Uri,
    },
    Error {
        request_type: u64,
        request: Id,
        details: Value,
        error: Uri,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Publish {
        request: Id,
        options: Value,
        topic: Uri,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Published {
        request: Id,
        publication: Id,
    },
    Subscribe {
        request: Id,
        options: Value,
        topic: Uri,
    },
    Subscribed {
        request: Id,
        subscription: Id,
    },
    Unsubscribe {
        request: Id,
        subscription: Id,
    },
    Unsubscribed {
        request: Id,
    },
    Event {
        subscription: Id,
        publication: Id,
        details: Value,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Call {
        request: Id,
        options: Value,
        procedure: Uri,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Result {
        request: Id,
        details: Value,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Register {
        request: Id,
        options: Value,
        procedure: Uri,
    },
    Registered {
        request: Id,
        registration: Id,
    },
    Unregister {
        request: Id,
        registration: Id,
    },
    Unregistered {
        request: Id,
    },
    Invocation {
        request: Id,
        registration: Id,
        details: Value,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
    Yield {
        request: Id,
        options: Value,
        args: Option<Value>,
        kwargs: Option<Value>,
    },
}

impl Message {
    /// ### MESSAGE TYPE
    ///
    /// Reports the [MessageType] code this [Message] would encode with.
    ///
    /// [Message]:     Message
    /// [MessageType]: MessageType
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Hello { .. } => MessageType::Hello,
            Self::Welcome { .. } => MessageType::Welcome,
            Self::Abort { .. } => MessageType::Abort,
            Self::Challenge { .. } => MessageType::Challenge,
            Self::Authenticate { .. } => MessageType::Authenticate,
            Self::Goodbye { .. } => MessageType::Goodbye,
            Self::Error { .. } => MessageType::Error,
            Self::Publish { .. } => MessageType::Publish,
            Self::Published { .. } => MessageType::Published,
            Self::Subscribe { .. } => MessageType::Subscribe,
            Self::Subscribed { .. } => MessageType::Subscribed,
            Self::Unsubscribe { .. } => MessageType::Unsubscribe,
            Self::Unsubscribed { .. } => MessageType::Unsubscribed,
            Self::Event { .. } => MessageType::Event,
            Self::Call { .. } => MessageType::Call,
            Self::Result { .. } => MessageType::Result,
            Self::Register { .. } => MessageType::Register,
            Self::Registered { .. } => MessageType::Registered,
            Self::Unregister { .. } => MessageType::Unregister,
            Self::Unregistered { .. } => MessageType::Unregistered,
            Self::Invocation { .. } => MessageType::Invocation,
            Self::Yield { .. } => MessageType::Yield,
        }
    }

    /// ### TYPED ARGUMENTS
    ///
    /// Deserializes this message's positional argument payload, if present,
    /// into `T`. Absent payloads deserialize as if an empty list had been
    /// sent, matching the "omit if empty" encoding rule (spec.md §4.3.5).
    pub fn args_as<T: serde::de::DeserializeOwned>(args: &Option<Value>) -> Result<T, DecodeError> {
        let value = args.clone().unwrap_or(Value::Array(vec![]));
        rmpv::ext::from_value(value)
            .map_err(|error| DecodeError::TypeMismatch(format!("args: {error}")))
    }

    /// ### TYPED KEYWORD ARGUMENTS
    ///
    /// Deserializes this message's keyword-argument payload, if present,
    /// into `T`. Absent payloads deserialize as if an empty map had been
    /// sent.
    pub fn kwargs_as<T: serde::de::DeserializeOwned>(kwargs: &Option<Value>) -> Result<T, DecodeError> {
        let value = kwargs.clone().unwrap_or(Value::Map(vec![]));
        rmpv::ext::from_value(value)
            .map_err(|error| DecodeError::TypeMismatch(format!("kwargs: {error}")))
    }
}

/// Builds the `[args?, kwargs?]` tail shared by every payload-bearing
/// message, eliding a trailing `None` and (per spec.md §4.3.5) always
/// emitting an empty positional array when only `kwargs` is present.
fn push_payload_tail(elements: &mut Vec<Value>, args: &Option<Value>, kwargs: &Option<Value>) {
    match (args, kwargs) {
        (None, None) => {}
        (Some(args), None) => elements.push(args.clone()),
        (None, Some(kwargs)) => {
            elements.push(Value::Array(vec![]));
            elements.push(kwargs.clone());
        }
        (Some(args), Some(kwargs)) => {
            elements.push(args.clone());
            elements.push(kwargs.clone());
        }
    }
}

/// ### ENCODE
/// **Based on spec.md §4.1 (Codec)**
///
/// Converts a [Message] into its MessagePack encoding. Omitted trailing
/// optional fields are not encoded, producing the shortest valid form.
///
/// [Message]: Message
pub fn encode(message: &Message) -> Vec<u8> {
    let mut elements: Vec<Value> = vec![Value::from(message.message_type() as u64)];
    match message {
        Message::Hello { realm, details } => {
            elements.push(Value::from(realm.clone()));
            elements.push(details.clone());
        }
        Message::Welcome { session, details } => {
            elements.push(Value::from(*session));
            elements.push(details.clone());
        }
        Message::Abort { details, reason } => {
            elements.push(details.clone());
            elements.push(Value::from(reason.clone()));
        }
        Message::Challenge { authmethod, extra } => {
            elements.push(Value::from(authmethod.clone()));
            elements.push(extra.clone());
        }
        Message::Authenticate { signature, extra } => {
            elements.push(Value::from(signature.clone()));
            elements.push(extra.clone());
        }
        Message::Goodbye { details, reason } => {
            elements.push(details.clone());
            elements.push(Value::from(reason.clone()));
        }
        Message::Error {
            request_type,
            request,
            details,
            error,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request_type));
            elements.push(Value::from(*request));
            elements.push(details.clone());
            elements.push(Value::from(error.clone()));
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Publish {
            request,
            options,
            topic,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request));
            elements.push(options.clone());
            elements.push(Value::from(topic.clone()));
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Published { request, publication } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*publication));
        }
        Message::Subscribe { request, options, topic } => {
            elements.push(Value::from(*request));
            elements.push(options.clone());
            elements.push(Value::from(topic.clone()));
        }
        Message::Subscribed { request, subscription } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*subscription));
        }
        Message::Unsubscribe { request, subscription } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*subscription));
        }
        Message::Unsubscribed { request } => {
            elements.push(Value::from(*request));
        }
        Message::Event {
            subscription,
            publication,
            details,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*subscription));
            elements.push(Value::from(*publication));
            elements.push(details.clone());
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Call {
            request,
            options,
            procedure,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request));
            elements.push(options.clone());
            elements.push(Value::from(procedure.clone()));
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Result {
            request,
            details,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request));
            elements.push(details.clone());
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Register { request, options, procedure } => {
            elements.push(Value::from(*request));
            elements.push(options.clone());
            elements.push(Value::from(procedure.clone()));
        }
        Message::Registered { request, registration } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*registration));
        }
        Message::Unregister { request, registration } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*registration));
        }
        Message::Unregistered { request } => {
            elements.push(Value::from(*request));
        }
        Message::Invocation {
            request,
            registration,
            details,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request));
            elements.push(Value::from(*registration));
            elements.push(details.clone());
            push_payload_tail(&mut elements, args, kwargs);
        }
        Message::Yield {
            request,
            options,
            args,
            kwargs,
        } => {
            elements.push(Value::from(*request));
            elements.push(options.clone());
            push_payload_tail(&mut elements, args, kwargs);
        }
    }

    let mut buffer = Vec::new();
    rmpv::encode::write_value(&mut buffer, &Value::Array(elements))
        .expect("encoding into a Vec<u8> is infallible");
    buffer
}

/// ### DECODE
/// **Based on spec.md §4.1 (Codec)**
///
/// Parses a complete MessagePack-encoded frame into a [Message].
///
/// [Message]: Message
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    let value = rmpv::decode::read_value(&mut &bytes[..])
        .map_err(|error| DecodeError::MalformedFrame(error.to_string()))?;

    let elements = match value {
        Value::Array(elements) => elements,
        _ => return Err(DecodeError::MalformedFrame("outer value is not an array".into())),
    };

    let mut iter = elements.into_iter();
    let type_code = iter
        .next()
        .ok_or_else(|| DecodeError::MalformedFrame("empty message array".into()))?
        .as_u64()
        .ok_or_else(|| DecodeError::MalformedFrame("message type is not an unsigned integer".into()))?;
    let message_type = MessageType::try_from(type_code)?;

    let mut remaining: Vec<Value> = iter.collect();
    let field = |remaining: &mut Vec<Value>, name: &'static str| -> Result<Value, DecodeError> {
        if remaining.is_empty() {
            Err(DecodeError::MalformedFrame(format!("missing field: {name}")))
        } else {
            Ok(remaining.remove(0))
        }
    };
    let uri = |remaining: &mut Vec<Value>, name: &'static str| -> Result<Uri, DecodeError> {
        field(remaining, name)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| DecodeError::MalformedFrame(format!("{name} is not a string")))
    };
    let string = |remaining: &mut Vec<Value>, name: &'static str| -> Result<String, DecodeError> {
        uri(remaining, name)
    };
    let id = |remaining: &mut Vec<Value>, name: &'static str| -> Result<Id, DecodeError> {
        field(remaining, name)?
            .as_u64()
            .ok_or_else(|| DecodeError::MalformedFrame(format!("{name} is not an unsigned integer")))
    };
    let pop_tail = |remaining: &mut Vec<Value>| -> (Option<Value>, Option<Value>) {
        let args = if remaining.is_empty() { None } else { Some(remaining.remove(0)) };
        let kwargs = if remaining.is_empty() { None } else { Some(remaining.remove(0)) };
        (args, kwargs)
    };

    Ok(match message_type {
        MessageType::Hello => Message::Hello {
            realm: uri(&mut remaining, "realm")?,
            details: field(&mut remaining, "details")?,
        },
        MessageType::Welcome => Message::Welcome {
            session: id(&mut remaining, "session")?,
            details: field(&mut remaining, "details")?,
        },
        MessageType::Abort => Message::Abort {
            details: field(&mut remaining, "details")?,
            reason: uri(&mut remaining, "reason")?,
        },
        MessageType::Challenge => Message::Challenge {
            authmethod: string(&mut remaining, "authmethod")?,
            extra: field(&mut remaining, "extra")?,
        },
        MessageType::Authenticate => Message::Authenticate {
            signature: string(&mut remaining, "signature")?,
            extra: field(&mut remaining, "extra")?,
        },
        MessageType::Goodbye => Message::Goodbye {
            details: field(&mut remaining, "details")?,
            reason: uri(&mut remaining, "reason")?,
        },
        MessageType::Error => {
            let request_type = id(&mut remaining, "request_type")?;
            let request = id(&mut remaining, "request")?;
            let details = field(&mut remaining, "details")?;
            let error = uri(&mut remaining, "error")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Error { request_type, request, details, error, args, kwargs }
        }
        MessageType::Publish => {
            let request = id(&mut remaining, "request")?;
            let options = field(&mut remaining, "options")?;
            let topic = uri(&mut remaining, "topic")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Publish { request, options, topic, args, kwargs }
        }
        MessageType::Published => Message::Published {
            request: id(&mut remaining, "request")?,
            publication: id(&mut remaining, "publication")?,
        },
        MessageType::Subscribe => Message::Subscribe {
            request: id(&mut remaining, "request")?,
            options: field(&mut remaining, "options")?,
            topic: uri(&mut remaining, "topic")?,
        },
        MessageType::Subscribed => Message::Subscribed {
            request: id(&mut remaining, "request")?,
            subscription: id(&mut remaining, "subscription")?,
        },
        MessageType::Unsubscribe => Message::Unsubscribe {
            request: id(&mut remaining, "request")?,
            subscription: id(&mut remaining, "subscription")?,
        },
        MessageType::Unsubscribed => Message::Unsubscribed { request: id(&mut remaining, "request")? },
        MessageType::Event => {
            let subscription = id(&mut remaining, "subscription")?;
            let publication = id(&mut remaining, "publication")?;
            let details = field(&mut remaining, "details")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Event { subscription, publication, details, args, kwargs }
        }
        MessageType::Call => {
            let request = id(&mut remaining, "request")?;
            let options = field(&mut remaining, "options")?;
            let procedure = uri(&mut remaining, "procedure")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Call { request, options, procedure, args, kwargs }
        }
        MessageType::Result => {
            let request = id(&mut remaining, "request")?;
            let details = field(&mut remaining, "details")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Result { request, details, args, kwargs }
        }
        MessageType::Register => Message::Register {
            request: id(&mut remaining, "request")?,
            options: field(&mut remaining, "options")?,
            procedure: uri(&mut remaining, "procedure")?,
        },
        MessageType::Registered => Message::Registered {
            request: id(&mut remaining, "request")?,
            registration: id(&mut remaining, "registration")?,
        },
        MessageType::Unregister => Message::Unregister {
            request: id(&mut remaining, "request")?,
            registration: id(&mut remaining, "registration")?,
        },
        MessageType::Unregistered => Message::Unregistered { request: id(&mut remaining, "request")? },
        MessageType::Invocation => {
            let request = id(&mut remaining, "request")?;
            let registration = id(&mut remaining, "registration")?;
            let details = field(&mut remaining, "details")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Invocation { request, registration, details, args, kwargs }
        }
        MessageType::Yield => {
            let request = id(&mut remaining, "request")?;
            let options = field(&mut remaining, "options")?;
            let (args, kwargs) = pop_tail(&mut remaining);
            Message::Yield { request, options, args, kwargs }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(pairs.into_iter().map(|(k, v)| (Value::from(k), v)).collect())
    }

    #[test]
    fn round_trip_hello() {
        let message = Message::Hello {
            realm: "realm1".into(),
            details: dict(vec![("roles", dict(vec![("caller", dict(vec![]))]))]),
        };
        assert_eq!(decode(&encode(&message)).unwrap(), message);
    }

    #[test]
    fn round_trip_call_with_args() {
        let message = Message::Call {
            request: 7,
            options: dict(vec![]),
            procedure: "com.example.add".into(),
            args: Some(Value::Array(vec![Value::from(2), Value::from(3)])),
            kwargs: None,
        };
        assert_eq!(decode(&encode(&message)).unwrap(), message);
    }

    #[test]
    fn round_trip_event_with_kwargs_only() {
        let message = Message::Event {
            subscription: 1,
            publication: 2,
            details: dict(vec![]),
            args: None,
            kwargs: Some(dict(vec![("key", Value::from("value"))])),
        };
        let encoded = encode(&message);
        // Omit-if-empty rule: kwargs-only still emits an empty args array.
        assert_eq!(decode(&encoded).unwrap(), message);
    }

    #[test]
    fn omits_trailing_empty_payload() {
        let message = Message::Published { request: 1, publication: 2 };
        let encoded = encode(&message);
        let value = rmpv::decode::read_value(&mut &encoded[..]).unwrap();
        match value {
            Value::Array(elements) => assert_eq!(elements.len(), 3),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn unknown_message_type_is_reported() {
        let mut buffer = Vec::new();
        rmpv::encode::write_value(&mut buffer, &Value::Array(vec![Value::from(999u64)])).unwrap();
        match decode(&buffer) {
            Err(DecodeError::UnknownMessageType(999)) => {}
            other => panic!("expected UnknownMessageType, got {other:?}"),
        }
    }

    #[test]
    fn malformed_frame_on_non_array() {
        let mut buffer = Vec::new();
        rmpv::encode::write_value(&mut buffer, &Value::from(5)).unwrap();
        assert!(matches!(decode(&buffer), Err(DecodeError::MalformedFrame(_))));
    }

    #[test]
    fn typed_args_extraction() {
        let args = Some(Value::Array(vec![Value::from(2), Value::from(3)]));
        let (a, b): (i64, i64) = Message::args_as(&args).unwrap();
        assert_eq!((a, b), (2, 3));
    }

    #[test]
    fn typed_args_extraction_absent_defaults_empty() {
        let out: Vec<i64> = Message::args_as(&None).unwrap();
        assert!(out.is_empty());
    }
}
