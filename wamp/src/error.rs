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

/// ## TYPED PUBLISH ERROR
#[derive(Debug, thiserror::Error)]
pub enum TypedPublishError {
    #[error(transparent)]
    Publish(#[from] wamp_session::PublishError),

    #[error("failed to encode publish payload: {0}")]
    Encode(String),
}

/// ## TYPED SUBSCRIBE ERROR
#[derive(Debug, thiserror::Error)]
pub enum TypedSubscribeError {
    #[error(transparent)]
    Subscribe(#[from] wamp_session::SubscribeError),
}

/// ## TYPED CALL ERROR
#[derive(Debug, thiserror::Error)]
pub enum TypedCallError {
    #[error(transparent)]
    Call(#[from] wamp_session::CallError),

    #[error("failed to encode call arguments: {0}")]
    Encode(String),

    #[error("failed to decode call result: {0}")]
    Decode(String),
}

/// ## TYPED PROVIDE ERROR
#[derive(Debug, thiserror::Error)]
pub enum TypedProvideError {
    #[error(transparent)]
    Provide(#[from] wamp_session::ProvideError),
}
