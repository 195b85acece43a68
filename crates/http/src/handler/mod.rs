//! Request handler trait and utilities.
//!
//! A handler receives the parsed [`Request`] together with ownership of the
//! connection's [`ResponseWriter`] and is responsible for producing the whole
//! response, buffered or streamed. [`make_handler`] adapts a plain async
//! function.

use std::future::Future;

use async_trait::async_trait;

use crate::connection::ResponseWriter;
use crate::protocol::{Request, SendError};

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, writer: ResponseWriter, request: Request) -> Result<(), SendError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(ResponseWriter, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SendError>> + Send,
{
    async fn handle(&self, writer: ResponseWriter, request: Request) -> Result<(), SendError> {
        (self.f)(writer, request).await
    }
}

pub fn make_handler<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ResponseWriter, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SendError>> + Send,
{
    HandlerFn { f }
}
