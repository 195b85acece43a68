//! Per-connection driver.
//!
//! One `HttpConnection` exists per accepted socket and is mutated by exactly
//! one flow of control: it reads a single request through a
//! [`FramedRead`]-driven [`RequestDecoder`], hands the [`ResponseWriter`] to
//! the handler, and is discarded afterwards. Connections are never reused
//! (no keep-alive, no pipelining).
//!
//! Known gap: there is no timeout or cancellation here. A peer that stalls
//! mid-headers blocks this connection's task indefinitely.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;
use tracing::{error, info};

use crate::codec::RequestDecoder;
use crate::connection::ResponseWriter;
use crate::handler::Handler;
use crate::protocol::{HttpError, StatusCode, default_headers};

const READ_BUFFER_SIZE: usize = 8 * 1024;

pub struct HttpConnection<R> {
    framed_read: FramedRead<R, RequestDecoder>,
    writer: ResponseWriter,
}

impl<R> HttpConnection<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), READ_BUFFER_SIZE),
            writer: ResponseWriter::new(writer),
        }
    }

    /// Reads one request and dispatches it to the handler.
    ///
    /// A parse failure is answered with a `400` carrying the error text
    /// before the error is propagated; a connection that closes before
    /// sending anything is not an error.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        match self.framed_read.next().await {
            Some(Ok(request)) => {
                info!(method = request.method(), target = request.target(), "request parsed");
                handler.handle(self.writer, request).await?;
                Ok(())
            }

            Some(Err(e)) => {
                error!(cause = %e, "could not parse request");
                let body = format!("{e}\n");
                self.writer.write(StatusCode::BAD_REQUEST, default_headers(0), body.as_bytes()).await?;
                Err(e.into())
            }

            None => {
                info!("connection closed before a request arrived");
                Ok(())
            }
        }
    }
}
