//! HTTP/1.1 response encoder.
//!
//! Serializes the sequence of [`ResponseMessage`] items produced by the
//! response writer into wire bytes: status line, header block, then a body
//! framed per the [`BodyMode`] the header block declared. The body itself is
//! delegated to [`PayloadEncoder`].
//!
//! The encoder enforces wire ordering only (no status line twice, no body
//! bytes before a header block); the caller-facing lifecycle checks live in
//! the response writer.

use crate::codec::body::PayloadEncoder;
use crate::protocol::{BodyMode, HeaderMap, PayloadItem, ResponseMessage, SendError, StatusCode};
use bytes::{BufMut, BytesMut};
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer space reserved for the status line and header block.
const INIT_HEAD_SIZE: usize = 1024;

pub struct ResponseEncoder {
    status_written: bool,
    payload_encoder: Option<PayloadEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { status_written: false, payload_encoder: None }
    }
}

impl Encoder<ResponseMessage> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ResponseMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            ResponseMessage::Status(status) => {
                if self.status_written {
                    error!("status line encoded twice");
                    return Err(SendError::invalid_sequence("status line already written"));
                }
                encode_status_line(status, dst)?;
                self.status_written = true;
                Ok(())
            }

            ResponseMessage::Headers(headers) => {
                if !self.status_written || self.payload_encoder.is_some() {
                    error!("header block encoded out of order");
                    return Err(SendError::invalid_sequence("headers must follow the status line exactly once"));
                }
                let mode = BodyMode::from_headers(&headers)?;
                encode_header_block(&headers, dst);
                self.payload_encoder = Some(mode.into());
                Ok(())
            }

            ResponseMessage::Chunk(bytes) => {
                let Some(encoder) = &mut self.payload_encoder else {
                    error!("body bytes encoded before the header block");
                    return Err(SendError::invalid_sequence("body bytes before headers"));
                };
                encoder.encode(PayloadItem::Chunk(bytes), dst)
            }

            ResponseMessage::End => {
                let Some(encoder) = &mut self.payload_encoder else {
                    return Err(SendError::invalid_sequence("end of body before headers"));
                };
                encoder.encode(PayloadItem::Eof, dst)?;
                if !encoder.is_chunked() {
                    // chunked bodies stay open for their trailer block
                    self.payload_encoder.take();
                }
                Ok(())
            }

            ResponseMessage::Trailers(trailers) => {
                let Some(encoder) = &mut self.payload_encoder else {
                    return Err(SendError::invalid_sequence("trailers without a chunked body in flight"));
                };
                encoder.encode_trailers(&trailers, dst)?;
                self.payload_encoder.take();
                Ok(())
            }
        }
    }
}

/// Writes `HTTP/1.1 <code> <reason>\r\n`; unknown codes carry an empty
/// reason phrase.
fn encode_status_line(status: StatusCode, dst: &mut BytesMut) -> Result<(), SendError> {
    dst.reserve(INIT_HEAD_SIZE);
    write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_u16(), status.reason())?;
    Ok(())
}

/// Writes each header as `name: value\r\n` (order unspecified) and the
/// terminating blank line.
fn encode_header_block(headers: &HeaderMap, dst: &mut BytesMut) {
    for (name, value) in headers.iter() {
        dst.put_slice(name.as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
}

/// Writer adapter so `write!` can target a `BytesMut` without an
/// intermediate allocation.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
