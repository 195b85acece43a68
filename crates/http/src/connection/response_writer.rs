//! Streaming response writer.
//!
//! A [`ResponseWriter`] serializes exactly one response onto its transport,
//! either buffered (`content-length` framing) or as a chunked stream closed
//! by a zero chunk and a trailer block. It owns a staging buffer and a
//! [`ResponseEncoder`]; every operation encodes into the buffer and flushes
//! it to the transport, so a transport failure surfaces from the operation
//! that hit it and aborts the sequence. No write is ever retried.
//!
//! Call order is enforced: status line first, headers exactly once, then
//! body bytes or the chunk/trailer sequence. Trailer names must have been
//! declared in the `trailer` header passed to [`ResponseWriter::start_stream`].

use std::fmt;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;

use crate::codec::ResponseEncoder;
use crate::ensure;
use crate::protocol::{BodyMode, HeaderMap, ResponseMessage, SendError, StatusCode};

const INIT_BUFFER_SIZE: usize = 4 * 1024;

pub struct ResponseWriter {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    state: WriteState,
    declared_trailers: Vec<String>,
}

/// What the writer expects next; the lifecycle only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    StatusLine,
    Headers,
    Body,
    Streaming,
    Trailers,
    Done,
}

impl ResponseWriter {
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            buffer: BytesMut::with_capacity(INIT_BUFFER_SIZE),
            encoder: ResponseEncoder::new(),
            state: WriteState::StatusLine,
            declared_trailers: Vec::new(),
        }
    }

    /// Writes the status line. Must be the first operation and happens
    /// exactly once per response.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        ensure!(
            self.state == WriteState::StatusLine,
            SendError::invalid_sequence("status line must be the first write")
        );
        self.encode(ResponseMessage::Status(status))?;
        self.state = WriteState::Headers;
        self.flush().await
    }

    /// Writes the header block and its terminating blank line. Must be
    /// called exactly once, after the status line and before any body bytes.
    ///
    /// The headers pick the body framing: `transfer-encoding: chunked`
    /// switches the writer into streaming mode and records the trailer names
    /// declared in the `trailer` header; a `content-length` header expects
    /// that many raw body bytes; neither means the response is complete.
    pub async fn write_headers(&mut self, headers: HeaderMap) -> Result<(), SendError> {
        ensure!(
            self.state == WriteState::Headers,
            SendError::invalid_sequence("headers must follow the status line exactly once")
        );

        self.state = match BodyMode::from_headers(&headers)? {
            BodyMode::Chunked => {
                self.declared_trailers = declared_trailer_names(&headers);
                WriteState::Streaming
            }
            BodyMode::Length(_) => WriteState::Body,
            BodyMode::Empty => WriteState::Done,
        };
        self.encode(ResponseMessage::Headers(headers))?;
        self.flush().await
    }

    /// Writes raw body bytes of a content-length framed response.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), SendError> {
        ensure!(
            self.state == WriteState::Body,
            SendError::invalid_sequence("body bytes require a content-length header block first")
        );
        self.encode(ResponseMessage::Chunk(Bytes::copy_from_slice(body)))?;
        self.flush().await
    }

    /// Writes a complete buffered response: sets `content-length` to the
    /// exact body length before the headers go out, then status line, header
    /// block and body.
    pub async fn write(&mut self, status: StatusCode, mut headers: HeaderMap, body: &[u8]) -> Result<(), SendError> {
        headers.set("Content-Length", &body.len().to_string());
        self.write_status_line(status).await?;
        self.write_headers(headers).await?;
        if !body.is_empty() {
            self.write_body(body).await?;
        }
        self.encode(ResponseMessage::End)?;
        self.state = WriteState::Done;
        self.flush().await
    }

    /// Opens a chunked response: status line plus a header block that must
    /// carry `transfer-encoding: chunked`. Trailer fields to be sent after
    /// the body must be declared here via the `trailer` header.
    pub async fn start_stream(&mut self, status: StatusCode, headers: HeaderMap) -> Result<(), SendError> {
        ensure!(
            self.state == WriteState::StatusLine,
            SendError::invalid_sequence("start_stream must be the first write")
        );
        ensure!(
            BodyMode::from_headers(&headers)?.is_chunked(),
            SendError::invalid_sequence("start_stream requires transfer-encoding: chunked")
        );
        self.write_status_line(status).await?;
        self.write_headers(headers).await
    }

    /// Writes one body chunk as `<hex-length>\r\n<data>\r\n`. May be called
    /// any number of times; the receiver sees the concatenation of all
    /// chunks. An empty input writes nothing.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<(), SendError> {
        ensure!(self.state == WriteState::Streaming, SendError::invalid_sequence("write_chunk outside a chunked stream"));
        if data.is_empty() {
            return Ok(());
        }
        self.encode(ResponseMessage::Chunk(Bytes::copy_from_slice(data)))?;
        self.flush().await
    }

    /// Writes the terminal `0\r\n` chunk. The trailer block must follow.
    pub async fn end_stream(&mut self) -> Result<(), SendError> {
        ensure!(self.state == WriteState::Streaming, SendError::invalid_sequence("end_stream outside a chunked stream"));
        self.encode(ResponseMessage::End)?;
        self.state = WriteState::Trailers;
        self.flush().await
    }

    /// Writes the trailer lines and the final blank line; the last operation
    /// of a chunked response. Every trailer name must have been declared in
    /// the `trailer` header at [`start_stream`](Self::start_stream) time. An
    /// empty map writes just the blank line.
    pub async fn write_trailers(&mut self, trailers: HeaderMap) -> Result<(), SendError> {
        ensure!(self.state == WriteState::Trailers, SendError::invalid_sequence("trailers must follow end_stream"));
        for (name, _) in trailers.iter() {
            ensure!(
                self.declared_trailers.iter().any(|declared| declared == name),
                SendError::undeclared_trailer(name)
            );
        }
        self.encode(ResponseMessage::Trailers(trailers))?;
        self.state = WriteState::Done;
        self.flush().await
    }

    fn encode(&mut self, message: ResponseMessage) -> Result<(), SendError> {
        self.encoder.encode(message, &mut self.buffer)
    }

    async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.writer.write_all(&self.buffer).await?;
        self.buffer.clear();
        Ok(self.writer.flush().await?)
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("state", &self.state)
            .field("declared_trailers", &self.declared_trailers)
            .finish_non_exhaustive()
    }
}

/// Splits the `trailer` header value into normalized trailer names.
fn declared_trailer_names(headers: &HeaderMap) -> Vec<String> {
    headers
        .get("trailer")
        .map(|value| value.split(',').map(|name| name.trim().to_ascii_lowercase()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::default_headers;
    use tokio::io::{AsyncReadExt, DuplexStream};

    fn pair() -> (ResponseWriter, DuplexStream) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        (ResponseWriter::new(server), client)
    }

    async fn collect(mut client: DuplexStream) -> Vec<u8> {
        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        received
    }

    /// Client-side decode of a buffered response, for round-trip checks.
    fn parse_buffered(raw: &[u8]) -> (String, HeaderMap, Vec<u8>) {
        let head_end = raw.windows(4).position(|w| w == b"\r\n\r\n").expect("head terminator");
        let head = std::str::from_utf8(&raw[..head_end]).unwrap();
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap().to_owned();
        let mut headers = HeaderMap::new();
        for line in lines {
            let (name, value) = line.split_once(':').unwrap();
            headers.add(name, value);
        }
        (status_line, headers, raw[head_end + 4..].to_vec())
    }

    /// Client-side decode of a chunked body plus trailer block.
    fn parse_chunked(mut raw: &[u8]) -> (Vec<u8>, HeaderMap) {
        let mut body = Vec::new();
        loop {
            let line_end = raw.windows(2).position(|w| w == b"\r\n").unwrap();
            let size = usize::from_str_radix(std::str::from_utf8(&raw[..line_end]).unwrap(), 16).unwrap();
            raw = &raw[line_end + 2..];
            if size == 0 {
                break;
            }
            body.extend_from_slice(&raw[..size]);
            assert_eq!(&raw[size..size + 2], b"\r\n");
            raw = &raw[size + 2..];
        }

        let mut trailers = HeaderMap::new();
        while let Some(line_end) = raw.windows(2).position(|w| w == b"\r\n") {
            if line_end == 0 {
                break;
            }
            let line = std::str::from_utf8(&raw[..line_end]).unwrap();
            let (name, value) = line.split_once(':').unwrap();
            trailers.add(name, value);
            raw = &raw[line_end + 2..];
        }
        (body, trailers)
    }

    #[tokio::test]
    async fn buffered_response_round_trips() {
        let (mut writer, client) = pair();

        writer.write(StatusCode::OK, default_headers(0), b"All good, frfr\n").await.unwrap();
        drop(writer);

        let raw = collect(client).await;
        let (status_line, headers, body) = parse_buffered(&raw);

        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(headers.get("content-length"), Some("15"));
        assert_eq!(headers.get("connection"), Some("close"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(body, b"All good, frfr\n");
    }

    #[tokio::test]
    async fn granular_buffered_writes() {
        let (mut writer, client) = pair();

        let mut headers = HeaderMap::new();
        headers.set("Content-Length", "5");
        writer.write_status_line(StatusCode::new(418)).await.unwrap();
        writer.write_headers(headers).await.unwrap();
        writer.write_body(b"short").await.unwrap();
        drop(writer);

        let raw = collect(client).await;
        let (status_line, _, body) = parse_buffered(&raw);

        assert_eq!(status_line, "HTTP/1.1 418 ");
        assert_eq!(body, b"short");
    }

    #[tokio::test]
    async fn chunked_response_round_trips() {
        let (mut writer, client) = pair();

        let mut headers = HeaderMap::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Content-Length, X-Flavor");

        writer.start_stream(StatusCode::OK, headers).await.unwrap();
        writer.write_chunk(b"hello ").await.unwrap();
        writer.write_chunk(b"").await.unwrap();
        writer.write_chunk(b"chunked world").await.unwrap();
        writer.end_stream().await.unwrap();

        let mut trailers = HeaderMap::new();
        trailers.set("X-Content-Length", "19");
        trailers.set("X-Flavor", "vanilla");
        writer.write_trailers(trailers.clone()).await.unwrap();
        drop(writer);

        let raw = collect(client).await;
        let (status_line, headers, rest) = parse_buffered(&raw);
        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(headers.get("transfer-encoding"), Some("chunked"));

        let (body, decoded_trailers) = parse_chunked(&rest);
        assert_eq!(body, b"hello chunked world");
        assert_eq!(decoded_trailers, trailers);
    }

    #[tokio::test]
    async fn empty_stream_is_just_the_zero_chunk() {
        let (mut writer, client) = pair();

        let mut headers = HeaderMap::new();
        headers.set("Transfer-Encoding", "chunked");

        writer.start_stream(StatusCode::OK, headers).await.unwrap();
        writer.end_stream().await.unwrap();
        writer.write_trailers(HeaderMap::new()).await.unwrap();
        drop(writer);

        let raw = collect(client).await;
        let (_, _, rest) = parse_buffered(&raw);
        assert_eq!(rest, b"0\r\n\r\n");
    }

    #[tokio::test]
    async fn undeclared_trailer_is_rejected() {
        let (mut writer, _client) = pair();

        let mut headers = HeaderMap::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Declared");

        writer.start_stream(StatusCode::OK, headers).await.unwrap();
        writer.end_stream().await.unwrap();

        let mut trailers = HeaderMap::new();
        trailers.set("X-Sneaky", "no");
        let err = writer.write_trailers(trailers).await.unwrap_err();

        assert!(matches!(err, SendError::UndeclaredTrailer { name } if name == "x-sneaky"));
    }

    #[tokio::test]
    async fn out_of_order_calls_are_rejected() {
        let (mut writer, _client) = pair();

        let err = writer.write_headers(HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, SendError::InvalidSequence { .. }));

        writer.write_status_line(StatusCode::OK).await.unwrap();
        let err = writer.write_status_line(StatusCode::OK).await.unwrap_err();
        assert!(matches!(err, SendError::InvalidSequence { .. }));

        let err = writer.write_chunk(b"x").await.unwrap_err();
        assert!(matches!(err, SendError::InvalidSequence { .. }));
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_sequence() {
        let (mut writer, client) = pair();
        drop(client);

        let err = writer.write(StatusCode::OK, default_headers(0), b"nobody listening").await.unwrap_err();

        assert!(matches!(err, SendError::Io { .. }));
    }
}
