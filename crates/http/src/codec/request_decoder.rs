//! Incremental HTTP/1.1 request decoder.
//!
//! The decoder is a buffered state machine driven through
//! [`tokio_util::codec::FramedRead`]: each call consumes as much of the
//! unconsumed buffer prefix as it can and reports how many bytes it took, so
//! the framing layer can compact the buffer and read more. Nothing here
//! assumes a full message is buffered at once; every delimiter, including a
//! CRLF, may arrive split across reads.
//!
//! # State machine
//!
//! ```text
//! RequestLine --CRLF--> Headers --bare CRLF--> Body --declared length--> Done
//! ```
//!
//! State only moves forward. Any violation is a fatal [`ParseError`]; the
//! decoder must not be fed again afterwards and no partial request escapes.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{HeaderMap, LineParse, ParseError, Request, RequestLine, find_crlf};

const CRLF_LEN: usize = 2;

/// A decoder producing one [`Request`] per completed message.
#[derive(Debug)]
pub struct RequestDecoder {
    state: ParseState,
    request_line: Option<RequestLine>,
    headers: HeaderMap,
    content_length: Option<u64>,
    body: BytesMut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    RequestLine,
    Headers,
    Body,
    Done,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Runs one sub-step of the state machine on the unconsumed prefix,
    /// returning how many bytes it irreversibly consumed. Zero means the
    /// current record is incomplete and more input is needed.
    fn parse_step(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::RequestLine => self.parse_request_line(data),
            ParseState::Headers => self.parse_header_line(data),
            ParseState::Body => self.parse_body(data),
            ParseState::Done => Ok(0),
        }
    }

    fn parse_request_line(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let Some(idx) = find_crlf(data) else {
            return Ok(0);
        };

        let line = std::str::from_utf8(&data[..idx])
            .map_err(|_| ParseError::malformed_request_line("line is not valid utf-8"))?;
        let request_line = RequestLine::parse(line)?;

        trace!(method = %request_line.method, target = %request_line.target, "parsed request line");
        self.request_line = Some(request_line);
        self.state = ParseState::Headers;
        Ok(idx + CRLF_LEN)
    }

    fn parse_header_line(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.headers.parse_line(data)? {
            LineParse::Incomplete => Ok(0),
            LineParse::Field(consumed) => Ok(consumed),
            LineParse::End(consumed) => {
                self.content_length = self.parse_content_length()?;
                trace!(headers = self.headers.len(), content_length = ?self.content_length, "parsed header block");
                self.state = ParseState::Body;
                Ok(consumed)
            }
        }
    }

    fn parse_content_length(&self) -> Result<Option<u64>, ParseError> {
        match self.headers.get("content-length") {
            None => Ok(None),
            Some(value) => {
                let length = value.parse::<u64>().map_err(|_| {
                    ParseError::invalid_content_length(format!("value {value:?} is not a non-negative integer"))
                })?;
                Ok(Some(length))
            }
        }
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let Some(declared) = self.content_length else {
            // no length header: the body is defined empty and anything left
            // over is discarded
            self.state = ParseState::Done;
            return Ok(data.len());
        };

        self.body.extend_from_slice(data);
        let accumulated = self.body.len() as u64;
        ensure!(accumulated <= declared, ParseError::body_length_mismatch(declared, accumulated));

        if accumulated == declared {
            self.state = ParseState::Done;
        }
        Ok(data.len())
    }

    fn take_request(&mut self) -> Request {
        // only reachable in the Done state, where the request line is set
        let request_line = self.request_line.take().unwrap();
        let headers = std::mem::take(&mut self.headers);
        let body = std::mem::take(&mut self.body).freeze();

        self.state = ParseState::RequestLine;
        self.content_length = None;

        Request { request_line, headers, body }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self {
            state: ParseState::RequestLine,
            request_line: None,
            headers: HeaderMap::new(),
            content_length: None,
            body: BytesMut::new(),
        }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Consumes as much of the buffer as possible in one call.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))` once the message reached its done state
    /// - `Ok(None)` when more data is needed
    /// - `Err(_)` on the first malformed byte; the whole parse aborts
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut consumed = 0;

        while self.state != ParseState::Done {
            let n = self.parse_step(&src[consumed..])?;
            if n == 0 {
                break;
            }
            consumed += n;
        }
        src.advance(consumed);

        if self.state == ParseState::Done {
            Ok(Some(self.take_request()))
        } else {
            Ok(None)
        }
    }

    /// Called at end of stream: a connection that closes mid-message yields
    /// [`ParseError::IncompleteRequest`] instead of a truncated request.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None if self.state == ParseState::RequestLine && src.is_empty() => {
                // clean close before any request bytes arrived
                Ok(None)
            }
            None => Err(ParseError::IncompleteRequest),
        }
    }
}
