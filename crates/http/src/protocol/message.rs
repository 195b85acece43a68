//! Wire-level message items exchanged with the response encoder.

use bytes::Bytes;

use crate::protocol::headers::HeaderMap;
use crate::protocol::status::StatusCode;
use crate::protocol::SendError;

/// One unit of work for the response encoder, mirroring the writer's
/// operations: status line, header block, body bytes, end of body and the
/// trailer block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMessage {
    /// The status line, written first and exactly once.
    Status(StatusCode),
    /// The header block followed by its terminating blank line; selects how
    /// the body will be framed.
    Headers(HeaderMap),
    /// Body bytes: raw in length mode, hex-length framed in chunked mode.
    Chunk(Bytes),
    /// End of body; writes the terminal `0\r\n` in chunked mode.
    End,
    /// Trailer block closing a chunked response.
    Trailers(HeaderMap),
}

/// How a response body is framed on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyMode {
    /// Exactly this many raw body bytes follow the headers.
    Length(u64),
    /// Hex-length-prefixed chunks followed by a zero chunk and trailers.
    Chunked,
    /// No body at all.
    Empty,
}

impl BodyMode {
    /// Derives the framing from a response header set.
    ///
    /// `transfer-encoding: chunked` wins over `content-length`; a header set
    /// declaring neither frames an empty body.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SendError> {
        if headers.get("transfer-encoding").is_some_and(is_chunked) {
            return Ok(BodyMode::Chunked);
        }

        match headers.get("content-length") {
            Some(value) => {
                let length = value
                    .parse::<u64>()
                    .map_err(|_| SendError::invalid_sequence(format!("content-length {value:?} is not a non-negative integer")))?;
                Ok(BodyMode::Length(length))
            }
            None => Ok(BodyMode::Empty),
        }
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, BodyMode::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, BodyMode::Empty)
    }
}

/// An item of a body stream: a chunk of data or the end-of-body marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    Chunk(Bytes),
    Eof,
}

impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }
}

/// Chunked must be the final listed transfer coding to terminate the message.
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|coding| coding.trim() == "chunked")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.set(name, value);
        headers
    }

    #[test]
    fn body_mode_from_headers() {
        assert_eq!(BodyMode::from_headers(&headers_with("Content-Length", "13")).unwrap(), BodyMode::Length(13));
        assert_eq!(BodyMode::from_headers(&headers_with("Transfer-Encoding", "chunked")).unwrap(), BodyMode::Chunked);
        assert_eq!(BodyMode::from_headers(&headers_with("Transfer-Encoding", "gzip, chunked")).unwrap(), BodyMode::Chunked);
        assert_eq!(BodyMode::from_headers(&headers_with("Transfer-Encoding", "chunked, gzip")).unwrap(), BodyMode::Empty);
        assert_eq!(BodyMode::from_headers(&HeaderMap::new()).unwrap(), BodyMode::Empty);
    }

    #[test]
    fn bad_content_length_is_rejected() {
        let err = BodyMode::from_headers(&headers_with("Content-Length", "a lot")).unwrap_err();
        assert!(matches!(err, SendError::InvalidSequence { .. }));
    }
}
