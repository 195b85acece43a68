//! Parsed request representation.

use bytes::Bytes;

use crate::ensure;
use crate::protocol::headers::HeaderMap;
use crate::protocol::ParseError;

/// The first line of a request: `METHOD SP target SP HTTP/1.1`.
///
/// Invariants enforced at parse time: the method is non-empty and composed
/// solely of uppercase letters, the target is a non-empty opaque string and
/// the version is exactly `"1.1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Parses a request line (without its CRLF) from a string.
    ///
    /// The line is split on single spaces and must hold exactly three
    /// fields; anything else is a [`ParseError::MalformedRequestLine`].
    pub(crate) fn parse(line: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();
        ensure!(parts.len() == 3, ParseError::malformed_request_line(format!("expected 3 fields, got {}", parts.len())));

        let method = parts[0];
        ensure!(
            !method.is_empty() && method.bytes().all(|c| c.is_ascii_uppercase()),
            ParseError::malformed_request_line(format!("method {method:?} is not all-uppercase alphabetic"))
        );

        let target = parts[1];
        ensure!(!target.is_empty(), ParseError::malformed_request_line("empty request target"));

        let version = parts[2]
            .strip_prefix("HTTP/")
            .ok_or_else(|| ParseError::malformed_request_line(format!("protocol {:?} is not HTTP", parts[2])))?;
        ensure!(version == "1.1", ParseError::malformed_request_line(format!("version {version:?} is not 1.1")));

        Ok(Self { method: method.to_owned(), target: target.to_owned(), version: version.to_owned() })
    }
}

/// A fully parsed request: request line, headers and body.
///
/// Produced only once the decoder reaches its done state; no partially
/// parsed request ever escapes the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    pub fn version(&self) -> &str {
        &self.request_line.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_well_formed_line() {
        let line = RequestLine::parse("GET /coffee HTTP/1.1").unwrap();

        assert_eq!(line.method, "GET");
        assert_eq!(line.target, "/coffee");
        assert_eq!(line.version, "1.1");
    }

    #[test]
    fn reject_wrong_field_count() {
        let err = RequestLine::parse("/coffee HTTP/1.1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));

        let err = RequestLine::parse("GET  /coffee HTTP/1.1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[test]
    fn reject_lowercase_method() {
        let err = RequestLine::parse("get /coffee HTTP/1.1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }

    #[test]
    fn reject_wrong_protocol_or_version() {
        let err = RequestLine::parse("GET /coffee FTP/1.1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));

        let err = RequestLine::parse("GET /coffee HTTP/1.0").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine { .. }));
    }
}
