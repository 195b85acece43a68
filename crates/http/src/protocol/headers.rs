//! Case-insensitive multi-valued header storage with an incremental
//! single-line parser.
//!
//! Header names are normalized to lower case on insertion and lookup. A name
//! set more than once keeps a single value, the individual values joined with
//! `", "`, which is how HTTP/1.1 folds repeated fields into one line.
//!
//! [`HeaderMap::parse_line`] consumes at most one header line per call and is
//! the building block the request decoder loops over while more buffered
//! input is available.

use std::collections::HashMap;

use crate::ensure;
use crate::protocol::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Case-insensitive header map used for request headers, response headers
/// and trailers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    inner: HashMap<String, String>,
}

/// Outcome of feeding one buffered prefix to [`HeaderMap::parse_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineParse {
    /// No full line is buffered yet; zero bytes were consumed and the caller
    /// must supply more input.
    Incomplete,
    /// One field line was parsed and merged; the given number of bytes
    /// (line plus CRLF) was consumed.
    Field(usize),
    /// The bare-CRLF header terminator was consumed; the header block is over.
    End(usize),
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&normalize(name)).map(String::as_str)
    }

    /// Inserts the value, replacing whatever was stored under the name.
    pub fn set(&mut self, name: &str, value: &str) {
        self.inner.insert(normalize(name), value.trim().to_owned());
    }

    /// Merge-appends the value: a repeated name keeps the existing value and
    /// joins the new one with `", "`.
    pub fn add(&mut self, name: &str, value: &str) {
        let value = value.trim();
        self.inner
            .entry(normalize(name))
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.remove(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over `(name, value)` pairs; names are the stored lower-cased
    /// forms and the order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Parses at most one header line from the unconsumed buffer prefix.
    ///
    /// The input may hold more than one line; only the first is consumed.
    /// A line that fails validation leaves the map untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedHeaderLine`] when the line has no
    /// colon, when a space sits between the field name and the colon, or when
    /// the field name is empty or holds a character outside the token set.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<LineParse, ParseError> {
        let Some(idx) = find_crlf(data) else {
            return Ok(LineParse::Incomplete);
        };

        if idx == 0 {
            return Ok(LineParse::End(CRLF.len()));
        }

        let line = std::str::from_utf8(&data[..idx])
            .map_err(|_| ParseError::malformed_header_line("line is not valid utf-8"))?;

        let (name, value) = line
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseError::malformed_header_line(format!("no colon in {line:?}")))?;

        ensure!(
            !name.ends_with(' '),
            ParseError::malformed_header_line(format!("space between field name and colon in {line:?}"))
        );
        ensure!(
            is_valid_field_name(name),
            ParseError::malformed_header_line(format!("invalid field name {name:?}"))
        );

        self.add(name, value);
        Ok(LineParse::Field(idx + CRLF.len()))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Finds the offset of the next CRLF, if one is fully buffered.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}

/// Checks the field name against the token character set of RFC 9110:
/// letters, digits and `! # $ % & ' * + - . ^ _ ` | ~`.
fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|c| {
            matches!(c,
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
                | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+'
                | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_header() {
        let mut headers = HeaderMap::new();
        let data = b"Host: localhost:42069\r\n\r\n";

        let outcome = headers.parse_line(data).unwrap();

        assert_eq!(outcome, LineParse::Field(23));
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn parse_header_with_extra_whitespace() {
        let mut headers = HeaderMap::new();
        let data = b"       Host: localhost:42069       \r\n\r\n";

        let outcome = headers.parse_line(data).unwrap();

        assert_eq!(outcome, LineParse::Field(37));
        assert_eq!(headers.get("host"), Some("localhost:42069"));
    }

    #[test]
    fn parse_incomplete_line_consumes_nothing() {
        let mut headers = HeaderMap::new();

        let outcome = headers.parse_line(b"Host: localhost").unwrap();

        assert_eq!(outcome, LineParse::Incomplete);
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_terminator() {
        let mut headers = HeaderMap::new();

        let outcome = headers.parse_line(b"\r\nHost: after-the-end\r\n").unwrap();

        assert_eq!(outcome, LineParse::End(2));
        assert!(headers.is_empty());
    }

    #[test]
    fn missing_colon_is_fatal_and_leaks_no_state() {
        let mut headers = HeaderMap::new();

        let err = headers.parse_line(b"Host localhost\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MalformedHeaderLine { .. }));
        assert!(headers.is_empty());
    }

    #[test]
    fn space_before_colon_is_fatal() {
        let mut headers = HeaderMap::new();

        let err = headers.parse_line(b"Host : localhost:42069\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MalformedHeaderLine { .. }));
        assert!(headers.is_empty());
    }

    #[test]
    fn invalid_field_name_character_is_fatal() {
        let mut headers = HeaderMap::new();

        let err = headers.parse_line(b"H\xc2\xa9st: localhost:42069\r\n").unwrap_err();

        assert!(matches!(err, ParseError::MalformedHeaderLine { .. }));
    }

    #[test]
    fn unusual_token_characters_are_allowed() {
        let mut headers = HeaderMap::new();

        let outcome = headers.parse_line(b"X-Custom#Key.1: some value\r\n").unwrap();

        assert!(matches!(outcome, LineParse::Field(_)));
        assert_eq!(headers.get("x-custom#key.1"), Some("some value"));
    }

    #[test]
    fn repeated_name_merges_comma_joined() {
        let mut headers = HeaderMap::new();

        headers.add("Set-Person", "a");
        headers.add("set-person", "b");

        assert_eq!(headers.get("Set-Person"), Some("a, b"));
    }

    #[test]
    fn set_overwrites() {
        let mut headers = HeaderMap::new();

        headers.set("Content-Type", "text/plain");
        headers.set("content-type", "text/html");

        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();

        headers.set("X-Request-Id", "42");

        assert_eq!(headers.get("x-request-id"), Some("42"));
        assert_eq!(headers.get("X-REQUEST-ID"), Some("42"));
    }
}
