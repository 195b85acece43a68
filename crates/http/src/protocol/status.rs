//! Response status codes.

use std::fmt;

use crate::protocol::headers::HeaderMap;

/// An HTTP response status code.
///
/// The three codes this server emits itself carry their canonical reason
/// phrase; any other code is written with an empty reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// The canonical reason phrase, or `""` for codes this server has no
    /// phrase for.
    pub fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The default response header set: exact `content-length`,
/// `connection: close` and a plain-text content type.
pub fn default_headers(content_length: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.set("Content-Length", &content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}
