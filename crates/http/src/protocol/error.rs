use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Fatal request parsing errors.
///
/// None of these are retried: the whole parse aborts, no partial request is
/// returned and the parser instance must not be fed again.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("malformed header line: {reason}")]
    MalformedHeaderLine { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body is of length {actual} but content-length specified {declared}")]
    BodyLengthMismatch { declared: u64, actual: u64 },

    #[error("stream ended before the request was complete")]
    IncompleteRequest,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_request_line<S: ToString>(reason: S) -> Self {
        Self::MalformedRequestLine { reason: reason.to_string() }
    }

    pub fn malformed_header_line<S: ToString>(reason: S) -> Self {
        Self::MalformedHeaderLine { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn body_length_mismatch(declared: u64, actual: u64) -> Self {
        Self::BodyLengthMismatch { declared, actual }
    }
}

/// Errors reported while writing a response.
///
/// A transport failure aborts the write sequence; the caller is expected to
/// close the connection rather than retry.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("response sequence violation: {reason}")]
    InvalidSequence { reason: String },

    #[error("trailer {name:?} was not declared in the trailer header")]
    UndeclaredTrailer { name: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_sequence<S: ToString>(reason: S) -> Self {
        Self::InvalidSequence { reason: reason.to_string() }
    }

    pub fn undeclared_trailer<S: ToString>(name: S) -> Self {
        Self::UndeclaredTrailer { name: name.to_string() }
    }
}
