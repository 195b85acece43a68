//! Core protocol types: headers, requests, status codes, wire messages and
//! error types.
//!
//! The parsing side is built from [`HeaderMap`]'s incremental line parser and
//! the [`Request`] types; the sending side from the [`ResponseMessage`]
//! items fed to the response encoder. Errors follow the
//! split the rest of the crate uses: [`ParseError`] for everything on the
//! read path, [`SendError`] for the write path, [`HttpError`] wrapping both.

mod headers;
pub use headers::HeaderMap;
pub use headers::LineParse;
pub(crate) use headers::find_crlf;

mod request;
pub use request::Request;
pub use request::RequestLine;

mod status;
pub use status::StatusCode;
pub use status::default_headers;

mod message;
pub use message::BodyMode;
pub use message::PayloadItem;
pub use message::ResponseMessage;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
