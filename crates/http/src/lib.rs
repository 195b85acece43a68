//! An incremental HTTP/1.1 message parser and streaming response writer
//!
//! This crate implements the wire layer of a small HTTP/1.1 server: a request
//! parser that reconstructs a structured [`protocol::Request`] from a byte
//! stream delivered in arbitrary-sized reads (a read may return one byte or
//! 64KB, and a CRLF may straddle two reads), and a response writer that frames
//! a body either as a single content-length block or as a chunked stream
//! terminated by a zero-length chunk and a trailer block.
//!
//! Parsing never assumes the full message is buffered at once: the decoder is
//! driven through [`tokio_util::codec::FramedRead`], consumes as much of the
//! buffered prefix as it can per call, and reports "need more data" otherwise.
//!
//! # Example
//!
//! ```no_run
//! use http1_wire::connection::ResponseWriter;
//! use http1_wire::handler::make_handler;
//! use http1_wire::protocol::{Request, SendError, StatusCode, default_headers};
//! use http1_wire::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::serve("127.0.0.1:42069", make_handler(hello)).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await;
//!     Ok(())
//! }
//!
//! async fn hello(mut writer: ResponseWriter, request: Request) -> Result<(), SendError> {
//!     let body = format!("you asked for {}\n", request.target());
//!     let headers = default_headers(body.len());
//!     writer.write(StatusCode::OK, headers, body.as_bytes()).await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: header map, request/status types and error types
//! - [`codec`]: the request decoder and response encoder state machines
//! - [`connection`]: per-connection driver and the [`connection::ResponseWriter`]
//! - [`handler`]: request handler trait and utilities
//! - [`server`]: TCP accept loop collaborator
//!
//! # Limitations
//!
//! - One request and one response per connection; no keep-alive, no pipelining
//! - No TLS and no HTTP/2+
//! - Request targets are opaque strings; no URI or query decoding
//! - No timeout support: an unresponsive peer mid-headers blocks its
//!   connection task indefinitely

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
