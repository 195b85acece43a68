//! Response body encoders.
//!
//! - [`ChunkedEncoder`]: chunked transfer encoding with a trailer block
//! - [`LengthEncoder`]: content-length framed payloads
//! - [`PayloadEncoder`]: dispatches to the right strategy per [`BodyMode`]
//!
//! [`ChunkedEncoder`]: chunked_encoder::ChunkedEncoder
//! [`LengthEncoder`]: length_encoder::LengthEncoder
//! [`BodyMode`]: crate::protocol::BodyMode

mod chunked_encoder;
mod length_encoder;
mod payload_encoder;

pub use payload_encoder::PayloadEncoder;
