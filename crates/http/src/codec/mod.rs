//! Codec layer: the request decoder and response encoder state machines.
//!
//! Both sides speak through `tokio_util::codec` traits. The
//! [`RequestDecoder`] plugs into a `FramedRead`, which supplies the growable
//! read buffer and the compact-after-consume step; the [`ResponseEncoder`]
//! serializes writer operations into a staging buffer that is flushed to the
//! transport by the response writer.

mod body;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
