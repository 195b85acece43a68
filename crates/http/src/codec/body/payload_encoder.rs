use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{BodyMode, HeaderMap, PayloadItem, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;

/// Encodes a response body according to its framing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length payload
    Length(LengthEncoder),

    /// transfer-encoding chunked payload
    Chunked(ChunkedEncoder),

    /// the response has no body
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(&self.kind, Kind::Chunked(_))
    }

    /// True once the body is fully written: the declared length is exhausted,
    /// the zero chunk went out, or there was no body to begin with.
    pub fn is_finish(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finish(),
            Kind::Chunked(encoder) => encoder.is_finish(),
            Kind::NoBody => true,
        }
    }

    /// Writes the trailer block of a chunked body.
    ///
    /// Only legal on a chunked encoder that has already written its zero
    /// chunk.
    pub fn encode_trailers(&mut self, trailers: &HeaderMap, dst: &mut BytesMut) -> Result<(), SendError> {
        match &mut self.kind {
            Kind::Chunked(encoder) if encoder.is_finish() => {
                encoder.encode_trailers(trailers, dst);
                Ok(())
            }
            Kind::Chunked(_) => Err(SendError::invalid_sequence("trailers before the zero chunk")),
            _ => Err(SendError::invalid_sequence("trailers on a non-chunked body")),
        }
    }
}

impl From<BodyMode> for PayloadEncoder {
    fn from(mode: BodyMode) -> Self {
        match mode {
            BodyMode::Length(size) => PayloadEncoder::fix_length(size),
            BodyMode::Chunked => PayloadEncoder::chunked(),
            BodyMode::Empty => PayloadEncoder::empty(),
        }
    }
}

impl Encoder<PayloadItem> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::NoBody => Ok(()),
        }
    }
}
