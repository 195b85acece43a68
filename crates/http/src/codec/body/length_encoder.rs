//! Encoder for content-length framed bodies: raw bytes, no framing, with the
//! remaining byte budget tracked against the declared length.

use std::cmp;

use crate::protocol::{PayloadItem, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    remaining: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    pub fn is_finish(&self) -> bool {
        self.remaining == 0
    }
}

impl Encoder<PayloadItem> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }

                // never write past the declared content-length
                let writable = cmp::min(self.remaining, bytes.len() as u64) as usize;
                if writable < bytes.len() {
                    warn!(extra = bytes.len() - writable, "body bytes beyond the declared content-length were dropped");
                }

                dst.extend_from_slice(&bytes[..writable]);
                self.remaining -= writable as u64;
                Ok(())
            }
            PayloadItem::Eof => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn writes_raw_bytes_up_to_the_declared_length() {
        let mut encoder = LengthEncoder::new(5);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello, world")), &mut dst).unwrap();

        assert_eq!(&dst[..], b"hello");
        assert!(encoder.is_finish());
    }
}
