//! Encoder for chunked transfer encoding.
//!
//! Each chunk goes out as `<hex-length>\r\n<data>\r\n`. The end-of-body
//! marker writes only the terminal `0\r\n`; the trailer block (declared
//! header lines plus the final blank line) is written separately so trailers
//! computed while the body streamed can still be attached.

use crate::protocol::{HeaderMap, PayloadItem, SendError};
use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Writes the trailer block: one `name: value` line per trailer, then the
    /// blank line that terminates the response. An empty map produces just
    /// the blank line.
    pub fn encode_trailers(&mut self, trailers: &HeaderMap, dst: &mut BytesMut) {
        for (name, value) in trailers.iter() {
            dst.extend_from_slice(name.as_bytes());
            dst.extend_from_slice(b": ");
            dst.extend_from_slice(value.as_bytes());
            dst.extend_from_slice(b"\r\n");
        }
        dst.extend_from_slice(b"\r\n");
    }
}

impl Encoder<PayloadItem> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload_item after the zero chunk was written");
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if bytes.is_empty() {
                    return Ok(());
                }
                write!(helper::Writer(dst), "{:X}\r\n", bytes.len())?;
                dst.reserve(bytes.len() + 2);
                dst.extend_from_slice(&bytes);
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
