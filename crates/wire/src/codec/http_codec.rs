//! [`tokio_util::codec::Decoder`] adapter over [`HttpDecoder`].
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_wire::codec::HttpCodec;
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = HttpCodec::new();
//! let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r\nGET /b HTTP/1.1\r\n\r\n"[..]);
//!
//! let first = codec.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(first.header.path(), "/");
//! let second = codec.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(second.header.path(), "/b");
//! assert!(buffer.is_empty());
//! ```

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::codec::config::HttpDecoderConfig;
use crate::codec::http_decoder::HttpDecoder;
use crate::protocol::{HttpMessage, ParseError};

/// Yields one [`HttpMessage`] per complete request or response in the stream.
#[derive(Debug, Default)]
pub struct HttpCodec {
    decoder: HttpDecoder,
    sniff_chunked_xml: bool,
    sniff_chunked_json: bool,
}

impl HttpCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HttpDecoderConfig) -> Self {
        Self { decoder: HttpDecoder::with_config(config), ..Self::default() }
    }

    /// Enables detection of chunked bodies sent without a `Transfer-Encoding` header.
    #[must_use]
    pub fn sniff_chunked(mut self, xml: bool, json: bool) -> Self {
        self.sniff_chunked_xml = xml;
        self.sniff_chunked_json = json;
        self
    }

    pub fn decoder(&self) -> &HttpDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut HttpDecoder {
        &mut self.decoder
    }
}

impl Decoder for HttpCodec {
    type Item = HttpMessage;
    type Error = ParseError;

    /// Consumes as much of `src` as the current message needs.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))` once a message is complete; bytes of the next message stay in `src`
    /// - `Ok(None)` if more data is needed
    /// - `Err(_)` on a fatal parse error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let consumed = self.decoder.process(src, self.sniff_chunked_xml, self.sniff_chunked_json)?;
        src.advance(consumed);
        Ok(self.decoder.take())
    }

    /// A body of unknown length ends with the stream. Anything else left incomplete is an
    /// unexpected EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        if !self.decoder.header_processing_started() {
            return Ok(None);
        }

        if self.decoder.header_is_finished() {
            self.decoder.set_finished();
            return Ok(self.decoder.take());
        }

        debug!(raw_header_size = self.decoder.raw_header().len(), "stream closed inside a header");
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed before the header was complete").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn pipelined_messages() {
        let input = indoc! {"
            POST /a HTTP/1.1\r
            Content-Length: 3\r
            \r
            abcPOST /b HTTP/1.1\r
            Transfer-Encoding: chunked\r
            \r
            2\r
            de\r
            0\r
            \r
        "};

        let mut codec = HttpCodec::new();
        let mut src = BytesMut::from(input);

        let first = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(first.header.path(), "/a");
        assert_eq!(&first.content[..], b"abc");

        let second = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(second.header.path(), "/b");
        assert_eq!(&second.content[..], b"de");

        assert!(src.is_empty());
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn body_until_eof() {
        let mut codec = HttpCodec::new();
        let mut src = BytesMut::from(&b"HTTP/1.0 200 OK\r\n\r\nstreamed"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(src.is_empty());

        let message = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(&message.content[..], b"streamed");
        assert!(codec.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn sniffed_bytes_survive_eof() {
        let mut codec = HttpCodec::new().sniff_chunked(true, true);
        let mut src = BytesMut::from(&b"HTTP/1.0 200 OK\r\n\r\nshort"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        let message = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(&message.content[..], b"short");
    }

    #[test]
    fn eof_inside_header() {
        let mut codec = HttpCodec::new();
        let mut src = BytesMut::from(&b"GET / HTTP/1.1\r\nHost"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(matches!(codec.decode_eof(&mut src), Err(ParseError::Io { .. })));
    }
}
