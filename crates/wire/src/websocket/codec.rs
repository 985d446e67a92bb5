//! [`tokio_util::codec`] adapters over [`WebSocketDecoder`] and [`encode`].

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::WebSocketError;
use crate::websocket::decoder::{WebSocketDecoder, WebSocketMessage};
use crate::websocket::encoder::encode;

/// Decodes client frames into [`WebSocketMessage`]s and encodes server frames.
#[derive(Debug, Default)]
pub struct WebSocketCodec {
    decoder: WebSocketDecoder,
}

impl WebSocketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decoder(&self) -> &WebSocketDecoder {
        &self.decoder
    }
}

impl Decoder for WebSocketCodec {
    type Item = WebSocketMessage;
    type Error = WebSocketError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let consumed = self.decoder.process(src)?;
        src.advance(consumed);
        Ok(self.decoder.take())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        if self.decoder.raw_header().is_empty() && self.decoder.content_size() == 0 {
            Ok(None)
        } else {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed inside a websocket frame").into())
        }
    }
}

impl Encoder<WebSocketMessage> for WebSocketCodec {
    type Error = WebSocketError;

    fn encode(&mut self, item: WebSocketMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode(&item.payload, item.opcode, dst);
        Ok(())
    }
}
