//! WebSocket (RFC 6455) framing.
//!
//! - [`WebSocketDecoder`]: incremental decoder for one logical message, fragmented or not
//! - [`encode`] / [`encode_close`]: unmasked server frames
//! - [`WebSocketCodec`]: [`tokio_util::codec`] adapter for both directions
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_wire::websocket::{Opcode, WebSocketDecoder, encode};
//!
//! let mut frame = BytesMut::new();
//! encode(b"ping!", Opcode::Text, &mut frame);
//!
//! let mut decoder = WebSocketDecoder::new();
//! assert_eq!(decoder.process(&frame).unwrap(), frame.len());
//! assert!(decoder.is_finished());
//! assert_eq!(decoder.content(), b"ping!");
//! ```

mod codec;
mod decoder;
mod encoder;
mod header;

pub use codec::WebSocketCodec;
pub use decoder::{MAX_WEBSOCKET_CONTENT_SIZE, WebSocketDecoder, WebSocketMessage};
pub use encoder::{encode, encode_close};
pub use header::{MAX_FRAME_HEADER_LEN, Opcode, WebSocketHeader};
