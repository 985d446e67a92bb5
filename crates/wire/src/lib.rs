//! Incremental wire decoders for HTTP/1.x and WebSocket
//!
//! This crate turns an arbitrarily fragmented byte stream into complete HTTP/1.x messages
//! and WebSocket messages. Every decoder follows the same contract: feed it any number of
//! bytes, it tells you how many it consumed and whether the message is done. Nothing here
//! performs I/O; the transport owns the socket and feeds the decoders.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 requests and responses, one header parse per message
//! - Content-Length, chunked and read-until-close bodies, with optional detection of
//!   chunked bodies sent without a `Transfer-Encoding` header
//! - `multipart/form-data` extraction, nested `multipart/mixed` included
//! - WebSocket frames with 7, 16 and 64 bit lengths, masking and fragmentation
//! - Hard size limits on headers and content, checked on every append
//! - [`tokio_util::codec`] adapters for use with `FramedRead` / `FramedWrite`
//!
//! # Example
//!
//! ```
//! use micro_wire::codec::HttpDecoder;
//!
//! let mut decoder = HttpDecoder::new();
//! let stream: [&[u8]; 3] = [b"GET /ind", b"ex.html HTTP/1.1\r\nHost: exam", b"ple.com\r\n\r\n"];
//!
//! for fragment in stream {
//!     let consumed = decoder.process_bytes(fragment).unwrap();
//!     assert_eq!(consumed, fragment.len());
//! }
//!
//! assert!(decoder.is_finished());
//! assert_eq!(decoder.header().path(), "/index.html");
//! assert_eq!(decoder.header().host(), "example.com");
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: headers, messages, multipart parts, snapshots and error types
//! - [`codec`]: the HTTP decoder, its `tokio-util` adapter and stateless helpers
//! - [`websocket`]: the WebSocket frame decoder, encoder and `tokio-util` adapter
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: fatal HTTP decoding errors
//! - [`protocol::WebSocketError`]: fatal WebSocket decoding errors
//!
//! Needing more data is never an error: the decoders simply report everything consumed
//! and not finished.
//!
//! # Limitations
//!
//! - HTTP/1.x framing only; `HTTP/2` is accepted as a version label but not spoken
//! - No WebSocket extensions and no masked (client side) frame encoding
//! - Default maximum header size: 100 KiB, content: 100 MiB, WebSocket message: 10 MiB
//! - Maximum number of header fields: 128

pub mod codec;
pub mod protocol;
pub mod websocket;

mod utils;
pub(crate) use utils::ensure;
