//! HTTP/1.x message decoding.
//!
//! # Architecture
//!
//! - [`HttpDecoder`]: the incremental message decoder, fed any fragmentation of the stream
//!   - Header parsing via the `header` module
//!   - Body decoding via the `body` module (Content-Length, chunked, until close)
//! - [`HttpCodec`]: [`tokio_util::codec::Decoder`] adapter yielding
//!   [`HttpMessage`](crate::protocol::HttpMessage)s
//! - [`decode_multipart`]: splits `multipart/form-data` content into
//!   [`FormData`](crate::protocol::FormData) parts
//! - [`helpers`]: stateless URL and header text helpers
//!
//! # Example
//!
//! ```
//! use micro_wire::codec::{HttpDecoder, HttpDecoderConfig};
//!
//! let config = HttpDecoderConfig::default().max_content_size(1024);
//! let mut decoder = HttpDecoder::with_config(config);
//!
//! let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n0\r\n\r\n";
//! for byte in input {
//!     decoder.process_bytes(std::slice::from_ref(byte)).unwrap();
//! }
//! assert!(decoder.is_finished());
//! assert_eq!(decoder.content(), b"Wiki");
//! ```

mod body;
mod config;
mod header;
mod http_codec;
mod http_decoder;
mod multipart;

pub mod helpers;

pub use config::{DEFAULT_MAX_CONTENT_SIZE, DEFAULT_MAX_HEADER_SIZE, HttpDecoderConfig};
pub use http_codec::HttpCodec;
pub use http_decoder::{HttpDecoder, SNIFF_LEN};
pub use multipart::{MAX_MULTIPART_DEPTH, decode_multipart};
