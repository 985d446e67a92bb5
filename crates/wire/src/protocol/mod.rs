//! Protocol level types shared by the decoders.
//!
//! - [`HttpHeader`] and its token sets ([`TransferEncoding`], [`Connection`], ...)
//! - [`HttpMessage`]: a decoded header together with its body
//! - [`FormData`]: one decoded `multipart/form-data` part
//! - [`HttpSnapshot`]: serializable capture of an in-flight HTTP decode
//! - Error types: [`ParseError`] for HTTP and [`WebSocketError`] for frames

mod header;
pub use header::AcceptEncoding;
pub use header::Connection;
pub use header::ContentEncoding;
pub use header::HttpHeader;
pub use header::MessageKind;
pub use header::TransferEncoding;

mod message;
pub use message::HttpMessage;

mod form_data;
pub use form_data::FormData;

mod snapshot;
pub use snapshot::HttpSnapshot;

mod error;
pub use error::ParseError;
pub use error::WebSocketError;
