//! HTTP header decoding.
//!
//! - [`HeaderDecoder`]: accumulates header bytes across calls, enforces the header size
//!   limit and parses the block once the terminator is seen
//! - `RequestTarget`: path, path info and query arguments of a request target

mod header_decoder;
mod target;

pub(crate) use header_decoder::{HeaderDecoder, media_type_essence};
