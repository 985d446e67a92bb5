use bytes::Bytes;

use crate::protocol::HttpHeader;

/// A fully decoded HTTP message, as yielded by [`crate::codec::HttpCodec`].
#[derive(Debug, Clone)]
pub struct HttpMessage {
    pub header: HttpHeader,
    /// The assembled body, without the sealing NUL byte.
    pub content: Bytes,
}

impl HttpMessage {
    pub fn new(header: HttpHeader, content: Bytes) -> Self {
        Self { header, content }
    }

    /// Returns true if the body is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the body as text if it is valid UTF-8
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    pub fn into_parts(self) -> (HttpHeader, Bytes) {
        (self.header, self.content)
    }
}
