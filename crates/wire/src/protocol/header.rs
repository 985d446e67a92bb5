//! Parsed HTTP message header.
//!
//! [`HttpHeader`] is the immutable result of parsing one request or response header
//! block. Besides the raw field map it carries the structured values the decoder
//! needs to frame the body (content length, transfer encoding) and the values most
//! handlers look at (path, query, cookies, encodings).

use std::collections::HashMap;
use std::net::IpAddr;

use http::{HeaderMap, Method, StatusCode, Version};

/// Generates a small bit set over a fixed vocabulary of lower-case header tokens.
macro_rules! token_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$item_meta:meta])* $item:ident = $bit:literal => $token:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u8);

        impl $name {
            /// The empty set.
            pub const NONE: Self = Self(0);
            $($(#[$item_meta])* pub const $item: Self = Self($bit);)*

            /// Looks up a single lower-case token.
            pub fn from_token(token: &str) -> Option<Self> {
                match token {
                    $($token => Some(Self::$item),)*
                    _ => None,
                }
            }

            /// Returns true if every bit of `other` is set. The empty set is never contained.
            pub fn contains(self, other: Self) -> bool {
                other.0 != 0 && self.0 & other.0 == other.0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn bits(self) -> u8 {
                self.0
            }

            /// Parses a comma separated list, ignoring `;` parameters.
            ///
            /// Returns the first unknown token as the error.
            pub(crate) fn parse_list(value: &str) -> Result<Self, String> {
                let mut set = Self::NONE;
                for token in list_tokens(value) {
                    match Self::from_token(&token) {
                        Some(item) => set |= item,
                        None => return Err(token),
                    }
                }
                Ok(set)
            }

            /// Like [`Self::parse_list`] but silently skips unknown tokens.
            pub(crate) fn parse_list_lenient(value: &str) -> Self {
                list_tokens(value).filter_map(|token| Self::from_token(&token)).fold(Self::NONE, |set, item| set | item)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

fn list_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|token| token.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
}

token_set! {
    /// Codings a client is willing to accept (`Accept-Encoding`).
    AcceptEncoding {
        GZIP = 0x01 => "gzip",
        DEFLATE = 0x02 => "deflate",
        BR = 0x04 => "br",
        COMPRESS = 0x08 => "compress",
        IDENTITY = 0x10 => "identity",
        ZSTD = 0x20 => "zstd",
        ANY = 0x40 => "*",
    }
}

token_set! {
    /// Codings applied to the representation (`Content-Encoding`).
    ContentEncoding {
        GZIP = 0x01 => "gzip",
        DEFLATE = 0x02 => "deflate",
        COMPRESS = 0x04 => "compress",
        BR = 0x08 => "br",
        IDENTITY = 0x10 => "identity",
    }
}

token_set! {
    /// Transfer codings (`Transfer-Encoding` and `TE`).
    TransferEncoding {
        CHUNKED = 0x01 => "chunked",
        COMPRESS = 0x02 => "compress",
        DEFLATE = 0x04 => "deflate",
        GZIP = 0x08 => "gzip",
        IDENTITY = 0x10 => "identity",
        TRAILERS = 0x20 => "trailers",
    }
}

token_set! {
    /// Connection options. The `te` option is accepted and ignored.
    Connection {
        KEEP_ALIVE = 0x01 => "keep-alive",
        CLOSE = 0x02 => "close",
        UPGRADE = 0x04 => "upgrade",
        TE = 0x08 => "te",
    }
}

impl TransferEncoding {
    /// `compress`, `deflate` and `gzip` are only ever seen wrapped in chunked framing.
    pub(crate) fn with_implied_chunked(self) -> Self {
        if self.contains(Self::COMPRESS) || self.contains(Self::DEFLATE) || self.contains(Self::GZIP) {
            self | Self::CHUNKED
        } else {
            self
        }
    }

    pub fn is_chunked(self) -> bool {
        self.contains(Self::CHUNKED)
    }
}

/// Whether a header block started with a request line or a status line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MessageKind {
    #[default]
    Request,
    Response,
}

/// A parsed HTTP/1.x request or response header.
#[derive(Debug, Default, Clone)]
pub struct HttpHeader {
    pub(crate) parsed: bool,
    pub(crate) kind: MessageKind,
    pub(crate) method: Option<Method>,
    pub(crate) version: Version,
    pub(crate) status: Option<StatusCode>,
    pub(crate) content_length: Option<u64>,
    pub(crate) path: String,
    pub(crate) path_info: String,
    pub(crate) args: String,
    pub(crate) host: String,
    pub(crate) content_type: String,
    pub(crate) content_type_full: String,
    pub(crate) accept_encoding: AcceptEncoding,
    pub(crate) content_encoding: ContentEncoding,
    pub(crate) transfer_encoding: TransferEncoding,
    pub(crate) te: TransferEncoding,
    pub(crate) connection: Connection,
    pub(crate) authorization: String,
    pub(crate) cookie: String,
    pub(crate) cookies: HashMap<String, String>,
    pub(crate) fields: HeaderMap,
    pub(crate) remote_address: Option<IpAddr>,
    pub(crate) remote_port: u16,
}

impl HttpHeader {
    /// Returns true once the complete header block has been parsed.
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_request(&self) -> bool {
        self.kind == MessageKind::Request
    }

    /// The request method, `None` for responses.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The response status, `None` for requests.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The declared body length, 0 when unknown.
    pub fn content_length(&self) -> u64 {
        self.content_length.unwrap_or(0)
    }

    /// Returns true if a `Content-Length` field was present and not voided by chunked framing.
    pub fn has_content_length(&self) -> bool {
        self.content_length.is_some()
    }

    /// The percent-decoded request path, up to and including a `.php`/`.hgs` segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The part of the path following a `.php`/`.hgs` segment.
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// The raw query string, without the leading `?`.
    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The lower-case media type essence, e.g. `application/json`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The `Content-Type` value as sent, parameters included.
    pub fn content_type_full(&self) -> &str {
        &self.content_type_full
    }

    pub fn accept_encoding(&self) -> AcceptEncoding {
        self.accept_encoding
    }

    pub fn content_encoding(&self) -> ContentEncoding {
        self.content_encoding
    }

    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    /// Transfer codings the peer accepts in responses (`TE`). Never affects framing.
    pub fn te(&self) -> TransferEncoding {
        self.te
    }

    pub fn connection(&self) -> Connection {
        self.connection
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// The raw `Cookie` value.
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Every header field, keyed case-insensitively. A repeated field keeps its last value.
    pub fn fields(&self) -> &HeaderMap {
        &self.fields
    }

    /// Looks up a field value as text.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn remote_address(&self) -> Option<IpAddr> {
        self.remote_address
    }

    pub fn remote_port(&self) -> u16 {
        self.remote_port
    }

    pub fn set_remote_endpoint(&mut self, address: Option<IpAddr>, port: u16) {
        self.remote_address = address;
        self.remote_port = port;
    }

    /// Returns true if the message carries no body by definition, regardless of what follows
    /// the header on the wire.
    pub(crate) fn is_bodyless(&self) -> bool {
        let zero_length = self.content_length() == 0;
        let explicit_zero = self.content_length == Some(0);

        if let Some(status) = self.status {
            return explicit_zero || status.is_redirection();
        }

        match &self.method {
            Some(method) if *method == Method::GET || *method == Method::DELETE || *method == Method::OPTIONS => zero_length,
            Some(method) if method.as_str() == "M-SEARCH" => true,
            Some(method) if method.as_str() == "NOTIFY" => zero_length,
            _ => explicit_zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transfer_encoding_list() {
        let set = TransferEncoding::parse_list("gzip, chunked").unwrap();
        assert!(set.contains(TransferEncoding::GZIP));
        assert!(set.is_chunked());

        let set = TransferEncoding::parse_list("deflate").unwrap().with_implied_chunked();
        assert!(set.is_chunked());

        let set = TransferEncoding::parse_list("identity").unwrap().with_implied_chunked();
        assert!(!set.is_chunked());

        assert_eq!(TransferEncoding::parse_list("chunked, foo"), Err("foo".to_string()));
    }

    #[test]
    fn parse_connection_is_case_insensitive() {
        let set = Connection::parse_list("Keep-Alive, Upgrade").unwrap();
        assert!(set.contains(Connection::KEEP_ALIVE));
        assert!(set.contains(Connection::UPGRADE));
        assert!(!set.contains(Connection::CLOSE));
    }

    #[test]
    fn accept_encoding_skips_unknown_and_quality() {
        let set = AcceptEncoding::parse_list_lenient("gzip;q=1.0, sdch, br;q=0.5");
        assert!(set.contains(AcceptEncoding::GZIP));
        assert!(set.contains(AcceptEncoding::BR));
        assert!(!set.contains(AcceptEncoding::DEFLATE));
    }

    #[test]
    fn empty_set_is_never_contained() {
        assert!(!Connection::NONE.contains(Connection::NONE));
        assert!(Connection::NONE.is_empty());
    }

    #[test]
    fn bodyless_classification() {
        let mut header = HttpHeader { method: Some(Method::GET), ..Default::default() };
        assert!(header.is_bodyless());

        header.content_length = Some(5);
        assert!(!header.is_bodyless());

        header.method = Some(Method::from_bytes(b"M-SEARCH").unwrap());
        assert!(header.is_bodyless());

        header.method = Some(Method::POST);
        header.content_length = None;
        assert!(!header.is_bodyless());

        header.content_length = Some(0);
        assert!(header.is_bodyless());

        let redirect = HttpHeader { kind: MessageKind::Response, status: Some(StatusCode::FOUND), ..Default::default() };
        assert!(redirect.is_bodyless());

        let unknown_length = HttpHeader { kind: MessageKind::Response, status: Some(StatusCode::OK), ..Default::default() };
        assert!(!unknown_length.is_bodyless());
    }
}
