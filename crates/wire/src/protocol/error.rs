use std::io;
use thiserror::Error;

/// Fatal conditions raised while decoding an HTTP message.
///
/// Any of these aborts the current message: the owner of the decoder should close
/// the connection or `reset()` before feeding more bytes.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("content size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeContent { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid request or status line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(String),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunk size: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },

    #[error("unsupported token {token:?} in {field} header")]
    UnsupportedToken { field: &'static str, token: String },

    #[error("missing boundary in multipart content-type")]
    MissingBoundary,

    #[error("invalid multipart body: {reason}")]
    InvalidMultipart { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_large_content(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeContent { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_version<S: ToString>(str: S) -> Self {
        Self::InvalidVersion(str.to_string())
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn unsupported_token<S: ToString>(field: &'static str, token: S) -> Self {
        Self::UnsupportedToken { field, token: token.to_string() }
    }

    pub fn invalid_multipart<S: ToString>(str: S) -> Self {
        Self::InvalidMultipart { reason: str.to_string() }
    }
}

/// Fatal conditions raised while decoding WebSocket frames.
#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("websocket payload too large, current: {current_size} exceed the limit {max_size}")]
    TooLargePayload { current_size: u64, max_size: u64 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WebSocketError {
    pub fn too_large_payload(current_size: u64, max_size: u64) -> Self {
        Self::TooLargePayload { current_size, max_size }
    }
}
