//! Decoder implementation for HTTP message payloads.
//!
//! This module provides a unified decoder for the different kinds of HTTP bodies:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Payloads of unknown length
//! - Messages with no body

use crate::codec::body::{ChunkedDecoder, ContentBuffer, LengthDecoder, Progress, UntilCloseDecoder};
use crate::protocol::{HttpHeader, ParseError};

/// A unified decoder for handling HTTP message payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Decode payload until the connection closes or a JSON value is complete
    UntilClose(UntilCloseDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder for messages with no body.
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding.
    pub(crate) fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    pub(crate) fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a PayloadDecoder for a payload of unknown length.
    pub(crate) fn until_close(detect_json_end: bool) -> Self {
        Self { kind: Kind::UntilClose(UntilCloseDecoder::new(detect_json_end)) }
    }

    /// Selects the decoder for a parsed header, following RFC 7230 §3.3.3: chunked wins
    /// over Content-Length.
    pub(crate) fn for_header(header: &HttpHeader) -> Self {
        if header.is_bodyless() {
            Self::empty()
        } else if header.transfer_encoding().is_chunked() {
            Self::chunked()
        } else if header.has_content_length() {
            Self::fix_length(header.content_length())
        } else {
            Self::until_close(header.content_type() == mime::APPLICATION_JSON.essence_str())
        }
    }

    /// Selects the decoder for a message whose first `received` content bytes are
    /// already buffered. A chunked body resumes at a chunk boundary.
    pub(crate) fn resume(header: &HttpHeader, received: usize) -> Self {
        match Self::for_header(header) {
            Self { kind: Kind::Length(_) } => Self::fix_length(header.content_length().saturating_sub(received as u64)),
            decoder => decoder,
        }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    #[cfg(test)]
    pub(crate) fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder waits for the connection to close.
    pub(crate) fn is_until_close(&self) -> bool {
        matches!(self.kind, Kind::UntilClose(_))
    }

    pub(crate) fn decode(&mut self, src: &[u8], content: &mut ContentBuffer) -> Result<Progress, ParseError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src, content),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src, content),
            Kind::UntilClose(until_close_decoder) => until_close_decoder.decode(src, content),
            Kind::NoBody => Ok(Progress::done(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::protocol::{MessageKind, TransferEncoding};

    #[test]
    fn chunked_wins_over_length() {
        let header = HttpHeader {
            method: Some(Method::POST),
            content_length: Some(10),
            transfer_encoding: TransferEncoding::CHUNKED,
            ..Default::default()
        };
        assert!(PayloadDecoder::for_header(&header).is_chunked());
    }

    #[test]
    fn unknown_length_response_waits_for_close() {
        let header = HttpHeader { kind: MessageKind::Response, status: Some(StatusCode::OK), ..Default::default() };
        let decoder = PayloadDecoder::for_header(&header);
        assert!(decoder.is_until_close());
        assert_eq!(decoder, PayloadDecoder::until_close(false));

        let json = HttpHeader { content_type: "application/json".to_string(), ..header };
        assert_eq!(PayloadDecoder::for_header(&json), PayloadDecoder::until_close(true));
    }

    #[test]
    fn resume_counts_received_bytes() {
        let header = HttpHeader { method: Some(Method::POST), content_length: Some(10), ..Default::default() };
        assert_eq!(PayloadDecoder::resume(&header, 4), PayloadDecoder::fix_length(6));
        assert_eq!(PayloadDecoder::resume(&header, 12), PayloadDecoder::fix_length(0));
    }

    #[test]
    fn bodyless_request() {
        let header = HttpHeader { method: Some(Method::GET), ..Default::default() };
        let mut decoder = PayloadDecoder::for_header(&header);
        assert_eq!(decoder, PayloadDecoder::empty());

        let mut content = ContentBuffer::new(16);
        assert_eq!(decoder.decode(b"ignored", &mut content).unwrap(), Progress::done(0));
    }
}
