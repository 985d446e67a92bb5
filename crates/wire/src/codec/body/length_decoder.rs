//! Decoders for bodies that are not chunked.
//!
//! [`LengthDecoder`] handles bodies whose size is given by the Content-Length header, as
//! defined in [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).
//! [`UntilCloseDecoder`] handles bodies of unknown length, which end when the peer
//! closes the connection or, for JSON bodies, as soon as the buffered bytes form one
//! complete JSON value.

use std::cmp;

use serde::de::IgnoredAny;
use tracing::trace;

use crate::codec::body::{ContentBuffer, Progress, trailing_noise};
use crate::protocol::ParseError;

/// A decoder for handling HTTP messages with a known content length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    length: u64,
}

impl LengthDecoder {
    /// Creates a new LengthDecoder instance.
    ///
    /// # Arguments
    /// * `length` - The total content length to decode, specified by Content-Length header
    pub(crate) fn new(length: u64) -> Self {
        Self { length }
    }

    /// Appends at most the remaining length from `src`.
    ///
    /// Once the last byte of the body is read, line breaks and NUL bytes directly
    /// following it are consumed but not stored.
    pub(crate) fn decode(&mut self, src: &[u8], content: &mut ContentBuffer) -> Result<Progress, ParseError> {
        if self.length == 0 {
            return Ok(Progress::done(trailing_noise(src)));
        }

        // Read the minimum of remaining length and available bytes
        let len = usize::try_from(cmp::min(self.length, src.len() as u64)).unwrap_or(src.len());
        content.extend(&src[..len])?;
        self.length -= len as u64;

        if self.length == 0 {
            trace!(content_size = content.len(), "read fixed length body");
            Ok(Progress::done(len + trailing_noise(&src[len..])))
        } else {
            Ok(Progress::pending(len))
        }
    }
}

/// A decoder for bodies without a declared length.
///
/// Without the JSON completion check the body only ends when the owner calls `set_finished()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UntilCloseDecoder {
    detect_json_end: bool,
}

impl UntilCloseDecoder {
    pub(crate) fn new(detect_json_end: bool) -> Self {
        Self { detect_json_end }
    }

    /// With the JSON completion check, the body ends with the first complete JSON value.
    /// Bytes after it are left unconsumed, apart from the line breaks and NUL bytes directly
    /// following it.
    pub(crate) fn decode(&mut self, src: &[u8], content: &mut ContentBuffer) -> Result<Progress, ParseError> {
        if self.detect_json_end {
            let received = content.len();
            let body = [content.as_slice(), src].concat();
            if let Some(end) = json_value_end(&body) {
                let used = end.saturating_sub(received).min(src.len());
                content.extend(&src[..used])?;
                trace!(content_size = content.len(), "json body complete");
                return Ok(Progress::done(used + trailing_noise(&src[used..])));
            }
        }

        content.extend(src)?;
        Ok(Progress::pending(src.len()))
    }
}

/// Returns the end offset of the first complete JSON value in `bytes`. Never fails, a
/// partial value is simply not complete yet.
///
/// A number running up to the end of `bytes` may still grow, so it only counts once a
/// delimiter follows it.
fn json_value_end(bytes: &[u8]) -> Option<usize> {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<IgnoredAny>();
    values.next()?.ok()?;
    let end = values.byte_offset();

    let open_number = end == bytes.len() && bytes[..end].last().is_some_and(u8::is_ascii_digit);
    (!open_number).then_some(end)
}
