//! HTTP body decoding.
//!
//! The header decoder decides how a body is framed; the decoders in this module then
//! append the body bytes into a shared [`ContentBuffer`] as they arrive.
//!
//! # Components
//!
//! - [`ChunkedDecoder`]: chunked transfer encoding (RFC 7230 §4.1)
//! - [`LengthDecoder`]: a body of known `Content-Length`
//! - [`UntilCloseDecoder`]: a body of unknown length, optionally completed by a JSON completion check
//! - [`PayloadDecoder`]: selects between the above
//!
//! Every decoder reports how many input bytes it consumed through [`Progress`] and
//! never looks at a byte twice.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub(crate) use chunked_decoder::ChunkedDecoder;
pub(crate) use length_decoder::{LengthDecoder, UntilCloseDecoder};
pub(crate) use payload_decoder::PayloadDecoder;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::protocol::ParseError;

/// The outcome of feeding one slice to a body decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Progress {
    pub(crate) consumed: usize,
    pub(crate) finished: bool,
}

impl Progress {
    pub(crate) fn pending(consumed: usize) -> Self {
        Self { consumed, finished: false }
    }

    pub(crate) fn done(consumed: usize) -> Self {
        Self { consumed, finished: true }
    }
}

/// Growable body buffer with a hard size limit.
///
/// Once the message is finished the buffer is sealed with a single NUL byte which is
/// never reported as content.
#[derive(Debug)]
pub(crate) struct ContentBuffer {
    bytes: BytesMut,
    max_size: usize,
    sealed: bool,
}

impl ContentBuffer {
    pub(crate) fn new(max_size: usize) -> Self {
        Self { bytes: BytesMut::new(), max_size, sealed: false }
    }

    pub(crate) fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Fails if `additional` more bytes would not fit.
    pub(crate) fn ensure_room(&self, additional: u64) -> Result<(), ParseError> {
        let current_size = (self.len() as u64).saturating_add(additional);
        if current_size > self.max_size as u64 {
            debug!(current_size, max_size = self.max_size, "content exceeds the limit");
            let current_size = usize::try_from(current_size).unwrap_or(usize::MAX);
            return Err(ParseError::too_large_content(current_size, self.max_size));
        }
        Ok(())
    }

    pub(crate) fn extend(&mut self, src: &[u8]) -> Result<(), ParseError> {
        debug_assert!(!self.sealed, "content is already sealed");
        self.ensure_room(src.len() as u64)?;
        self.bytes.extend_from_slice(src);
        Ok(())
    }

    pub(crate) fn seal(&mut self) {
        if !self.sealed {
            self.bytes.extend_from_slice(&[0]);
            self.sealed = true;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len() - usize::from(self.sealed)
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Moves the content out, leaving an empty unsealed buffer behind.
    pub(crate) fn take(&mut self) -> Bytes {
        let len = self.len();
        let mut bytes = std::mem::take(&mut self.bytes);
        bytes.truncate(len);
        self.sealed = false;
        bytes.freeze()
    }
}

/// Number of leading `\r`, `\n` and `\0` bytes: line noise trailing a completed body.
pub(crate) fn trailing_noise(src: &[u8]) -> usize {
    src.iter().take_while(|&&b| matches!(b, b'\r' | b'\n' | 0)).count()
}
