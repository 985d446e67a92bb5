//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module decodes bodies framed as described in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! The input may be cut at any byte: the chunk size is accumulated digit by digit and
//! every line terminator has its own state, so a call that ends in the middle of a size
//! line or right between a chunk and its CRLF simply resumes on the next call.

use std::task::Poll;

use tracing::trace;
use ChunkedState::*;

use crate::codec::body::{ContentBuffer, Progress, trailing_noise};
use crate::protocol::ParseError;

/// A decoder for handling HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF (a bare LF is tolerated)
/// - Then the chunk data and CRLF
/// - A zero-sized chunk indicates the end of the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    size_digits: usize,
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder instance.
    ///
    /// The decoder starts in the Size state, ready to read the size of the first chunk.
    pub(crate) fn new() -> Self {
        Self { state: Size, remaining_size: 0, size_digits: 0 }
    }

    /// Appends the chunk data found in `src` to `content`.
    ///
    /// # Returns
    /// - `Progress::done` once the zero-sized chunk has been read; line breaks directly
    ///   following it are consumed as well
    /// - `Progress::pending` when more data is needed
    /// - `Err(ParseError)` if the chunked encoding is invalid or the content is too large
    pub(crate) fn decode(&mut self, src: &[u8], content: &mut ContentBuffer) -> Result<Progress, ParseError> {
        let mut cursor = src;

        loop {
            if self.state == End {
                trace!("finished reading chunked data");
                let consumed = src.len() - cursor.len();
                return Ok(Progress::done(consumed + trailing_noise(cursor)));
            }

            if cursor.is_empty() {
                // need more data
                return Ok(Progress::pending(src.len()));
            }

            let new_state = match self.state.step(&mut cursor, &mut self.remaining_size, &mut self.size_digits, content) {
                Poll::Pending => return Ok(Progress::pending(src.len() - cursor.len())),
                Poll::Ready(Ok(new_state)) => new_state,
                Poll::Ready(Err(e)) => return Err(e),
            };

            // a new size line starts
            if new_state == Size && self.state != Size {
                self.size_digits = 0;
            }
            self.state = new_state;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.state == End
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Handle whitespace after size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// The zero-sized chunk has been read
    End,
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        match $src.split_first() {
            Some((&byte, rest)) => {
                *$src = rest;
                byte
            }
            None => return Poll::Pending,
        }
    }};
}

impl ChunkedState {
    /// Processes the next step in the chunked decoding state machine.
    ///
    /// # Arguments
    /// * `src` - Cursor over the unread input, advanced past every byte used
    /// * `remaining_size` - Tracks remaining bytes in current chunk
    /// * `size_digits` - Number of hex digits seen on the current size line
    /// * `content` - Buffer receiving the chunk data
    fn step(
        &self,
        src: &mut &[u8],
        remaining_size: &mut u64,
        size_digits: &mut usize,
        content: &mut ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            Size => ChunkedState::read_size(src, remaining_size, size_digits, content),
            SizeLws => ChunkedState::read_size_lws(src, remaining_size, size_digits, content),
            Extension => ChunkedState::read_extension(src, remaining_size, size_digits, content),
            SizeLf => ChunkedState::read_size_lf(src, remaining_size, size_digits, content),
            Body => ChunkedState::read_body(src, remaining_size, content),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Reads and parses the chunk size in hexadecimal format.
    ///
    /// # State Transitions
    /// - On hex digit (0-9, a-f, A-F): Stay in Size state to read more digits
    /// - On whitespace (tab/space): Transition to SizeLws state
    /// - On semicolon: Transition to Extension state to handle chunk extensions
    /// - On CR: Transition to SizeLf state to finish size line
    /// - On LF: Finish the size line
    /// - On invalid character: Return error
    fn read_size(
        src: &mut &[u8],
        size_per_chunk: &mut u64,
        size_digits: &mut usize,
        content: &ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        let digit = match try_next_byte!(src) {
            b @ b'0'..=b'9' => b - b'0',
            b @ b'a'..=b'f' => b + 10 - b'a',
            b @ b'A'..=b'F' => b + 10 - b'A',
            b'\t' | b' ' => return Poll::Ready(Ok(SizeLws)),
            b';' => return Poll::Ready(Ok(Extension)),
            b'\r' => return Poll::Ready(Ok(SizeLf)),
            b'\n' => return Poll::Ready(ChunkedState::size_line_end(*size_per_chunk, *size_digits, content)),
            b => return Poll::Ready(Err(ParseError::invalid_chunk_size(format!("unexpected byte {b:#04x}")))),
        };

        *size_per_chunk = match size_per_chunk.checked_mul(16).and_then(|size| size.checked_add(u64::from(digit))) {
            Some(size) => size,
            None => return Poll::Ready(Err(ParseError::invalid_chunk_size("overflow chunked length"))),
        };
        *size_digits += 1;

        Poll::Ready(Ok(Size))
    }

    /// Processes linear whitespace (LWS) after the chunk size.
    ///
    /// State transitions:
    /// - On tab/space: Stay in SizeLws state to handle more whitespace
    /// - On semicolon: Move to Extension state to process chunk extensions
    /// - On CR: Move to SizeLf state to finish size line
    /// - On LF: Finish the size line
    /// - On invalid char: Return error
    fn read_size_lws(
        src: &mut &[u8],
        size_per_chunk: &u64,
        size_digits: &usize,
        content: &ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            // LWS can follow the chunk size, but no more digits can come
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(ChunkedState::size_line_end(*size_per_chunk, *size_digits, content)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk_size("invalid linear white space"))),
        }
    }

    /// Skips chunk extensions up to the end of the size line.
    fn read_extension(
        src: &mut &[u8],
        size_per_chunk: &u64,
        size_digits: &usize,
        content: &ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(ChunkedState::size_line_end(*size_per_chunk, *size_digits, content)),
            _ => Poll::Ready(Ok(Extension)), // no supported extensions
        }
    }

    /// Validates the LF byte after the chunk size line.
    fn read_size_lf(
        src: &mut &[u8],
        size_per_chunk: &u64,
        size_digits: &usize,
        content: &ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(ChunkedState::size_line_end(*size_per_chunk, *size_digits, content)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk_size("missing LF after chunk size"))),
        }
    }

    /// Decides what follows a complete size line.
    ///
    /// # State Transitions
    /// - Size 0: Move to End, the message is complete
    /// - Size > 0: Move to Body state to read chunk data
    /// - No digits at all, or a size that can never fit the content limit: Return error
    fn size_line_end(size_per_chunk: u64, size_digits: usize, content: &ContentBuffer) -> Result<ChunkedState, ParseError> {
        if size_digits == 0 {
            return Err(ParseError::invalid_chunk_size("empty chunk size line"));
        }

        trace!(chunk_size = size_per_chunk, "read chunk size");
        if size_per_chunk == 0 {
            return Ok(End);
        }

        content.ensure_room(size_per_chunk)?;
        Ok(Body)
    }

    /// Reads the actual chunk data bytes.
    ///
    /// # State Transitions
    /// - After reading data with remaining size > 0: Stay in Body state
    /// - After reading data with remaining size = 0: Move to BodyCr state
    fn read_body(
        src: &mut &[u8],
        size_per_chunk: &mut u64,
        content: &mut ContentBuffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Pending;
        }

        // cap remaining bytes at the max capacity of usize
        let remaining = usize::try_from(*size_per_chunk).unwrap_or(usize::MAX);
        let read_size = std::cmp::min(remaining, src.len());

        let (data, rest) = src.split_at(read_size);
        if let Err(e) = content.extend(data) {
            return Poll::Ready(Err(e));
        }
        *src = rest;
        *size_per_chunk -= read_size as u64;

        if *size_per_chunk > 0 { Poll::Ready(Ok(Body)) } else { Poll::Ready(Ok(BodyCr)) }
    }

    /// Validates the line break after chunk data.
    ///
    /// # State Transitions
    /// - On CR: Move to BodyLf state
    /// - On LF: Move back to Size state for next chunk
    /// - On any other byte: Return error
    fn read_body_cr(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            b'\n' => Poll::Ready(Ok(Size)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("missing line break after chunk data"))),
        }
    }

    /// Validates the LF byte after chunk data.
    fn read_body_lf(src: &mut &[u8]) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(Size)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("missing LF after chunk data"))),
        }
    }
}
