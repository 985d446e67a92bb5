//! Incremental WebSocket frame decoder.
//!
//! [`WebSocketDecoder`] accumulates one logical message: a single frame with FIN set, or
//! a first frame followed by continuation frames up to the one with FIN set. Frame
//! headers may be split anywhere, masked payloads are unmasked as each frame completes.
//!
//! Frames with reserved bits, reserved opcodes, a close opcode or an empty payload are
//! not errors: they finish the message as a close request without payload.

use std::cmp;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::ensure;
use crate::protocol::WebSocketError;
use crate::websocket::header::{MAX_FRAME_HEADER_LEN, Opcode, WebSocketHeader};

/// Upper bound for the payload of one logical message: 10 MiB
pub const MAX_WEBSOCKET_CONTENT_SIZE: u64 = 10 * 1024 * 1024;

/// A complete message taken out of the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketMessage {
    /// Opcode of the first frame of the message, or `Close` for a close request
    pub opcode: Opcode,
    pub payload: Bytes,
    pub close_requested: bool,
}

impl WebSocketMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self { opcode: Opcode::Text, payload: Bytes::from(text.into()), close_requested: false }
    }

    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self { opcode: Opcode::Binary, payload: payload.into(), close_requested: false }
    }

    pub fn close() -> Self {
        Self { opcode: Opcode::Close, payload: Bytes::new(), close_requested: true }
    }
}

#[derive(Debug)]
struct Session {
    raw_header: BytesMut,
    header: Option<WebSocketHeader>,
    content: BytesMut,
    /// Start of the current frame's payload in `content`
    old_content_size: usize,
    /// End of the current frame's payload in `content`
    frame_end: usize,
    message_opcode: Option<Opcode>,
    close_requested: bool,
    finished: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            raw_header: BytesMut::with_capacity(MAX_FRAME_HEADER_LEN),
            header: None,
            content: BytesMut::new(),
            old_content_size: 0,
            frame_end: 0,
            message_opcode: None,
            close_requested: false,
            finished: false,
        }
    }

    /// Moves header bytes from `src` until the header is complete or `src` is exhausted.
    fn fill_header(&mut self, src: &[u8]) -> usize {
        let mut read = 0;
        loop {
            let needed = match self.raw_header.get(1) {
                Some(&second) => WebSocketHeader::encoded_len(second),
                None => 2,
            };
            if self.raw_header.len() >= needed || read == src.len() {
                return read;
            }

            let len = cmp::min(needed - self.raw_header.len(), src.len() - read);
            self.raw_header.extend_from_slice(&src[read..read + len]);
            read += len;
        }
    }

    fn header_is_complete(&self) -> bool {
        self.raw_header.get(1).is_some_and(|&second| self.raw_header.len() == WebSocketHeader::encoded_len(second))
    }
}

/// A reusable decoder for WebSocket messages.
#[derive(Debug)]
pub struct WebSocketDecoder {
    session: Session,
}

impl Default for WebSocketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketDecoder {
    pub fn new() -> Self {
        Self { session: Session::new() }
    }

    /// Feeds the next fragment of the stream and returns the number of bytes consumed.
    ///
    /// Consumption stops right after the frame that finishes the message. A finished
    /// decoder is reset before consuming anything.
    ///
    /// # Errors
    ///
    /// [`WebSocketError::TooLargePayload`] once the message would exceed
    /// [`MAX_WEBSOCKET_CONTENT_SIZE`].
    pub fn process(&mut self, src: &[u8]) -> Result<usize, WebSocketError> {
        if self.session.finished {
            self.reset();
        }

        let session = &mut self.session;
        let mut consumed = 0;

        loop {
            let header = match session.header {
                Some(header) => header,
                None => {
                    consumed += session.fill_header(&src[consumed..]);
                    if !session.header_is_complete() {
                        break;
                    }

                    let header = WebSocketHeader::parse(&session.raw_header);
                    trace!(fin = header.fin, opcode = ?header.opcode, length = header.length, masked = header.has_mask, "parsed frame header");

                    if !header.is_acceptable() {
                        warn!(opcode = ?header.opcode, length = header.length, "unacceptable frame, treating as close request");
                        session.header = Some(header);
                        session.close_requested = true;
                        session.finished = true;
                        break;
                    }

                    let current_size = (session.old_content_size as u64).saturating_add(header.length);
                    if current_size > MAX_WEBSOCKET_CONTENT_SIZE {
                        debug!(current_size, max_size = MAX_WEBSOCKET_CONTENT_SIZE, "websocket message exceeds the limit");
                    }
                    ensure!(
                        current_size <= MAX_WEBSOCKET_CONTENT_SIZE,
                        WebSocketError::too_large_payload(current_size, MAX_WEBSOCKET_CONTENT_SIZE)
                    );

                    // bounded by the limit above
                    session.frame_end = usize::try_from(current_size).unwrap_or(usize::MAX);
                    session.message_opcode.get_or_insert(header.opcode);
                    session.header = Some(header);
                    header
                }
            };

            let rest = &src[consumed..];
            let len = cmp::min(session.frame_end - session.content.len(), rest.len());
            session.content.extend_from_slice(&rest[..len]);
            consumed += len;

            if session.content.len() < session.frame_end {
                break;
            }

            if header.has_mask {
                unmask(&mut session.content[session.old_content_size..], header.masking_key);
            }

            if header.fin {
                trace!(content_size = session.content.len(), "websocket message finished");
                session.finished = true;
                break;
            }

            // a fragment: the next frame header follows
            session.header = None;
            session.raw_header.clear();
            session.old_content_size = session.content.len();
        }

        Ok(consumed)
    }

    /// Drops all per-message state.
    pub fn reset(&mut self) {
        self.session = Session::new();
    }

    pub fn is_finished(&self) -> bool {
        self.session.finished
    }

    /// Returns true once the header of the current frame has been parsed.
    pub fn header_is_finished(&self) -> bool {
        self.session.header.is_some()
    }

    /// Header of the current (or last) frame.
    pub fn header(&self) -> Option<&WebSocketHeader> {
        self.session.header.as_ref()
    }

    /// The unmasked payload received so far. The current frame stays masked until it
    /// is complete.
    pub fn content(&self) -> &[u8] {
        &self.session.content
    }

    pub fn content_size(&self) -> usize {
        self.session.content.len()
    }

    pub fn raw_header(&self) -> &[u8] {
        &self.session.raw_header
    }

    pub fn close_requested(&self) -> bool {
        self.session.close_requested
    }

    /// Opcode of the first frame of the message.
    pub fn message_opcode(&self) -> Option<Opcode> {
        self.session.message_opcode
    }

    pub fn set_finished(&mut self) {
        self.session.finished = true;
    }

    /// Moves the finished message out and resets the decoder.
    ///
    /// Returns `None`, leaving the decoder untouched, while the message is incomplete.
    pub fn take(&mut self) -> Option<WebSocketMessage> {
        if !self.session.finished {
            return None;
        }

        let session = std::mem::replace(&mut self.session, Session::new());
        let opcode = if session.close_requested { Opcode::Close } else { session.message_opcode.unwrap_or_default() };
        Some(WebSocketMessage { opcode, payload: session.content.freeze(), close_requested: session.close_requested })
    }
}

fn unmask(payload: &mut [u8], key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}
