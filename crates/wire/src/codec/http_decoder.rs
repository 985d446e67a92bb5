//! Incremental HTTP/1.x message decoder.
//!
//! [`HttpDecoder`] is fed arbitrary fragments of a byte stream and reports how many bytes
//! of each fragment it consumed. Bytes past the end of a finished message are left to
//! the caller, who feeds them again to start the next message.
//!
//! # Phases
//!
//! - `Header`: bytes go to the header decoder until the terminator is seen
//! - `Sniff`: the body length is unknown and the caller asked for sniffing; up to
//!   [`SNIFF_LEN`] body bytes are buffered to tell a plain body from an unannounced
//!   chunked one
//! - `Body`: bytes go to the selected [`PayloadDecoder`]
//! - `Finished`: the content is sealed, the next `process` call starts a new message
//!
//! # Example
//!
//! ```
//! use micro_wire::codec::HttpDecoder;
//!
//! let mut decoder = HttpDecoder::new();
//! let input = b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
//!
//! let consumed = decoder.process_bytes(&input[..20]).unwrap();
//! assert_eq!(consumed, 20);
//! assert!(!decoder.is_finished());
//!
//! let consumed = decoder.process_bytes(&input[20..]).unwrap();
//! assert_eq!(consumed, input.len() - 20);
//! assert!(decoder.is_finished());
//! assert_eq!(decoder.content(), b"hello");
//! ```

use std::cmp;
use std::net::IpAddr;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::body::{ContentBuffer, PayloadDecoder};
use crate::codec::config::HttpDecoderConfig;
use crate::codec::header::HeaderDecoder;
use crate::codec::multipart::decode_multipart;
use crate::protocol::{FormData, HttpHeader, HttpMessage, HttpSnapshot, MessageKind, ParseError};

/// Number of body bytes needed before sniffing for an unannounced chunked body
pub const SNIFF_LEN: usize = 8;

#[derive(Debug)]
enum Phase {
    Header,
    Sniff,
    Body(PayloadDecoder),
    Finished,
}

/// Everything that belongs to a single message. Replaced as a whole on reset.
#[derive(Debug)]
struct Session {
    phase: Phase,
    header_decoder: HeaderDecoder,
    header: HttpHeader,
    content: ContentBuffer,
    sniff: BytesMut,
    header_processing_started: bool,
    data_processing_started: bool,
    stream_cursor: usize,
    content_cursor: usize,
    redirect_url: String,
    redirect_query_string: String,
    redirect_status: Option<u16>,
}

impl Session {
    fn new(config: &HttpDecoderConfig) -> Self {
        Self {
            phase: Phase::Header,
            header_decoder: HeaderDecoder::new(config.get_max_header_size()),
            header: HttpHeader::default(),
            content: ContentBuffer::new(config.get_max_content_size()),
            sniff: BytesMut::new(),
            header_processing_started: false,
            data_processing_started: false,
            stream_cursor: 0,
            content_cursor: 0,
            redirect_url: String::new(),
            redirect_query_string: String::new(),
            redirect_status: None,
        }
    }

    fn finish(&mut self) {
        self.content.seal();
        self.phase = Phase::Finished;
        trace!(kind = ?self.header.kind(), content_size = self.content.len(), "message finished");
    }

    /// Picks the phase following a parsed header.
    fn enter_body(&mut self, sniff: bool) {
        let decoder = PayloadDecoder::for_header(&self.header);
        if self.header.is_bodyless() {
            self.finish();
        } else if sniff && decoder.is_until_close() {
            self.phase = Phase::Sniff;
        } else {
            self.phase = Phase::Body(decoder);
        }
    }
}

/// A reusable decoder for HTTP/1.x requests and responses.
#[derive(Debug)]
pub struct HttpDecoder {
    config: HttpDecoderConfig,
    remote_address: Option<IpAddr>,
    remote_port: u16,
    session: Session,
}

impl Default for HttpDecoder {
    fn default() -> Self {
        Self::with_config(HttpDecoderConfig::default())
    }
}

impl HttpDecoder {
    /// Creates a decoder with the default size limits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HttpDecoderConfig) -> Self {
        Self { config, remote_address: None, remote_port: 0, session: Session::new(&config) }
    }

    /// Feeds `src` without any body sniffing.
    pub fn process_bytes(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        self.process(src, false, false)
    }

    /// Feeds the next fragment of the stream.
    ///
    /// Returns the number of bytes consumed. Fewer than `src.len()` bytes are consumed
    /// only when the message finished inside `src`. A finished decoder is reset before
    /// consuming anything.
    ///
    /// With `sniff_chunked_xml` or `sniff_chunked_json` set, a body without
    /// `Content-Length` or `Transfer-Encoding` that starts with a hexadecimal number
    /// followed by `<` (XML) or by `{` / `[` (JSON) is decoded as chunked.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`] is fatal for the current message: call [`reset`](Self::reset)
    /// or drop the connection.
    pub fn process(&mut self, src: &[u8], sniff_chunked_xml: bool, sniff_chunked_json: bool) -> Result<usize, ParseError> {
        if self.is_finished() {
            self.reset();
        }

        let session = &mut self.session;
        let mut consumed = 0;

        loop {
            let rest = &src[consumed..];
            if rest.is_empty() {
                break;
            }

            match &mut session.phase {
                Phase::Header => {
                    let (read, header) = session.header_decoder.decode(rest)?;
                    consumed += read;
                    // blank lines between messages do not open a new one
                    session.header_processing_started |= !session.header_decoder.raw().is_empty();

                    let Some(mut header) = header else {
                        break;
                    };
                    header.set_remote_endpoint(self.remote_address, self.remote_port);
                    session.header = header;
                    session.enter_body(sniff_chunked_xml || sniff_chunked_json);
                }

                Phase::Sniff => {
                    session.data_processing_started = true;
                    if session.sniff.len() + rest.len() < SNIFF_LEN {
                        session.sniff.extend_from_slice(rest);
                        consumed += rest.len();
                        break;
                    }

                    let buffered = session.sniff.split();
                    let body = [buffered.as_ref(), rest].concat();
                    let mut decoder = if looks_chunked(&body, sniff_chunked_xml, sniff_chunked_json) {
                        trace!("body starts with a chunk size, decoding as chunked");
                        PayloadDecoder::chunked()
                    } else {
                        PayloadDecoder::for_header(&session.header)
                    };

                    // bytes held back while sniffing were already reported as consumed
                    let progress = decoder.decode(&body, &mut session.content)?;
                    consumed += progress.consumed.saturating_sub(buffered.len());
                    if progress.finished {
                        session.finish();
                    } else {
                        session.phase = Phase::Body(decoder);
                    }
                    break;
                }

                Phase::Body(decoder) => {
                    session.data_processing_started = true;
                    let progress = decoder.decode(rest, &mut session.content)?;
                    consumed += progress.consumed;
                    if progress.finished {
                        session.finish();
                    }
                    break;
                }

                Phase::Finished => break,
            }
        }

        Ok(consumed)
    }

    /// Drops all per-message state. Size limits and the remote endpoint are kept.
    pub fn reset(&mut self) {
        self.session = Session::new(&self.config);
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.session.phase, Phase::Finished)
    }

    pub fn header_is_finished(&self) -> bool {
        self.session.header.is_parsed()
    }

    pub fn header(&self) -> &HttpHeader {
        &self.session.header
    }

    /// The decoded content so far, without the terminating NUL of a finished message.
    pub fn content(&self) -> &[u8] {
        self.session.content.as_slice()
    }

    pub fn content_size(&self) -> usize {
        self.session.content.len()
    }

    pub fn raw_header(&self) -> &[u8] {
        self.session.header_decoder.raw()
    }

    pub fn kind(&self) -> MessageKind {
        self.session.header.kind()
    }

    /// Marks the message as complete, typically because the peer closed the connection
    /// while a body of unknown length was being read.
    pub fn set_finished(&mut self) {
        if self.is_finished() {
            return;
        }

        let session = &mut self.session;
        if matches!(session.phase, Phase::Sniff) {
            let buffered = session.sniff.split();
            // the content is still empty while sniffing
            if let Err(e) = session.content.extend(&buffered) {
                debug!(cause = %e, "dropping bytes held back for sniffing");
            }
        }
        session.finish();
    }

    pub fn set_max_header_size(&mut self, max_header_size: usize) {
        self.config = self.config.max_header_size(max_header_size);
        self.session.header_decoder.set_max_size(max_header_size);
    }

    pub fn set_max_content_size(&mut self, max_content_size: usize) {
        self.config = self.config.max_content_size(max_content_size);
        self.session.content.set_max_size(max_content_size);
    }

    pub fn config(&self) -> &HttpDecoderConfig {
        &self.config
    }

    pub fn set_remote_endpoint(&mut self, address: Option<IpAddr>, port: u16) {
        self.remote_address = address;
        self.remote_port = port;
        self.session.header.set_remote_endpoint(address, port);
    }

    pub fn set_redirect(&mut self, url: impl Into<String>, query_string: impl Into<String>, status: Option<u16>) {
        self.session.redirect_url = url.into();
        self.session.redirect_query_string = query_string.into();
        self.session.redirect_status = status;
    }

    pub fn redirect_url(&self) -> &str {
        &self.session.redirect_url
    }

    pub fn redirect_query_string(&self) -> &str {
        &self.session.redirect_query_string
    }

    pub fn redirect_status(&self) -> Option<u16> {
        self.session.redirect_status
    }

    pub fn header_processing_started(&self) -> bool {
        self.session.header_processing_started
    }

    pub fn data_processing_started(&self) -> bool {
        self.session.data_processing_started
    }

    /// Moves the finished message out and resets the decoder.
    ///
    /// Returns `None`, leaving the decoder untouched, while the message is incomplete.
    pub fn take(&mut self) -> Option<HttpMessage> {
        if !self.is_finished() {
            return None;
        }

        let mut session = std::mem::replace(&mut self.session, Session::new(&self.config));
        Some(HttpMessage::new(session.header, session.content.take()))
    }

    /// Splits the content of a `multipart/form-data` message into its parts.
    pub fn decode_multipart_formdata(&self) -> Result<Vec<FormData>, ParseError> {
        decode_multipart(self.session.header.content_type_full(), self.content())
    }

    /// Copies the next bytes of the raw header followed by the content into `buf`.
    ///
    /// Returns the number of bytes copied, 0 once everything has been read.
    pub fn read_stream(&mut self, buf: &mut [u8]) -> usize {
        let session = &mut self.session;
        let raw = session.header_decoder.raw();
        let content = session.content.as_slice();

        let mut written = 0;
        while written < buf.len() {
            let cursor = session.stream_cursor;
            let src = if cursor < raw.len() {
                &raw[cursor..]
            } else if cursor - raw.len() < content.len() {
                &content[cursor - raw.len()..]
            } else {
                break;
            };

            let len = cmp::min(src.len(), buf.len() - written);
            buf[written..written + len].copy_from_slice(&src[..len]);
            written += len;
            session.stream_cursor += len;
        }

        written
    }

    /// Copies the next content bytes into `buf`.
    pub fn read_content_stream(&mut self, buf: &mut [u8]) -> usize {
        let remaining = self.session.content.as_slice().get(self.session.content_cursor..).unwrap_or_default();
        let len = cmp::min(remaining.len(), buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        self.session.content_cursor += len;
        len
    }

    /// Copies the next content line, without its `\r\n` or `\n`, into `buf` and moves the
    /// content cursor past the line feed. A line longer than `buf` is truncated.
    pub fn read_first_content_line(&mut self, buf: &mut [u8]) -> usize {
        let remaining = self.session.content.as_slice().get(self.session.content_cursor..).unwrap_or_default();
        let (line, advance) = match remaining.iter().position(|&b| b == b'\n') {
            Some(lf) => (&remaining[..lf], lf + 1),
            None => (remaining, remaining.len()),
        };
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let len = cmp::min(line.len(), buf.len());
        buf[..len].copy_from_slice(&line[..len]);
        self.session.content_cursor += advance;
        len
    }

    /// Captures the state needed to continue this message in another decoder.
    pub fn snapshot(&self) -> HttpSnapshot {
        let session = &self.session;
        HttpSnapshot {
            kind: session.header.kind(),
            finished: self.is_finished(),
            header_processing_started: session.header_processing_started,
            data_processing_started: session.data_processing_started,
            content: [session.content.as_slice(), session.sniff.as_ref()].concat(),
            raw_header: session.header_decoder.raw().to_vec(),
            remote_address: self.remote_address,
            remote_port: self.remote_port,
            redirect_url: session.redirect_url.clone(),
            redirect_query_string: session.redirect_query_string.clone(),
            redirect_status: session.redirect_status,
        }
    }

    /// Rebuilds a decoder from a snapshot by replaying its raw header.
    ///
    /// An unfinished chunked body resumes at a chunk boundary, and a sniffing decision
    /// still pending is replaced by the undetermined-length body decoder.
    pub fn restore(snapshot: HttpSnapshot, config: HttpDecoderConfig) -> Result<Self, ParseError> {
        let mut decoder = Self::with_config(config);
        decoder.remote_address = snapshot.remote_address;
        decoder.remote_port = snapshot.remote_port;

        let session = &mut decoder.session;
        session.header_processing_started = snapshot.header_processing_started;
        session.data_processing_started = snapshot.data_processing_started;
        session.redirect_url = snapshot.redirect_url;
        session.redirect_query_string = snapshot.redirect_query_string;
        session.redirect_status = snapshot.redirect_status;

        let (_, header) = session.header_decoder.decode(&snapshot.raw_header)?;
        let Some(mut header) = header else {
            return Ok(decoder);
        };
        header.set_remote_endpoint(snapshot.remote_address, snapshot.remote_port);
        session.header = header;
        session.content.extend(&snapshot.content)?;

        if snapshot.finished {
            session.finish();
        } else {
            session.phase = Phase::Body(PayloadDecoder::resume(&session.header, snapshot.content.len()));
        }

        Ok(decoder)
    }
}

/// Returns true if the first [`SNIFF_LEN`] body bytes hold a hexadecimal number followed by
/// the start of an XML or JSON document, e.g. `1a\r\n{"id":1...`.
///
/// Only that fixed window is looked at, so the outcome does not depend on how many body
/// bytes arrived together.
fn looks_chunked(body: &[u8], xml: bool, json: bool) -> bool {
    let window = &body[..body.len().min(SNIFF_LEN)];
    let is_marker = |&b: &u8| (xml && b == b'<') || (json && matches!(b, b'{' | b'['));

    let Some(position) = window.iter().position(is_marker) else {
        return false;
    };
    if position == 0 {
        return false;
    }

    let mut prefix = window[..position].iter().copied().skip_while(u8::is_ascii_whitespace).peekable();
    let mut digits = 0;
    while prefix.next_if(u8::is_ascii_hexdigit).is_some() {
        digits += 1;
    }
    digits > 0 && prefix.all(|b| b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use http::{Method, StatusCode};
    use indoc::indoc;

    use super::*;
    use crate::protocol::TransferEncoding;

    fn feed_all(decoder: &mut HttpDecoder, input: &[u8]) -> usize {
        decoder.process_bytes(input).unwrap()
    }

    #[test]
    fn get_request_is_bodyless() {
        let input = indoc! {"
            GET /index.html?a=1 HTTP/1.1\r
            Host: example.com\r
            \r
        "};

        let mut decoder = HttpDecoder::new();
        assert_eq!(feed_all(&mut decoder, input.as_bytes()), input.len());
        assert!(decoder.is_finished());
        assert!(decoder.header_is_finished());
        assert_eq!(decoder.header().method(), Some(&Method::GET));
        assert_eq!(decoder.header().path(), "/index.html");
        assert_eq!(decoder.header().args(), "a=1");
        assert_eq!(decoder.content_size(), 0);
        assert_eq!(decoder.raw_header(), input.as_bytes());
    }

    #[test]
    fn content_length_body_byte_by_byte() {
        let input = b"POST /submit HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world";

        let mut decoder = HttpDecoder::new();
        for (i, byte) in input.iter().enumerate() {
            assert!(!decoder.is_finished(), "finished early at {i}");
            assert_eq!(decoder.process_bytes(std::slice::from_ref(byte)).unwrap(), 1);
        }
        assert!(decoder.is_finished());
        assert_eq!(decoder.content(), b"hello world");
    }

    #[test]
    fn chunked_request_leaves_pipelined_bytes() {
        let message = indoc! {"
            POST /upload HTTP/1.1\r
            Transfer-Encoding: chunked\r
            \r
            5\r
            hello\r
            6\r
             world\r
            0\r
            \r
        "};
        let next = "GET / HTTP/1.1\r\n\r\n";
        let input = format!("{message}{next}");

        let mut decoder = HttpDecoder::new();
        let consumed = feed_all(&mut decoder, input.as_bytes());
        assert_eq!(consumed, message.len());
        assert!(decoder.is_finished());
        assert!(decoder.header().transfer_encoding().contains(TransferEncoding::CHUNKED));
        assert_eq!(decoder.content(), b"hello world");

        // feeding again resets and starts the next message
        let consumed = feed_all(&mut decoder, &input.as_bytes()[message.len()..]);
        assert_eq!(consumed, next.len());
        assert!(decoder.is_finished());
        assert_eq!(decoder.header().method(), Some(&Method::GET));
        assert_eq!(decoder.content_size(), 0);
    }

    #[test]
    fn redirect_response_is_bodyless() {
        let input = b"HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 20\r\n\r\n";
        let mut decoder = HttpDecoder::new();
        assert_eq!(feed_all(&mut decoder, input), input.len());
        assert!(decoder.is_finished());
        assert_eq!(decoder.kind(), MessageKind::Response);
        assert_eq!(decoder.header().status(), Some(StatusCode::FOUND));
    }

    #[test]
    fn response_until_close() {
        let input = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nsome text";
        let mut decoder = HttpDecoder::new();
        assert_eq!(feed_all(&mut decoder, input), input.len());
        assert!(!decoder.is_finished());
        assert_eq!(feed_all(&mut decoder, b" and more"), 9);

        decoder.set_finished();
        assert!(decoder.is_finished());
        assert_eq!(decoder.content(), b"some text and more");
    }

    #[test]
    fn json_response_finishes_when_complete() {
        let input = b"HTTP/1.1 200 OK\r\nContent-Type: application/json; charset=utf-8\r\n\r\n{\"result\": [1, 2";
        let mut decoder = HttpDecoder::new();
        assert_eq!(feed_all(&mut decoder, input), input.len());
        assert!(!decoder.is_finished());

        assert_eq!(feed_all(&mut decoder, b"]}\r\n"), 4);
        assert!(decoder.is_finished());
        assert_eq!(decoder.content(), b"{\"result\": [1, 2]}");
    }

    #[test]
    fn sniffed_chunked_json() {
        let header = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n";
        let body = b"f\r\n{\"id\":1,\"ok\":1}\r\n0\r\n\r\n";

        let mut decoder = HttpDecoder::new();
        assert_eq!(decoder.process(header, false, true).unwrap(), header.len());

        // fewer than eight body bytes are held back
        assert_eq!(decoder.process(&body[..5], false, true).unwrap(), 5);
        assert!(decoder.data_processing_started());
        assert_eq!(decoder.content_size(), 0);

        assert_eq!(decoder.process(&body[5..], false, true).unwrap(), body.len() - 5);
        assert!(decoder.is_finished());
        assert_eq!(decoder.content(), b"{\"id\":1,\"ok\":1}");
    }

    #[test]
    fn sniffed_plain_xml_is_not_chunked() {
        let header = b"HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\n\r\n";
        let body = b"<?xml version=\"1.0\"?><root/>";

        let mut decoder = HttpDecoder::new();
        let input = [&header[..], &body[..]].concat();
        assert_eq!(decoder.process(&input, true, false).unwrap(), input.len());
        assert!(!decoder.is_finished());
        decoder.set_finished();
        assert_eq!(decoder.content(), body);
    }

    #[test]
    fn sniff_detection() {
        assert!(looks_chunked(b"1a\r\n<root/>", true, false));
        assert!(looks_chunked(b"  FF\n[1,2]", false, true));
        assert!(looks_chunked(b"fffff\r\n{", false, true));
        assert!(!looks_chunked(b"<root/>", true, false));
        assert!(!looks_chunked(b"xyz<root/>", true, false));
        assert!(!looks_chunked(b"1a\r\n<root/>", false, true));
        assert!(!looks_chunked(b"12 34 {", false, true));
        // the marker must fall inside the sniffed window
        assert!(!looks_chunked(b"0000000000\r\n{\"a\":1}", false, true));
    }

    #[test]
    fn content_limit() {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 9\r\n\r\n123456789";

        let mut decoder = HttpDecoder::with_config(HttpDecoderConfig::default().max_content_size(9));
        assert_eq!(feed_all(&mut decoder, input), input.len());
        assert!(decoder.is_finished());

        let mut decoder = HttpDecoder::new();
        decoder.set_max_content_size(8);
        let result = decoder.process_bytes(input);
        assert!(matches!(result, Err(ParseError::TooLargeContent { .. })));
    }

    #[test]
    fn header_limit() {
        let input = b"GET / HTTP/1.1\r\nHost: a\r\n\r\n";
        let mut decoder = HttpDecoder::new();
        decoder.set_max_header_size(input.len() - 1);
        assert!(matches!(decoder.process_bytes(input), Err(ParseError::TooLargeHeader { .. })));

        // the limit survives a reset
        decoder.reset();
        assert!(matches!(decoder.process_bytes(input), Err(ParseError::TooLargeHeader { .. })));
    }

    #[test]
    fn reset_matches_fresh_decoder() {
        let first = b"POST /a HTTP/1.1\r\nContent-Length: 10\r\n\r\nhalf";
        let second = b"PUT /b HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";

        let mut reused = HttpDecoder::new();
        feed_all(&mut reused, first);
        reused.reset();
        feed_all(&mut reused, second);

        let mut fresh = HttpDecoder::new();
        feed_all(&mut fresh, second);

        assert_eq!(reused.snapshot(), fresh.snapshot());
        assert_eq!(reused.header().path(), "/b");
    }

    #[test]
    fn take_moves_the_message_out() {
        let input = b"POST /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let mut decoder = HttpDecoder::new();

        feed_all(&mut decoder, &input[..input.len() - 1]);
        assert!(decoder.take().is_none());

        feed_all(&mut decoder, &input[input.len() - 1..]);
        let message = decoder.take().unwrap();
        assert_eq!(message.header.path(), "/a");
        assert_eq!(&message.content[..], b"abc");
        assert!(!decoder.is_finished());
        assert!(!decoder.header_processing_started());
    }

    #[test]
    fn readers() {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 17\r\n\r\nfirst\r\nsecond\nend";
        let mut decoder = HttpDecoder::new();
        feed_all(&mut decoder, input);
        assert!(decoder.is_finished());

        let mut buf = [0u8; 16];
        let mut streamed = Vec::new();
        loop {
            let len = decoder.read_stream(&mut buf);
            if len == 0 {
                break;
            }
            streamed.extend_from_slice(&buf[..len]);
        }
        assert_eq!(streamed, input);

        let len = decoder.read_first_content_line(&mut buf);
        assert_eq!(&buf[..len], b"first");
        let len = decoder.read_first_content_line(&mut buf);
        assert_eq!(&buf[..len], b"second");
        let len = decoder.read_content_stream(&mut buf);
        assert_eq!(&buf[..len], b"end");
        assert_eq!(decoder.read_content_stream(&mut buf), 0);
    }

    #[test]
    fn snapshot_restore() {
        let input = b"POST /a HTTP/1.1\r\nContent-Length: 6\r\n\r\nabc";
        let mut decoder = HttpDecoder::new();
        decoder.set_remote_endpoint(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), 5000);
        decoder.set_redirect("/b", "x=1", Some(302));
        feed_all(&mut decoder, input);

        let snapshot = decoder.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let snapshot: HttpSnapshot = serde_json::from_str(&json).unwrap();

        let mut restored = HttpDecoder::restore(snapshot, HttpDecoderConfig::default()).unwrap();
        assert!(restored.header_is_finished());
        assert_eq!(restored.header().path(), "/a");
        assert_eq!(restored.header().remote_port(), 5000);
        assert_eq!(restored.redirect_url(), "/b");
        assert_eq!(restored.redirect_query_string(), "x=1");
        assert_eq!(restored.redirect_status(), Some(302));

        assert_eq!(feed_all(&mut restored, b"def"), 3);
        assert!(restored.is_finished());
        assert_eq!(restored.content(), b"abcdef");
    }

    #[test]
    fn snapshot_keeps_sniffed_bytes() {
        let mut decoder = HttpDecoder::new();
        decoder.process(b"HTTP/1.0 200 OK\r\n\r\nabc", true, true).unwrap();
        assert_eq!(decoder.content_size(), 0);

        let snapshot = decoder.snapshot();
        assert_eq!(snapshot.content, b"abc");

        let mut restored = HttpDecoder::restore(snapshot, HttpDecoderConfig::default()).unwrap();
        assert_eq!(restored.process(b"defghij", true, true).unwrap(), 7);
        restored.set_finished();
        assert_eq!(restored.content(), b"abcdefghij");
    }

    #[test]
    fn remote_endpoint_is_kept_across_messages() {
        let mut decoder = HttpDecoder::new();
        decoder.set_remote_endpoint(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))), 8080);
        feed_all(&mut decoder, b"GET / HTTP/1.1\r\n\r\n");
        feed_all(&mut decoder, b"GET /next HTTP/1.1\r\n\r\n");
        assert_eq!(decoder.header().path(), "/next");
        assert_eq!(decoder.header().remote_address(), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert_eq!(decoder.header().remote_port(), 8080);
    }

    #[test]
    fn malformed_header_is_fatal() {
        let mut decoder = HttpDecoder::new();
        let result = decoder.process_bytes(b"GET / HTTP/1.1\r\nTransfer-Encoding: banana\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedToken { .. })));
    }
}
