//! HTTP header decoder for requests and responses.
//!
//! Bytes are accumulated until the header terminator (`\r\n\r\n`, or a bare `\n\n`) has
//! been seen, then the whole block is parsed once into an [`HttpHeader`].
//!
//! # Terminator detection
//!
//! A terminator may straddle any two calls. Instead of rescanning the accumulated bytes,
//! the decoder stitches the last three buffered bytes to the first three new bytes and
//! searches that seam, then searches the new bytes alone. Each byte is therefore looked
//! at a bounded number of times however the stream is cut.
//!
//! # Limits
//!
//! - Maximum header size: configurable, checked on every append
//! - Maximum number of header fields: 128

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Method, StatusCode, Version};
use httparse::Status;
use tracing::{debug, trace};

use crate::codec::header::target::RequestTarget;
use crate::ensure;
use crate::protocol::{
    AcceptEncoding, Connection, ContentEncoding, HttpHeader, MessageKind, ParseError, TransferEncoding,
};

/// Maximum number of header fields allowed in a message
const MAX_HEADER_NUM: usize = 128;

/// Bytes kept from the buffered side when looking for a split terminator
const SEAM: usize = 3;

/// Accumulates and parses one header block.
#[derive(Debug)]
pub(crate) struct HeaderDecoder {
    raw: BytesMut,
    max_size: usize,
}

impl HeaderDecoder {
    pub(crate) fn new(max_size: usize) -> Self {
        Self { raw: BytesMut::new(), max_size }
    }

    pub(crate) fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// The header bytes accumulated so far, terminator included once complete.
    pub(crate) fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Feeds bytes to the header parser.
    ///
    /// # Returns
    ///
    /// - `Ok((consumed, Some(header)))` once the terminator has been found; bytes after it
    ///   are not consumed
    /// - `Ok((consumed, None))` if more data is needed, in which case every byte was consumed
    /// - `Err(ParseError)` if the header is too large or malformed
    pub(crate) fn decode(&mut self, src: &[u8]) -> Result<(usize, Option<HttpHeader>), ParseError> {
        // empty lines ahead of a start line are ignored (RFC 7230 §3.5)
        let skipped = if self.raw.is_empty() { src.iter().take_while(|&&b| b == b'\r' || b == b'\n').count() } else { 0 };
        let src = &src[skipped..];

        if src.is_empty() {
            return Ok((skipped, None));
        }

        match find_header_end(&self.raw, src) {
            Some(end) => {
                self.append(&src[..end])?;
                trace!(header_size = self.raw.len(), "found end of header");
                let header = parse_header(&self.raw)?;
                Ok((skipped + end, Some(header)))
            }
            None => {
                self.append(src)?;
                Ok((skipped + src.len(), None))
            }
        }
    }

    fn append(&mut self, src: &[u8]) -> Result<(), ParseError> {
        let current_size = self.raw.len() + src.len();
        if current_size > self.max_size {
            debug!(current_size, max_size = self.max_size, "header exceeds the limit");
        }
        ensure!(current_size <= self.max_size, ParseError::too_large_header(current_size, self.max_size));
        self.raw.extend_from_slice(src);
        Ok(())
    }
}

/// Returns the number of bytes of `src` that complete the header, terminator included.
fn find_header_end(buffered: &[u8], src: &[u8]) -> Option<usize> {
    let tail = &buffered[buffered.len().saturating_sub(SEAM)..];
    if !tail.is_empty() {
        let head = &src[..src.len().min(SEAM)];
        let mut seam = [0u8; SEAM * 2];
        seam[..tail.len()].copy_from_slice(tail);
        seam[tail.len()..tail.len() + head.len()].copy_from_slice(head);

        if let Some(end) = terminator_end(&seam[..tail.len() + head.len()])
            && end > tail.len()
        {
            return Some(end - tail.len());
        }
    }

    terminator_end(src)
}

/// Position right after the first `\n\n` or `\n\r\n` in `buf`.
fn terminator_end(buf: &[u8]) -> Option<usize> {
    buf.iter().enumerate().filter(|&(_, &b)| b == b'\n').find_map(|(i, _)| match (buf.get(i + 1), buf.get(i + 2)) {
        (Some(b'\n'), _) => Some(i + 2),
        (Some(b'\r'), Some(b'\n')) => Some(i + 3),
        _ => None,
    })
}

/// Parses a complete header block, terminator included.
fn parse_header(raw: &[u8]) -> Result<HttpHeader, ParseError> {
    let line_end =
        raw.iter().position(|&b| b == b'\n').ok_or_else(|| ParseError::invalid_request_line("missing start line"))?;
    let line = raw[..line_end].strip_suffix(b"\r").unwrap_or(&raw[..line_end]);
    let line = std::str::from_utf8(line).map_err(|e| ParseError::invalid_request_line(format!("start line is not valid utf-8: {e}")))?;

    let mut header = HttpHeader::default();
    if line.starts_with("HTTP/") {
        parse_status_line(line, &mut header)?;
    } else {
        parse_request_line(line, &mut header)?;
    }

    parse_fields(&raw[line_end + 1..], &mut header)?;

    // refer: https://www.rfc-editor.org/rfc/rfc7230#section-3.3.3
    if header.transfer_encoding.is_chunked() {
        header.content_length = None;
    }

    header.parsed = true;
    trace!(kind = ?header.kind, method = ?header.method, status = ?header.status, path = %header.path, "parsed header");
    Ok(header)
}

fn parse_version(version: &str) -> Result<Version, ParseError> {
    match version {
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        // accepted as a label only, framing stays HTTP/1.x
        "HTTP/2" | "HTTP/2.0" => Ok(Version::HTTP_2),
        v => {
            debug!(http_version = v, "unsupported http version");
            Err(ParseError::invalid_version(v))
        }
    }
}

fn parse_status_line(line: &str, header: &mut HttpHeader) -> Result<(), ParseError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().ok_or_else(|| ParseError::invalid_request_line("missing status code"))?;

    header.kind = MessageKind::Response;
    header.version = parse_version(version)?;

    let code = code.trim().parse::<u16>().map_err(|e| ParseError::invalid_request_line(format!("invalid status code {code:?}: {e}")))?;
    header.status = Some(StatusCode::from_u16(code).map_err(ParseError::invalid_request_line)?);
    Ok(())
}

fn parse_request_line(line: &str, header: &mut HttpHeader) -> Result<(), ParseError> {
    let mut parts = line.split(' ').filter(|part| !part.is_empty());
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(ParseError::invalid_request_line(format!("malformed request line {line:?}")));
    };

    header.kind = MessageKind::Request;
    header.method = Some(Method::from_bytes(method.as_bytes()).map_err(ParseError::invalid_request_line)?);
    header.version = parse_version(version)?;

    let RequestTarget { path, path_info, args } = RequestTarget::parse(target);
    header.path = path;
    header.path_info = path_info;
    header.args = args;
    Ok(())
}

fn parse_fields(block: &[u8], header: &mut HttpHeader) -> Result<(), ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];

    let fields = match httparse::parse_headers(block, &mut headers) {
        Ok(Status::Complete((_, fields))) => fields,
        Ok(Status::Partial) => return Err(ParseError::invalid_header("incomplete header block")),
        Err(httparse::Error::TooManyHeaders) => return Err(ParseError::too_many_headers(MAX_HEADER_NUM)),
        Err(e) => return Err(ParseError::invalid_header(e)),
    };

    header.fields.reserve(fields.len());
    for field in fields {
        let name = HeaderName::from_bytes(field.name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(field.value).map_err(ParseError::invalid_header)?;
        let text = String::from_utf8_lossy(field.value);
        let text = text.trim();

        match name.as_str() {
            "content-length" => {
                let length = text
                    .parse::<u64>()
                    .map_err(|e| ParseError::invalid_content_length(format!("value {text} is not u64: {e}")))?;
                header.content_length = Some(length);
            }
            "host" => header.host = text.to_string(),
            "content-type" => {
                header.content_type_full = text.to_string();
                header.content_type = media_type_essence(text);
            }
            "accept-encoding" => header.accept_encoding = AcceptEncoding::parse_list_lenient(text),
            "content-encoding" => {
                header.content_encoding =
                    ContentEncoding::parse_list(text).map_err(|token| ParseError::unsupported_token("content-encoding", token))?;
            }
            "transfer-encoding" => {
                let encoding = TransferEncoding::parse_list(text)
                    .map_err(|token| ParseError::unsupported_token("transfer-encoding", token))?;
                header.transfer_encoding |= encoding.with_implied_chunked();
            }
            "te" => {
                header.te = TransferEncoding::parse_list(text).map_err(|token| ParseError::unsupported_token("te", token))?;
            }
            "connection" => {
                header.connection =
                    Connection::parse_list(text).map_err(|token| ParseError::unsupported_token("connection", token))?;
            }
            "cookie" => {
                header.cookie = text.to_string();
                header.cookies = parse_cookies(text);
            }
            "authorization" => header.authorization = text.to_string(),
            _ => {}
        }

        header.fields.insert(name, value);
    }

    Ok(())
}

/// The lower-case `type/subtype` of a media type, parameters dropped.
pub(crate) fn media_type_essence(value: &str) -> String {
    match value.parse::<mime::Mime>() {
        Ok(mime) => mime.essence_str().to_string(),
        Err(_) => value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase(),
    }
}

fn parse_cookies(value: &str) -> std::collections::HashMap<String, String> {
    value
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode_whole(input: &[u8]) -> Result<(usize, Option<HttpHeader>), ParseError> {
        HeaderDecoder::new(8 * 1024).decode(input)
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##};

        let (consumed, header) = decode_whole(str.as_bytes()).unwrap();
        let header = header.unwrap();

        assert_eq!(consumed, str.len() - 3);
        assert!(header.is_parsed());
        assert!(header.is_request());
        assert_eq!(header.method(), Some(&Method::GET));
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.path(), "/index.html");
        assert_eq!(header.args(), "");
        assert_eq!(header.host(), "127.0.0.1:8080");
        assert_eq!(header.fields().len(), 3);
        assert_eq!(header.field("user-agent"), Some("curl/7.79.1"));
        assert_eq!(header.field("ACCEPT"), Some("*/*"));
    }

    #[test]
    fn from_edge() {
        let str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        sec-ch-ua: "#Not_A Brand";v="99", "Microsoft Edge";v="109", "Chromium";v="109"
        sec-ch-ua-mobile: ?0
        sec-ch-ua-platform: "macOS"
        Upgrade-Insecure-Requests: 1
        User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36 Edg/109.0.1518.52
        Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9
        Sec-Fetch-Site: none
        Sec-Fetch-Mode: navigate
        Sec-Fetch-User: ?1
        Sec-Fetch-Dest: document
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7
        Cookie: session=abc123; theme = dark

        "##};

        let header = decode_whole(str.as_bytes()).unwrap().1.unwrap();

        assert_eq!(header.path(), "/index/");
        assert_eq!(header.args(), "a=1&b=2&a=3");
        assert_eq!(header.fields().len(), 16);
        assert!(header.connection().contains(Connection::KEEP_ALIVE));
        assert!(header.accept_encoding().contains(AcceptEncoding::GZIP));
        assert!(header.accept_encoding().contains(AcceptEncoding::DEFLATE));
        assert!(header.accept_encoding().contains(AcceptEncoding::BR));
        assert_eq!(header.field("sec-ch-ua-platform"), Some("\"macOS\""));
        assert_eq!(header.cookie(), "session=abc123; theme = dark");
        assert_eq!(header.cookies().get("session").map(String::as_str), Some("abc123"));
        assert_eq!(header.cookies().get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn response_status_line() {
        let input = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Length: 12\r\n\r\n";
        let header = decode_whole(input).unwrap().1.unwrap();

        assert_eq!(header.kind(), MessageKind::Response);
        assert_eq!(header.method(), None);
        assert_eq!(header.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(header.content_length(), 12);
        assert_eq!(header.content_type(), "text/html");
        assert_eq!(header.content_type_full(), "text/html; charset=UTF-8");
    }

    #[test]
    fn bare_lf_terminator() {
        let input = b"NOTIFY * HTTP/1.1\nHOST: 239.255.255.250:1900\nNTS: ssdp:alive\n\nrest";
        let (consumed, header) = decode_whole(input).unwrap();
        let header = header.unwrap();

        assert_eq!(consumed, input.len() - 4);
        assert_eq!(header.method().map(Method::as_str), Some("NOTIFY"));
        assert_eq!(header.host(), "239.255.255.250:1900");
        assert_eq!(header.field("nts"), Some("ssdp:alive"));
    }

    #[test]
    fn leading_empty_lines_are_skipped() {
        let input = b"\r\n\r\nGET / HTTP/1.0\r\n\r\n";
        let (consumed, header) = decode_whole(input).unwrap();
        assert_eq!(consumed, input.len());
        assert_eq!(header.unwrap().version(), Version::HTTP_10);
    }

    #[test]
    fn terminator_split_at_every_position() {
        let input = b"GET /a HTTP/1.1\r\nHost: h\r\n\r\nBODY";
        let header_len = input.len() - 4;

        for first in 1..header_len {
            for second in first..header_len {
                let mut decoder = HeaderDecoder::new(1024);
                let (consumed, header) = decoder.decode(&input[..first]).unwrap();
                assert_eq!(consumed, first);
                assert!(header.is_none());

                let (consumed, header) = decoder.decode(&input[first..second]).unwrap();
                assert_eq!(consumed, second - first);
                assert!(header.is_none(), "premature header at {first}/{second}");

                let (consumed, header) = decoder.decode(&input[second..]).unwrap();
                assert_eq!(consumed, header_len - second, "split {first}/{second}");
                assert_eq!(header.unwrap().host(), "h");
                assert_eq!(decoder.raw(), &input[..header_len]);
            }
        }
    }

    #[test]
    fn seam_handles_every_terminator_shape() {
        let cases: [(&[u8], &[u8], usize); 5] = [
            (b"GET / HTTP/1.1\n", b"\nX", 1),
            (b"GET / HTTP/1.1\r", b"\n\r\nX", 3),
            (b"GET / HTTP/1.1\r\n", b"\r\nX", 2),
            (b"GET / HTTP/1.1\r\n\r", b"\nX", 1),
            (b"GET / HTTP/1.1\r\nA: b", b"\r\n\r\nX", 4),
        ];

        for (first, second, expected) in cases {
            let mut decoder = HeaderDecoder::new(1024);
            assert_eq!(decoder.decode(first).unwrap().0, first.len());
            let (consumed, header) = decoder.decode(second).unwrap();
            assert_eq!(consumed, expected);
            assert!(header.is_some());
        }
    }

    #[test]
    fn header_size_limit() {
        let input = b"GET / HTTP/1.1\r\nHost: h\r\n\r\n";

        let mut decoder = HeaderDecoder::new(input.len());
        assert!(decoder.decode(input).unwrap().1.is_some());

        let mut decoder = HeaderDecoder::new(input.len() - 1);
        let result = decoder.decode(input);
        assert!(matches!(result, Err(ParseError::TooLargeHeader { .. })));

        // without a terminator the limit applies to every partial append
        let mut decoder = HeaderDecoder::new(16);
        decoder.decode(b"GET /0123456").unwrap();
        assert!(matches!(decoder.decode(b"789abc"), Err(ParseError::TooLargeHeader { current_size: 18, max_size: 16 })));
    }

    #[test]
    fn chunked_voids_content_length() {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 20\r\nTransfer-Encoding: chunked\r\n\r\n";
        let header = decode_whole(input).unwrap().1.unwrap();
        assert!(header.transfer_encoding().is_chunked());
        assert!(!header.has_content_length());
        assert_eq!(header.content_length(), 0);
    }

    #[test]
    fn unknown_tokens_are_fatal() {
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: foo\r\n\r\n";
        assert!(matches!(decode_whole(input), Err(ParseError::UnsupportedToken { field: "transfer-encoding", .. })));

        let input = b"GET / HTTP/1.1\r\nConnection: keep-alive, banana\r\n\r\n";
        assert!(matches!(decode_whole(input), Err(ParseError::UnsupportedToken { field: "connection", .. })));

        let input = b"HTTP/1.1 200 OK\r\nContent-Encoding: rot13\r\n\r\n";
        assert!(matches!(decode_whole(input), Err(ParseError::UnsupportedToken { field: "content-encoding", .. })));
    }

    #[test]
    fn invalid_start_lines() {
        assert!(matches!(decode_whole(b"GET / HTTP/3.0\r\n\r\n"), Err(ParseError::InvalidVersion(_))));
        assert!(matches!(decode_whole(b"HTTP/1.2 200 OK\r\n\r\n"), Err(ParseError::InvalidVersion(_))));
        assert!(matches!(decode_whole(b"GET /\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(decode_whole(b"HTTP/1.1 abc OK\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(decode_whole(b"HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidRequestLine { .. })));
        assert!(matches!(
            decode_whole(b"GET / HTTP/1.1\r\nContent-Length: -1\r\n\r\n"),
            Err(ParseError::InvalidContentLength { .. })
        ));
    }

    #[test]
    fn http2_label_is_accepted() {
        let header = decode_whole(b"GET / HTTP/2.0\r\n\r\n").unwrap().1.unwrap();
        assert_eq!(header.version(), Version::HTTP_2);
    }

    #[test]
    fn essence_of_media_types() {
        assert_eq!(media_type_essence("Application/JSON; charset=utf-8"), "application/json");
        assert_eq!(media_type_essence("multipart/form-data; boundary=abc"), "multipart/form-data");
        assert_eq!(media_type_essence("not a mime; x"), "not a mime");
    }
}
