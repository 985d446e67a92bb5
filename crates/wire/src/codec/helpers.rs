//! Stateless HTTP text helpers: URL percent-encoding and header construction.

use std::fmt::Write;

use http::StatusCode;

/// Percent-encodes everything except the RFC 3986 unreserved characters.
pub fn encode_url(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            encoded.push(char::from(b));
        } else {
            // writing into a String never fails
            let _ = write!(encoded, "%{b:02X}");
        }
    }
    encoded
}

/// Decodes `%XX` escapes and `+` as space. Escapes that are not two hex digits are kept
/// as they are, and invalid UTF-8 is replaced.
pub fn decode_url(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => match (bytes.get(i + 1).copied().and_then(hex_value), bytes.get(i + 2).copied().and_then(hex_value)) {
                (Some(high), Some(low)) => {
                    decoded.push((high << 4) | low);
                    i += 2;
                }
                _ => decoded.push(b'%'),
            },
            b => decoded.push(b),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).and_then(|digit| u8::try_from(digit).ok())
}

/// Builds a response header block: status line, `Content-Type` (when not empty),
/// `Content-Length`, the additional header lines and the terminating blank line.
///
/// Any `Location:` line among `additional_headers` turns the status into
/// `301 Moved Permanently`.
pub fn construct_header(content_length: u64, content_type: &str, status: StatusCode, additional_headers: &[&str]) -> String {
    let status = if additional_headers.iter().any(|line| field_name(line).eq_ignore_ascii_case("location")) {
        StatusCode::MOVED_PERMANENTLY
    } else {
        status
    };

    let mut header = String::with_capacity(128);
    let _ = write!(header, "HTTP/1.1 {} {}\r\n", status.as_u16(), status.canonical_reason().unwrap_or("Unknown"));
    if !content_type.is_empty() {
        let _ = write!(header, "Content-Type: {content_type}\r\n");
    }
    let _ = write!(header, "Content-Length: {content_length}\r\n");
    push_lines(&mut header, additional_headers);
    header.push_str("\r\n");
    header
}

/// Rebuilds `raw_header` without the fields named in `names_to_strip` (case-insensitive),
/// appending `fields_to_add` before the terminating blank line.
pub fn strip_header(raw_header: &str, names_to_strip: &[&str], fields_to_add: &[&str]) -> String {
    let mut header = String::with_capacity(raw_header.len());
    let mut lines = raw_header.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    if let Some(start_line) = lines.next() {
        header.push_str(start_line);
        header.push_str("\r\n");
    }

    lines
        .take_while(|line| !line.is_empty())
        .filter(|line| !names_to_strip.iter().any(|name| field_name(line).eq_ignore_ascii_case(name.trim())))
        .for_each(|line| {
            header.push_str(line);
            header.push_str("\r\n");
        });

    push_lines(&mut header, fields_to_add);
    header.push_str("\r\n");
    header
}

fn field_name(line: &str) -> &str {
    line.split_once(':').map_or("", |(name, _)| name.trim())
}

fn push_lines(header: &mut String, lines: &[&str]) {
    for line in lines {
        let line = line.trim_end_matches(['\r', '\n']);
        if !line.is_empty() {
            header.push_str(line);
            header.push_str("\r\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn url_round_trip() {
        let text = "a b/c?d=é&~x";
        let encoded = encode_url(text);
        assert_eq!(encoded, "a%20b%2Fc%3Fd%3D%C3%A9%26~x");
        assert_eq!(decode_url(&encoded), text);
    }

    #[test]
    fn decode_plus_and_invalid_escapes() {
        assert_eq!(decode_url("hello+world"), "hello world");
        assert_eq!(decode_url("100%"), "100%");
        assert_eq!(decode_url("%zz%4"), "%zz%4");
        assert_eq!(decode_url("%41%62c"), "Abc");
    }

    #[test]
    fn construct_plain_header() {
        let header = construct_header(5, "text/plain", StatusCode::OK, &["Server: micro-wire"]);
        assert_eq!(
            header,
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nServer: micro-wire\r\n\r\n"
        );
    }

    #[test]
    fn location_forces_redirect() {
        let header = construct_header(0, "", StatusCode::OK, &["location: /new\r\n"]);
        assert_eq!(header, "HTTP/1.1 301 Moved Permanently\r\nContent-Length: 0\r\nlocation: /new\r\n\r\n");
    }

    #[test]
    fn strip_and_replace_fields() {
        let raw = indoc! {"
            POST /upload HTTP/1.1\r
            Host: example.com\r
            Content-Length: 12\r
            X-Debug: 1\r
            \r
        "};

        let stripped = strip_header(raw, &["content-length", "x-debug"], &["Transfer-Encoding: chunked"]);
        assert_eq!(stripped, "POST /upload HTTP/1.1\r\nHost: example.com\r\nTransfer-Encoding: chunked\r\n\r\n");
    }
}
