//! `multipart/form-data` extraction.
//!
//! A multipart body is a sequence of parts separated by `--boundary` lines and closed by
//! `--boundary--`:
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="field"\r\n
//! \r\n
//! value\r\n
//! --boundary--\r\n
//! ```
//!
//! Parts of type `multipart/mixed` are split again with their own boundary.

use std::collections::HashMap;

use bytes::Bytes;
use httparse::Status;
use tracing::{debug, trace};

use crate::codec::header::media_type_essence;
use crate::ensure;
use crate::protocol::{FormData, ParseError};

const MAX_PART_HEADERS: usize = 32;

/// Maximum number of `multipart/mixed` levels nested inside the outer body
pub const MAX_MULTIPART_DEPTH: usize = 8;

/// Splits `body` into its parts, using the `boundary` parameter of `content_type_full`.
///
/// # Errors
///
/// - [`ParseError::MissingBoundary`] if the content type has no boundary
/// - [`ParseError::InvalidMultipart`] if a part is not terminated by a delimiter, its
///   headers are malformed or `multipart/mixed` parts nest deeper than
///   [`MAX_MULTIPART_DEPTH`]
pub fn decode_multipart(content_type_full: &str, body: &[u8]) -> Result<Vec<FormData>, ParseError> {
    decode_nested(content_type_full, body, 0)
}

fn decode_nested(content_type_full: &str, body: &[u8], depth: usize) -> Result<Vec<FormData>, ParseError> {
    if depth > MAX_MULTIPART_DEPTH {
        debug!(depth, max_depth = MAX_MULTIPART_DEPTH, "multipart nesting exceeds the limit");
    }
    ensure!(depth <= MAX_MULTIPART_DEPTH, ParseError::invalid_multipart("nesting too deep"));

    let boundary = parse_boundary(content_type_full).ok_or(ParseError::MissingBoundary)?;
    let delimiter = [b"--", boundary.as_bytes()].concat();

    let mut pos = find(body, &delimiter, 0).ok_or_else(|| ParseError::invalid_multipart("no delimiter found"))?;
    let mut parts = Vec::new();

    loop {
        pos += delimiter.len();
        if body[pos..].starts_with(b"--") {
            break;
        }
        pos += line_end(&body[pos..]).ok_or_else(|| ParseError::invalid_multipart("unterminated delimiter line"))?;

        let headers_len = part_headers_len(&body[pos..])
            .ok_or_else(|| ParseError::invalid_multipart("unterminated part header"))?;
        let headers = &body[pos..pos + headers_len];
        let data_start = pos + headers_len;

        let next = find(body, &delimiter, data_start)
            .ok_or_else(|| ParseError::invalid_multipart("part is not closed by a delimiter"))?;
        let data = &body[data_start..next];
        let data = data.strip_suffix(b"\r\n").or_else(|| data.strip_suffix(b"\n")).unwrap_or(data);

        parts.push(decode_part(headers, data, depth)?);
        pos = next;
    }

    trace!(parts = parts.len(), "decoded multipart body");
    Ok(parts)
}

fn decode_part(headers: &[u8], data: &[u8], depth: usize) -> Result<FormData, ParseError> {
    let mut part = FormData { data: Bytes::copy_from_slice(data), ..FormData::default() };

    let fields = parse_part_headers(headers)?;
    if let Some(disposition) = fields.get("content-disposition") {
        let mut params = disposition.split(';');
        part.content_disposition = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        for (name, value) in params.filter_map(|param| param.split_once('=')) {
            let value = unquote(value.trim());
            match name.trim().to_ascii_lowercase().as_str() {
                "name" => part.name = value.to_string(),
                "filename" => part.filename = value.to_string(),
                _ => {}
            }
        }
    }

    if let Some(content_type) = fields.get("content-type") {
        part.content_type_full.clone_from(content_type);
        part.content_type = media_type_essence(content_type);
        if part.content_type == "multipart/mixed" {
            part.multipart_mixed = decode_nested(content_type, data, depth + 1)?;
        }
    }

    part.fields = fields;
    Ok(part)
}

fn parse_part_headers(block: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    // an empty block has no blank line left for httparse
    if block.iter().all(|&b| b == b'\r' || b == b'\n') {
        return Ok(HashMap::new());
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_PART_HEADERS];
    let fields = match httparse::parse_headers(block, &mut headers) {
        Ok(Status::Complete((_, fields))) => fields,
        Ok(Status::Partial) => return Err(ParseError::invalid_multipart("incomplete part header")),
        Err(e) => return Err(ParseError::invalid_multipart(e)),
    };

    Ok(fields
        .iter()
        .map(|field| {
            (field.name.to_ascii_lowercase(), String::from_utf8_lossy(field.value).trim().to_string())
        })
        .collect())
}

/// Reads the `boundary` parameter, quoted or not.
fn parse_boundary(content_type_full: &str) -> Option<String> {
    if let Ok(mime) = content_type_full.parse::<mime::Mime>() {
        return mime
            .get_param(mime::BOUNDARY)
            .map(|boundary| unquote(boundary.as_str()).to_string())
            .filter(|boundary| !boundary.is_empty());
    }

    content_type_full.split(';').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        let value = unquote(value.trim());
        (name.trim().eq_ignore_ascii_case("boundary") && !value.is_empty()).then(|| value.to_string())
    })
}

fn unquote(value: &str) -> &str {
    value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|window| window == needle).map(|at| from + at)
}

/// Length of the rest of the current line, line feed included.
fn line_end(src: &[u8]) -> Option<usize> {
    src.iter().position(|&b| b == b'\n').map(|lf| lf + 1)
}

/// Length of the part header block, blank line included.
fn part_headers_len(src: &[u8]) -> Option<usize> {
    if src.starts_with(b"\r\n") {
        return Some(2);
    }
    if src.starts_with(b"\n") {
        return Some(1);
    }

    src.iter().enumerate().filter(|&(_, &b)| b == b'\n').find_map(|(i, _)| match (src.get(i + 1), src.get(i + 2)) {
        (Some(b'\n'), _) => Some(i + 2),
        (Some(b'\r'), Some(b'\n')) => Some(i + 3),
        _ => None,
    })
}
