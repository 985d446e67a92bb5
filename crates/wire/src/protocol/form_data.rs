use std::collections::HashMap;

use bytes::Bytes;

/// One part of a `multipart/form-data` body.
///
/// A part whose own content type is `multipart/mixed` keeps its raw bytes in
/// [`FormData::data`] and the decoded sub parts in [`FormData::multipart_mixed`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormData {
    /// The disposition type, usually `form-data` or `file`.
    pub content_disposition: String,
    /// The unquoted `name` parameter of `Content-Disposition`.
    pub name: String,
    /// The unquoted `filename` parameter of `Content-Disposition`.
    pub filename: String,
    /// The lower-case media type essence of the part.
    pub content_type: String,
    pub content_type_full: String,
    /// All part headers keyed by lower-case name.
    pub fields: HashMap<String, String>,
    pub data: Bytes,
    pub multipart_mixed: Vec<FormData>,
}

impl FormData {
    pub fn is_file(&self) -> bool {
        !self.filename.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
