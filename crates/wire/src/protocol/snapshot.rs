//! Serializable capture of an in-flight HTTP decode.
//!
//! A snapshot keeps just enough to rebuild a decoder elsewhere: the raw header is
//! replayed through the normal header parser on restore, the content is copied back
//! as-is.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::protocol::MessageKind;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSnapshot {
    pub kind: MessageKind,
    pub finished: bool,
    pub header_processing_started: bool,
    pub data_processing_started: bool,
    pub content: Vec<u8>,
    pub raw_header: Vec<u8>,
    pub remote_address: Option<IpAddr>,
    pub remote_port: u16,
    pub redirect_url: String,
    pub redirect_query_string: String,
    pub redirect_status: Option<u16>,
}
