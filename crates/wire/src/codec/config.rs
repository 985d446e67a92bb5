//! Size limits applied by [`HttpDecoder`](crate::codec::HttpDecoder).

/// Default upper bound for the header block, terminator included: 100 KiB
pub const DEFAULT_MAX_HEADER_SIZE: usize = 100 * 1024;

/// Default upper bound for the decoded content: 100 MiB
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 100 * 1024 * 1024;

/// Limits for one [`HttpDecoder`](crate::codec::HttpDecoder).
///
/// ```
/// use micro_wire::codec::HttpDecoderConfig;
///
/// let config = HttpDecoderConfig::default().max_header_size(8 * 1024).max_content_size(1024 * 1024);
/// assert_eq!(config.get_max_header_size(), 8 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDecoderConfig {
    max_header_size: usize,
    max_content_size: usize,
}

impl Default for HttpDecoderConfig {
    fn default() -> Self {
        Self { max_header_size: DEFAULT_MAX_HEADER_SIZE, max_content_size: DEFAULT_MAX_CONTENT_SIZE }
    }
}

impl HttpDecoderConfig {
    #[must_use]
    pub fn max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    #[must_use]
    pub fn max_content_size(mut self, max_content_size: usize) -> Self {
        self.max_content_size = max_content_size;
        self
    }

    pub fn get_max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn get_max_content_size(&self) -> usize {
        self.max_content_size
    }
}
