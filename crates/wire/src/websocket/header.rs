//! WebSocket frame header (RFC 6455 §5.2).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! ```

/// Longest possible frame header: 2 fixed bytes, 8 bytes of length, 4 bytes of key
pub const MAX_FRAME_HEADER_LEN: usize = 14;

/// Frame opcode. Opcodes not defined by RFC 6455 are kept as `Reserved`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    #[default]
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
    Reserved(u8),
}

impl Opcode {
    /// Reads the low 4 bits of the first frame byte.
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Self::Continuation,
            0x1 => Self::Text,
            0x2 => Self::Binary,
            0x8 => Self::Close,
            0x9 => Self::Ping,
            0xA => Self::Pong,
            other => Self::Reserved(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
            Self::Reserved(value) => value & 0x0F,
        }
    }

    /// Returns true for close, ping and pong.
    pub fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

/// A decoded frame header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WebSocketHeader {
    pub fin: bool,
    pub rsv1: bool,
    pub rsv2: bool,
    pub rsv3: bool,
    pub opcode: Opcode,
    pub has_mask: bool,
    pub length: u64,
    pub masking_key: [u8; 4],
}

impl WebSocketHeader {
    /// Total header length announced by the second header byte.
    pub fn encoded_len(second: u8) -> usize {
        let extended = match second & 0x7F {
            126 => 2,
            127 => 8,
            _ => 0,
        };
        let key = if second & 0x80 == 0 { 0 } else { 4 };
        2 + extended + key
    }

    /// Parses a complete header. `raw` must hold exactly
    /// [`encoded_len`](Self::encoded_len) bytes.
    pub(crate) fn parse(raw: &[u8]) -> Self {
        debug_assert!(raw.len() >= 2 && raw.len() == Self::encoded_len(raw[1]));

        let (first, second) = (raw[0], raw[1]);
        let mut header = Self {
            fin: first & 0x80 != 0,
            rsv1: first & 0x40 != 0,
            rsv2: first & 0x20 != 0,
            rsv3: first & 0x10 != 0,
            opcode: Opcode::from_u8(first),
            has_mask: second & 0x80 != 0,
            length: u64::from(second & 0x7F),
            masking_key: [0; 4],
        };

        let mut rest = &raw[2..];
        match header.length {
            126 => {
                header.length = u64::from(u16::from_be_bytes([rest[0], rest[1]]));
                rest = &rest[2..];
            }
            127 => {
                let mut length = [0u8; 8];
                length.copy_from_slice(&rest[..8]);
                header.length = u64::from_be_bytes(length);
                rest = &rest[8..];
            }
            _ => {}
        }

        if header.has_mask {
            header.masking_key.copy_from_slice(&rest[..4]);
        }

        header
    }

    /// A frame the decoder accepts as data: non-empty, no extension bits and a data or
    /// ping/pong opcode. Anything else is treated as a request to close.
    pub fn is_acceptable(&self) -> bool {
        self.length > 0
            && !(self.rsv1 || self.rsv2 || self.rsv3)
            && matches!(self.opcode, Opcode::Continuation | Opcode::Text | Opcode::Binary | Opcode::Ping | Opcode::Pong)
    }
}
