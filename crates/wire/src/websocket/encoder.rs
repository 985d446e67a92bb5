//! Server side frame construction: frames are never masked.

use bytes::{BufMut, BytesMut};

use crate::websocket::header::Opcode;

/// Appends one unmasked frame carrying `data` to `dst`.
///
/// FIN is set for every opcode except [`Opcode::Continuation`]. The length takes the
/// 7-bit form below 126 bytes, the 16-bit form up to 65535 bytes and the 64-bit form
/// beyond.
pub fn encode(data: &[u8], opcode: Opcode, dst: &mut BytesMut) {
    let fin = if opcode == Opcode::Continuation { 0x00 } else { 0x80 };
    let len = data.len();

    dst.reserve(10 + len);
    dst.put_u8(fin | opcode.as_u8());
    match (u8::try_from(len), u16::try_from(len)) {
        (Ok(short), _) if short < 126 => dst.put_u8(short),
        (_, Ok(medium)) => {
            dst.put_u8(126);
            dst.put_u16(medium);
        }
        _ => {
            dst.put_u8(127);
            dst.put_u64(len as u64);
        }
    }
    dst.put_slice(data);
}

/// Appends an empty close frame.
pub fn encode_close(dst: &mut BytesMut) {
    dst.put_slice(&[0x88, 0x00]);
}
