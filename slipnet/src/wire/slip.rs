//! Serial line framing, RFC 1055.
//!
//! A frame is delimited by `END` on both sides. Occurrences of `END` and `ESC` inside the frame
//! are replaced by two byte escape sequences so that the delimiter never appears in the payload.
//!
//! ```rust
//! use slipnet::wire::slip;
//! let mut line = vec![];
//! slip::encode(&[0x01, slip::END, 0x02], &mut line);
//! assert_eq!(line, [slip::END, 0x01, slip::ESC, slip::ESC_END, 0x02, slip::END]);
//! ```

/// Frame delimiter.
pub const END: u8 = 0xc0;
/// Introduces an escape sequence.
pub const ESC: u8 = 0xdb;
/// Escaped `END`, after `ESC`.
pub const ESC_END: u8 = 0xdc;
/// Escaped `ESC`, after `ESC`.
pub const ESC_ESC: u8 = 0xdd;

/// The escape sequence for a payload byte, if it needs one.
pub fn escape(byte: u8) -> Option<[u8; 2]> {
    match byte {
        END => Some([ESC, ESC_END]),
        ESC => Some([ESC, ESC_ESC]),
        _ => None,
    }
}

/// The payload byte denoted by the byte following an `ESC`.
///
/// Returns `None` for a protocol violation.
pub fn unescape(byte: u8) -> Option<u8> {
    match byte {
        ESC_END => Some(END),
        ESC_ESC => Some(ESC),
        _ => None,
    }
}

/// The exact length of the encoded frame, both delimiters included.
pub fn encoded_len(data: &[u8]) -> usize {
    let escaped = data.iter()
        .filter(|&&byte| escape(byte).is_some())
        .count();
    data.len() + escaped + 2
}

/// Append the framed and escaped `data` to `out`.
pub fn encode(data: &[u8], out: &mut Vec<u8>) {
    out.reserve(encoded_len(data));
    out.push(END);
    for &byte in data {
        match escape(byte) {
            Some(seq) => out.extend_from_slice(&seq),
            None => out.push(byte),
        }
    }
    out.push(END);
}
