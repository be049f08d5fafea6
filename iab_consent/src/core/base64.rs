use bitstream_io::{BigEndian, BitWrite, BitWriter};
use thiserror::Error;

/// The error type that describes failures to decode Base64 encoded strings.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// An invalid byte was found in the input. The offset and offending byte are provided.
    #[error("invalid byte {1} at offset {0}")]
    InvalidByte(usize, u8),
    /// The input length leaves a single character in the last group, which cannot hold a byte.
    #[error("invalid length {0}")]
    InvalidLength(usize),
}

/// Decodes an unpadded URL safe Base64 string, 6 bits per character.
///
/// Only whole bytes are returned: the trailing bits of the last character that do not
/// complete a byte are dropped.
pub fn decode(s: &str) -> Result<Vec<u8>, DecodeError> {
    if s.len() % 4 == 1 {
        return Err(DecodeError::InvalidLength(s.len()));
    }

    let len = s.len() * 6 / 8;
    let mut buffer = Vec::with_capacity(len + 1);
    let mut bw = BitWriter::endian(&mut buffer, BigEndian);

    for (i, b) in s.bytes().enumerate() {
        let value = base64_value(b).ok_or(DecodeError::InvalidByte(i, b))?;
        bw.write_unsigned::<6, u8>(value)
            .expect("write into vec should not fail");
    }

    // unaligned bits left in the writer are discarded
    drop(bw);
    buffer.truncate(len);

    Ok(buffer)
}

fn base64_value(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}
