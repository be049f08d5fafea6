use bitstream_io::{BigEndian, BitRead};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::iter::repeat_with;
use thiserror::Error;

pub(crate) mod base64;

/// Set of 1-based identifiers decoded from a bitfield (purposes, vendors).
pub type IdSet = BTreeSet<u16>;

const DECISECONDS_PER_SECOND: u64 = 10;
const NANOSECONDS_PER_DECISECOND: u64 = 100_000_000;

/// Errors raised by [`BitReader`].
#[derive(Error, Debug, Eq, PartialEq)]
pub enum ReadError {
    #[error("cannot read {requested} bits at offset {offset}, only {remaining} left")]
    OutOfRange {
        offset: u64,
        requested: u64,
        remaining: u64,
    },
    #[error("invalid read width {0} (expected 1 to 64 bits)")]
    InvalidWidth(u32),
    #[error("timestamp {0} is not representable")]
    InvalidTimestamp(u64),
}

/// A cursor over a byte buffer, read most significant bit first.
///
/// Every read either consumes exactly the bits it asked for or fails without
/// moving the cursor, so [`position`](Self::position) and
/// [`remaining_bits`](Self::remaining_bits) stay exact even after an error.
pub struct BitReader<'a> {
    bit_reader: bitstream_io::BitReader<&'a [u8], BigEndian>,
    len: u64,
    position: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bit_reader: bitstream_io::BitReader::endian(bytes, BigEndian),
            len: bytes.len() as u64 * 8,
            position: 0,
        }
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bits left to read.
    pub fn remaining_bits(&self) -> u64 {
        self.len - self.position
    }

    fn ensure_available(&self, bits: u64) -> Result<(), ReadError> {
        let remaining = self.remaining_bits();
        if bits > remaining {
            return Err(ReadError::OutOfRange {
                offset: self.position,
                requested: bits,
                remaining,
            });
        }
        Ok(())
    }

    fn eof(&self, bits: u64) -> ReadError {
        ReadError::OutOfRange {
            offset: self.position,
            requested: bits,
            remaining: self.remaining_bits(),
        }
    }

    /// Reads `bits` bits as a big-endian unsigned integer.
    pub fn read_uint(&mut self, bits: u32) -> Result<u64, ReadError> {
        if !(1..=64).contains(&bits) {
            return Err(ReadError::InvalidWidth(bits));
        }
        self.ensure_available(bits as u64)?;

        let value = self
            .bit_reader
            .read_unsigned_var::<u64>(bits)
            .map_err(|_| self.eof(bits as u64))?;
        self.position += bits as u64;

        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool, ReadError> {
        self.ensure_available(1)?;

        let bit = self.bit_reader.read_bit().map_err(|_| self.eof(1))?;
        self.position += 1;

        Ok(bit)
    }

    /// Reads a 36 bits timestamp expressed in deciseconds since the Unix epoch.
    pub fn read_timestamp(&mut self) -> Result<DateTime<Utc>, ReadError> {
        let ds = self.read_uint(36)?;
        let secs = ds / DECISECONDS_PER_SECOND;
        let nanos = (ds % DECISECONDS_PER_SECOND) * NANOSECONDS_PER_DECISECOND;

        DateTime::from_timestamp(secs as i64, nanos as u32).ok_or(ReadError::InvalidTimestamp(ds))
    }

    /// Reads `count` 6 bits letters, 0 being 'A'.
    pub fn read_letters(&mut self, count: usize) -> Result<String, ReadError> {
        self.ensure_available(count as u64 * 6)?;

        repeat_with(|| self.read_uint(6))
            .take(count)
            .map(|r| r.map(|n| (b'A' + n as u8) as char))
            .collect()
    }

    /// Reads a bitfield of `bits` bits. A set bit at index `i` adds `i + 1` to the result.
    pub fn read_purpose_set(&mut self, bits: usize) -> Result<IdSet, ReadError> {
        self.ensure_available(bits as u64)?;

        let mut result = IdSet::new();
        for i in 1..=bits {
            if self.read_bool()? {
                result.insert(i as u16);
            }
        }

        Ok(result)
    }
}
