//! Big-endian primitive encode/decode.
//!
//! Reads operate on a cursor/end pair rather than a `Read` impl so that
//! callers can slice a larger buffer (a layer block, an operator block)
//! without copying, and so that a truncated read can report exactly how
//! many bytes were missing. Writes append to a `Vec<u8>`. No length
//! prefixes or framing live here — callers compose that themselves,
//! as described by each binary format in the design document.

use crate::error::SerializeError;

/// A read cursor into a byte slice, bounds-checked on every primitive read.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Start a cursor at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize, context: &str) -> Result<&'a [u8], SerializeError> {
        if self.remaining() < n {
            return Err(SerializeError::Truncated {
                context: context.to_string(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a single `u8`.
    pub fn read_u8(&mut self) -> Result<u8, SerializeError> {
        Ok(self.take(1, "u8")?[0])
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, SerializeError> {
        let b = self.take(2, "u16")?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, SerializeError> {
        let b = self.take(4, "u32")?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, SerializeError> {
        let b = self.take(8, "u64")?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Read a big-endian two's-complement `i32`.
    pub fn read_i32(&mut self) -> Result<i32, SerializeError> {
        Ok(self.read_u32()? as i32)
    }

    /// Consume and return exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SerializeError> {
        self.take(n, "raw bytes")
    }

    /// Fail if any bytes remain; used at the top level of a framed block to
    /// catch trailing garbage.
    pub fn expect_exhausted(&self) -> Result<(), SerializeError> {
        if !self.is_empty() {
            return Err(SerializeError::TrailingData {
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Append a `u8`.
pub fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

/// Append a big-endian `u16`.
pub fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Append a big-endian `u32`.
pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Append a big-endian `u64`.
pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Append a big-endian two's-complement `i32`.
pub fn write_i32(buf: &mut Vec<u8>, v: i32) {
    write_u32(buf, v as u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let mut buf = Vec::new();
        write_u8(&mut buf, 0xAB);
        write_u16(&mut buf, 0x1234);
        write_u32(&mut buf, 0xDEAD_BEEF);
        write_u64(&mut buf, 0x0102_0304_0506_0708);
        write_i32(&mut buf, -1);

        let mut c = Cursor::new(&buf);
        assert_eq!(c.read_u8().unwrap(), 0xAB);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(c.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(c.read_i32().unwrap(), -1);
        c.expect_exhausted().unwrap();
    }

    #[test]
    fn truncated_read_reports_error() {
        let buf = [0u8; 1];
        let mut c = Cursor::new(&buf);
        assert!(matches!(
            c.read_u32(),
            Err(SerializeError::Truncated { .. })
        ));
    }

    #[test]
    fn trailing_data_is_detected() {
        let buf = [1u8, 2, 3];
        let mut c = Cursor::new(&buf);
        c.read_u8().unwrap();
        assert!(matches!(
            c.expect_exhausted(),
            Err(SerializeError::TrailingData { remaining: 2 })
        ));
    }

    #[test]
    fn big_endian_byte_order() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 1);
        assert_eq!(buf, vec![0, 0, 0, 1]);
    }
}
