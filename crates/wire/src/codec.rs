//! Byte-level writer and reader.
//!
//! All multi-byte values are little-endian. The format is schema-driven: no
//! value carries a type tag or length besides what its schema prescribes, so
//! the reader must consume fields in exactly the order the writer produced
//! them.

use arcsync_sim::angle::{dequantize_angle, quantize_angle};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::WireError;

/// Longest string a one-byte length prefix can describe.
pub const STR8_MAX: usize = u8::MAX as usize;

/// Longest string a two-byte length prefix can describe.
pub const STR16_MAX: usize = u16::MAX as usize;

// ============================================================================
// Writer
// ============================================================================

/// Append-only encoder over a growable byte buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) -> Result<(), WireError> {
        self.buf.write_u8(v)?;
        Ok(())
    }

    pub fn i8(&mut self, v: i8) -> Result<(), WireError> {
        self.buf.write_i8(v)?;
        Ok(())
    }

    pub fn u16(&mut self, v: u16) -> Result<(), WireError> {
        self.buf.write_u16::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn i16(&mut self, v: i16) -> Result<(), WireError> {
        self.buf.write_i16::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn u32(&mut self, v: u32) -> Result<(), WireError> {
        self.buf.write_u32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn i32(&mut self, v: i32) -> Result<(), WireError> {
        self.buf.write_i32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn f32(&mut self, v: f32) -> Result<(), WireError> {
        self.buf.write_f32::<LittleEndian>(v)?;
        Ok(())
    }

    pub fn f64(&mut self, v: f64) -> Result<(), WireError> {
        self.buf.write_f64::<LittleEndian>(v)?;
        Ok(())
    }

    /// Booleans are a single byte, `0` or `1`.
    pub fn bool(&mut self, v: bool) -> Result<(), WireError> {
        self.u8(u8::from(v))
    }

    /// String with a one-byte length prefix.
    pub fn str8(&mut self, s: &str) -> Result<(), WireError> {
        let len = u8::try_from(s.len()).map_err(|_| WireError::StringTooLong {
            len: s.len(),
            max: STR8_MAX,
        })?;
        self.u8(len)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// String with a two-byte length prefix.
    pub fn str16(&mut self, s: &str) -> Result<(), WireError> {
        let len = u16::try_from(s.len()).map_err(|_| WireError::StringTooLong {
            len: s.len(),
            max: STR16_MAX,
        })?;
        self.u16(len)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Normalize to `[0, 2π)` and quantize to 16 bits.
    pub fn compact_angle(&mut self, radians: f32) -> Result<(), WireError> {
        self.u16(quantize_angle(radians))
    }

    /// One-byte element count; anything above 255 is an encoding error.
    pub fn count(&mut self, what: &'static str, count: usize) -> Result<(), WireError> {
        let n = u8::try_from(count).map_err(|_| WireError::TooManyEntries { what, count })?;
        self.u8(n)
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fail unless every byte was consumed.
    pub fn finish(self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(WireError::TrailingBytes { count }),
        }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated {
                offset: self.pos,
                what,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn u8(&mut self, what: &'static str) -> Result<u8, WireError> {
        Ok(self.take(1, what)?[0])
    }

    pub fn i8(&mut self, what: &'static str) -> Result<i8, WireError> {
        Ok(self.take(1, what)?[0] as i8)
    }

    pub fn u16(&mut self, what: &'static str) -> Result<u16, WireError> {
        Ok(LittleEndian::read_u16(self.take(2, what)?))
    }

    pub fn i16(&mut self, what: &'static str) -> Result<i16, WireError> {
        Ok(LittleEndian::read_i16(self.take(2, what)?))
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32, WireError> {
        Ok(LittleEndian::read_u32(self.take(4, what)?))
    }

    pub fn i32(&mut self, what: &'static str) -> Result<i32, WireError> {
        Ok(LittleEndian::read_i32(self.take(4, what)?))
    }

    pub fn f32(&mut self, what: &'static str) -> Result<f32, WireError> {
        Ok(LittleEndian::read_f32(self.take(4, what)?))
    }

    pub fn f64(&mut self, what: &'static str) -> Result<f64, WireError> {
        Ok(LittleEndian::read_f64(self.take(8, what)?))
    }

    /// Only `0` and `1` are booleans.
    pub fn bool(&mut self, what: &'static str) -> Result<bool, WireError> {
        match self.u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::InvalidBool { what, value }),
        }
    }

    pub fn str8(&mut self, what: &'static str) -> Result<String, WireError> {
        let len = usize::from(self.u8(what)?);
        self.utf8(len, what)
    }

    pub fn str16(&mut self, what: &'static str) -> Result<String, WireError> {
        let len = usize::from(self.u16(what)?);
        self.utf8(len, what)
    }

    fn utf8(&mut self, len: usize, what: &'static str) -> Result<String, WireError> {
        let offset = self.pos;
        let bytes = self.take(len, what)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8 { offset })
    }

    /// Dequantized angle in `[0, 2π)`.
    pub fn compact_angle(&mut self, what: &'static str) -> Result<f32, WireError> {
        Ok(dequantize_angle(self.u16(what)?))
    }
}
