//! Endianness handling for TIFF files.
//!
//! TIFF files declare their byte order in the first two bytes of the header
//! ("II" = little-endian, "MM" = big-endian). All multi-byte values in the
//! file must be read and written respecting this order.

use crate::error::TiffError;

// =============================================================================
// Endian Helper Functions
// =============================================================================

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a big-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a little-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Read a big-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_be(bytes: &[u8]) -> u64 {
    u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// Fixed once per file at header-read time; governs all subsequent multi-byte
/// decoding for that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }

    /// Read an i16 from a byte slice using this byte order.
    #[inline]
    pub fn read_i16(self, bytes: &[u8]) -> i16 {
        self.read_u16(bytes) as i16
    }

    /// Read an i32 from a byte slice using this byte order.
    #[inline]
    pub fn read_i32(self, bytes: &[u8]) -> i32 {
        self.read_u32(bytes) as i32
    }

    /// Read an i64 from a byte slice using this byte order.
    #[inline]
    pub fn read_i64(self, bytes: &[u8]) -> i64 {
        self.read_u64(bytes) as i64
    }

    /// Read an IEEE 754 single-precision float using this byte order.
    #[inline]
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        f32::from_bits(self.read_u32(bytes))
    }

    /// Read an IEEE 754 double-precision float using this byte order.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    /// Append a u16 to a buffer using this byte order.
    #[inline]
    pub fn put_u16(self, out: &mut Vec<u8>, value: u16) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append a u32 to a buffer using this byte order.
    #[inline]
    pub fn put_u32(self, out: &mut Vec<u8>, value: u32) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append a u64 to a buffer using this byte order.
    #[inline]
    pub fn put_u64(self, out: &mut Vec<u8>, value: u64) {
        match self {
            ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append an i16 to a buffer using this byte order.
    #[inline]
    pub fn put_i16(self, out: &mut Vec<u8>, value: i16) {
        self.put_u16(out, value as u16);
    }

    /// Append an i32 to a buffer using this byte order.
    #[inline]
    pub fn put_i32(self, out: &mut Vec<u8>, value: i32) {
        self.put_u32(out, value as u32);
    }

    /// Append an i64 to a buffer using this byte order.
    #[inline]
    pub fn put_i64(self, out: &mut Vec<u8>, value: i64) {
        self.put_u64(out, value as u64);
    }

    /// Append an f32 to a buffer using this byte order.
    #[inline]
    pub fn put_f32(self, out: &mut Vec<u8>, value: f32) {
        self.put_u32(out, value.to_bits());
    }

    /// Append an f64 to a buffer using this byte order.
    #[inline]
    pub fn put_f64(self, out: &mut Vec<u8>, value: f64) {
        self.put_u64(out, value.to_bits());
    }

    /// Overwrite 4 bytes at `pos` with a u32, used by the writer's offset
    /// fix-up pass.
    #[inline]
    pub fn write_u32_at(self, out: &mut [u8], pos: usize, value: u32) {
        let bytes = match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        out[pos..pos + 4].copy_from_slice(&bytes);
    }

    /// Overwrite 8 bytes at `pos` with a u64, used by the writer's offset
    /// fix-up pass.
    #[inline]
    pub fn write_u64_at(self, out: &mut [u8], pos: usize, value: u64) {
        let bytes = match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        out[pos..pos + 8].copy_from_slice(&bytes);
    }
}

// =============================================================================
// Checked reads
// =============================================================================

/// Fail with [`TiffError::Truncated`] unless `buf` holds `needed` bytes
/// starting at `offset`.
#[inline]
pub fn check_remaining(buf: &[u8], offset: usize, needed: usize) -> Result<(), TiffError> {
    if offset.checked_add(needed).map_or(true, |end| end > buf.len()) {
        return Err(TiffError::Truncated {
            offset: offset as u64,
            needed: needed as u64,
            available: buf.len().saturating_sub(offset) as u64,
        });
    }
    Ok(())
}

impl ByteOrder {
    /// Read a u16 at an absolute offset, failing if the buffer is too short.
    pub fn read_u16_at(self, buf: &[u8], offset: usize) -> Result<u16, TiffError> {
        check_remaining(buf, offset, 2)?;
        Ok(self.read_u16(&buf[offset..]))
    }

    /// Read a u32 at an absolute offset, failing if the buffer is too short.
    pub fn read_u32_at(self, buf: &[u8], offset: usize) -> Result<u32, TiffError> {
        check_remaining(buf, offset, 4)?;
        Ok(self.read_u32(&buf[offset..]))
    }

    /// Read a u64 at an absolute offset, failing if the buffer is too short.
    pub fn read_u64_at(self, buf: &[u8], offset: usize) -> Result<u64, TiffError> {
        check_remaining(buf, offset, 8)?;
        Ok(self.read_u64(&buf[offset..]))
    }

    /// Read an f32 at an absolute offset, failing if the buffer is too short.
    pub fn read_f32_at(self, buf: &[u8], offset: usize) -> Result<f32, TiffError> {
        check_remaining(buf, offset, 4)?;
        Ok(self.read_f32(&buf[offset..]))
    }

    /// Read an f64 at an absolute offset, failing if the buffer is too short.
    pub fn read_f64_at(self, buf: &[u8], offset: usize) -> Result<f64, TiffError> {
        check_remaining(buf, offset, 8)?;
        Ok(self.read_f64(&buf[offset..]))
    }
}

// =============================================================================
// Tests
// =============================================================================
