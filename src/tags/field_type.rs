//! TIFF field types.
//!
//! Each IFD entry declares a field type that determines how its value bytes
//! are interpreted and how wide one element is on disk. The width drives the
//! inline-vs-offset storage decision: a value whose total size fits in the
//! entry's value/offset slot (4 bytes classic, 8 bytes BigTIFF) is stored
//! inline.

/// TIFF field types that determine how values are encoded.
///
/// Covers the full TIFF 6.0 set plus the BigTIFF 64-bit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,
    /// 8-bit NUL-terminated text (1 byte per character)
    Ascii = 2,
    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,
    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,
    /// Unsigned fraction: two LONGs, numerator then denominator (8 bytes)
    Rational = 5,
    /// Signed 8-bit integer (1 byte)
    SByte = 6,
    /// Opaque byte data (1 byte per element)
    Undefined = 7,
    /// Signed 16-bit integer (2 bytes)
    SShort = 8,
    /// Signed 32-bit integer (4 bytes)
    SLong = 9,
    /// Signed fraction: two SLONGs, numerator then denominator (8 bytes)
    SRational = 10,
    /// IEEE 754 single-precision float (4 bytes)
    Float = 11,
    /// IEEE 754 double-precision float (8 bytes)
    Double = 12,
    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
    /// Signed 64-bit integer (8 bytes) - BigTIFF only
    SLong8 = 17,
    /// Unsigned 64-bit IFD offset (8 bytes) - BigTIFF only
    Ifd8 = 18,
}

impl FieldType {
    /// Size of a single element of this type on disk, in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational
            | FieldType::SRational
            | FieldType::Double
            | FieldType::Long8
            | FieldType::SLong8
            | FieldType::Ifd8 => 8,
        }
    }

    /// Create a FieldType from its on-disk numeric value.
    ///
    /// Returns `None` for unknown type values; callers decide whether that is
    /// a hard error or an opaque-value situation.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            16 => Some(FieldType::Long8),
            17 => Some(FieldType::SLong8),
            18 => Some(FieldType::Ifd8),
            _ => None,
        }
    }

    /// Get the on-disk numeric value.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Human-readable name, used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::SByte => "SBYTE",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Long8 => "LONG8",
            FieldType::SLong8 => "SLONG8",
            FieldType::Ifd8 => "IFD8",
        }
    }

    /// Check if a value with this type and count fits inline in an IFD entry.
    ///
    /// Classic TIFF entries hold 4 inline bytes, BigTIFF entries hold 8.
    #[inline]
    pub fn fits_inline(self, count: u64, big_tiff: bool) -> bool {
        let slot = if big_tiff { 8 } else { 4 };
        (self.size_in_bytes() as u64).saturating_mul(count) <= slot
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_sizes() {
        assert_eq!(FieldType::Byte.size_in_bytes(), 1);
        assert_eq!(FieldType::Ascii.size_in_bytes(), 1);
        assert_eq!(FieldType::Short.size_in_bytes(), 2);
        assert_eq!(FieldType::Long.size_in_bytes(), 4);
        assert_eq!(FieldType::Rational.size_in_bytes(), 8);
        assert_eq!(FieldType::SByte.size_in_bytes(), 1);
        assert_eq!(FieldType::Undefined.size_in_bytes(), 1);
        assert_eq!(FieldType::SShort.size_in_bytes(), 2);
        assert_eq!(FieldType::SLong.size_in_bytes(), 4);
        assert_eq!(FieldType::SRational.size_in_bytes(), 8);
        assert_eq!(FieldType::Float.size_in_bytes(), 4);
        assert_eq!(FieldType::Double.size_in_bytes(), 8);
        assert_eq!(FieldType::Long8.size_in_bytes(), 8);
        assert_eq!(FieldType::SLong8.size_in_bytes(), 8);
        assert_eq!(FieldType::Ifd8.size_in_bytes(), 8);
    }

    #[test]
    fn test_field_type_round_trip() {
        for raw in 1..=18u16 {
            if let Some(ft) = FieldType::from_u16(raw) {
                assert_eq!(ft.as_u16(), raw);
            }
        }
        assert_eq!(FieldType::from_u16(0), None);
        assert_eq!(FieldType::from_u16(13), None);
        assert_eq!(FieldType::from_u16(99), None);
    }

    #[test]
    fn test_fits_inline_classic() {
        assert!(FieldType::Byte.fits_inline(4, false));
        assert!(FieldType::Short.fits_inline(2, false));
        assert!(FieldType::Long.fits_inline(1, false));
        assert!(!FieldType::Byte.fits_inline(5, false));
        assert!(!FieldType::Long.fits_inline(2, false));
        assert!(!FieldType::Rational.fits_inline(1, false));
        assert!(!FieldType::Long8.fits_inline(1, false));
    }

    #[test]
    fn test_fits_inline_bigtiff() {
        assert!(FieldType::Byte.fits_inline(8, true));
        assert!(FieldType::Long.fits_inline(2, true));
        assert!(FieldType::Rational.fits_inline(1, true));
        assert!(FieldType::Long8.fits_inline(1, true));
        assert!(!FieldType::Byte.fits_inline(9, true));
        assert!(!FieldType::Long8.fits_inline(2, true));
    }
}
