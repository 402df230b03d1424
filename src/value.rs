//! Typed tag values and their on-disk codec.
//!
//! A [`TagValue`] is a closed tagged union over the TIFF field types: an
//! ordered sequence of integers, rationals, floats, text, or raw bytes.
//! Decoding converts a raw byte run into a value according to the entry's
//! declared field type and count; encoding is the exact inverse and is
//! deterministic, so repeated encode/decode cycles are byte-identical.
//!
//! Rational values stay as (numerator, denominator) pairs end to end; they
//! are never routed through floating point.

use crate::error::TiffError;
use crate::io::ByteOrder;
use crate::tags::FieldType;

// =============================================================================
// TagValue
// =============================================================================

/// A decoded tag value.
///
/// The variant fixes the [`FieldType`]; the element count is the sequence
/// length (for `Ascii`, the declared count is the text length plus the NUL
/// terminator). Decoding never silently truncates or pads: the byte size of
/// a decoded value always equals `count * element width`.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// BYTE: unsigned 8-bit integers
    Byte(Vec<u8>),
    /// ASCII: NUL-terminated text, exposed without the terminator.
    ///
    /// Embedded NULs do not survive decoding: the text is truncated at the
    /// first NUL, per the declared length policy.
    Ascii(String),
    /// SHORT: unsigned 16-bit integers
    Short(Vec<u16>),
    /// LONG: unsigned 32-bit integers
    Long(Vec<u32>),
    /// RATIONAL: (numerator, denominator) pairs of unsigned 32-bit integers
    Rational(Vec<(u32, u32)>),
    /// SBYTE: signed 8-bit integers
    SByte(Vec<i8>),
    /// UNDEFINED: opaque bytes
    Undefined(Vec<u8>),
    /// SSHORT: signed 16-bit integers
    SShort(Vec<i16>),
    /// SLONG: signed 32-bit integers
    SLong(Vec<i32>),
    /// SRATIONAL: (numerator, denominator) pairs of signed 32-bit integers
    SRational(Vec<(i32, i32)>),
    /// FLOAT: IEEE 754 single-precision
    Float(Vec<f32>),
    /// DOUBLE: IEEE 754 double-precision
    Double(Vec<f64>),
    /// LONG8: unsigned 64-bit integers (BigTIFF)
    Long8(Vec<u64>),
    /// SLONG8: signed 64-bit integers (BigTIFF)
    SLong8(Vec<i64>),
    /// IFD8: unsigned 64-bit IFD offsets (BigTIFF)
    Ifd8(Vec<u64>),
}

impl TagValue {
    /// The field type this value encodes as.
    pub fn field_type(&self) -> FieldType {
        match self {
            TagValue::Byte(_) => FieldType::Byte,
            TagValue::Ascii(_) => FieldType::Ascii,
            TagValue::Short(_) => FieldType::Short,
            TagValue::Long(_) => FieldType::Long,
            TagValue::Rational(_) => FieldType::Rational,
            TagValue::SByte(_) => FieldType::SByte,
            TagValue::Undefined(_) => FieldType::Undefined,
            TagValue::SShort(_) => FieldType::SShort,
            TagValue::SLong(_) => FieldType::SLong,
            TagValue::SRational(_) => FieldType::SRational,
            TagValue::Float(_) => FieldType::Float,
            TagValue::Double(_) => FieldType::Double,
            TagValue::Long8(_) => FieldType::Long8,
            TagValue::SLong8(_) => FieldType::SLong8,
            TagValue::Ifd8(_) => FieldType::Ifd8,
        }
    }

    /// Element count as declared in a directory entry.
    pub fn count(&self) -> u64 {
        match self {
            TagValue::Byte(v) => v.len() as u64,
            // Declared count includes the NUL terminator.
            TagValue::Ascii(s) => s.len() as u64 + 1,
            TagValue::Short(v) => v.len() as u64,
            TagValue::Long(v) => v.len() as u64,
            TagValue::Rational(v) => v.len() as u64,
            TagValue::SByte(v) => v.len() as u64,
            TagValue::Undefined(v) => v.len() as u64,
            TagValue::SShort(v) => v.len() as u64,
            TagValue::SLong(v) => v.len() as u64,
            TagValue::SRational(v) => v.len() as u64,
            TagValue::Float(v) => v.len() as u64,
            TagValue::Double(v) => v.len() as u64,
            TagValue::Long8(v) => v.len() as u64,
            TagValue::SLong8(v) => v.len() as u64,
            TagValue::Ifd8(v) => v.len() as u64,
        }
    }

    /// Total encoded size in bytes: `count * element width`.
    pub fn byte_len(&self) -> u64 {
        self.count() * self.field_type().size_in_bytes() as u64
    }

    /// Whether this value fits in an entry's inline value slot.
    pub fn fits_inline(&self, big_tiff: bool) -> bool {
        self.field_type().fits_inline(self.count(), big_tiff)
    }

    // -------------------------------------------------------------------------
    // Numeric coercion
    // -------------------------------------------------------------------------

    /// First element as u64, for single-valued geometry tags.
    ///
    /// Accepts the unsigned integer variants; anything else is `None`.
    pub fn first_u64(&self) -> Option<u64> {
        match self {
            TagValue::Byte(v) => v.first().map(|&x| x as u64),
            TagValue::Short(v) => v.first().map(|&x| x as u64),
            TagValue::Long(v) => v.first().map(|&x| x as u64),
            TagValue::Long8(v) | TagValue::Ifd8(v) => v.first().copied(),
            _ => None,
        }
    }

    /// First element as u32; `None` if absent, non-integer, or too large.
    pub fn first_u32(&self) -> Option<u32> {
        self.first_u64().and_then(|x| u32::try_from(x).ok())
    }

    /// First element as u16; `None` if absent, non-integer, or too large.
    pub fn first_u16(&self) -> Option<u16> {
        self.first_u64().and_then(|x| u16::try_from(x).ok())
    }

    /// All elements widened to u64, for offset/byte-count arrays that may be
    /// declared SHORT, LONG, or LONG8.
    pub fn u64_values(&self) -> Option<Vec<u64>> {
        match self {
            TagValue::Byte(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Short(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Long(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TagValue::Long8(v) | TagValue::Ifd8(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// All elements widened to u16, for per-sample SHORT arrays.
    pub fn u16_values(&self) -> Option<Vec<u16>> {
        match self {
            TagValue::Byte(v) => Some(v.iter().map(|&x| x as u16).collect()),
            TagValue::Short(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Text content for ASCII values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a raw value byte run into a [`TagValue`].
///
/// `raw` must hold exactly `count * element width` bytes; the container
/// parser is responsible for fetching that run (inline slot or out-of-line
/// area) and fails with [`TiffError::Truncated`] before calling this if the
/// source is shorter.
pub fn decode_value(
    field_type: FieldType,
    count: u64,
    raw: &[u8],
    byte_order: ByteOrder,
) -> Result<TagValue, TiffError> {
    let width = field_type.size_in_bytes();
    let expected = count
        .checked_mul(width as u64)
        .filter(|&n| n == raw.len() as u64)
        .ok_or(TiffError::Truncated {
            offset: 0,
            needed: count.saturating_mul(width as u64),
            available: raw.len() as u64,
        })?;
    debug_assert_eq!(expected, raw.len() as u64);
    let n = count as usize;

    let value = match field_type {
        FieldType::Byte => TagValue::Byte(raw.to_vec()),
        FieldType::Undefined => TagValue::Undefined(raw.to_vec()),
        FieldType::SByte => TagValue::SByte(raw.iter().map(|&b| b as i8).collect()),
        FieldType::Ascii => {
            // Truncate at the first NUL; the terminator (and anything past an
            // embedded NUL) is not exposed.
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            TagValue::Ascii(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        FieldType::Short => TagValue::Short(
            (0..n).map(|i| byte_order.read_u16(&raw[i * 2..])).collect(),
        ),
        FieldType::SShort => TagValue::SShort(
            (0..n).map(|i| byte_order.read_i16(&raw[i * 2..])).collect(),
        ),
        FieldType::Long => TagValue::Long(
            (0..n).map(|i| byte_order.read_u32(&raw[i * 4..])).collect(),
        ),
        FieldType::SLong => TagValue::SLong(
            (0..n).map(|i| byte_order.read_i32(&raw[i * 4..])).collect(),
        ),
        FieldType::Rational => TagValue::Rational(
            (0..n)
                .map(|i| {
                    let base = i * 8;
                    (
                        byte_order.read_u32(&raw[base..]),
                        byte_order.read_u32(&raw[base + 4..]),
                    )
                })
                .collect(),
        ),
        FieldType::SRational => TagValue::SRational(
            (0..n)
                .map(|i| {
                    let base = i * 8;
                    (
                        byte_order.read_i32(&raw[base..]),
                        byte_order.read_i32(&raw[base + 4..]),
                    )
                })
                .collect(),
        ),
        FieldType::Float => TagValue::Float(
            (0..n).map(|i| byte_order.read_f32(&raw[i * 4..])).collect(),
        ),
        FieldType::Double => TagValue::Double(
            (0..n).map(|i| byte_order.read_f64(&raw[i * 8..])).collect(),
        ),
        FieldType::Long8 => TagValue::Long8(
            (0..n).map(|i| byte_order.read_u64(&raw[i * 8..])).collect(),
        ),
        FieldType::SLong8 => TagValue::SLong8(
            (0..n).map(|i| byte_order.read_i64(&raw[i * 8..])).collect(),
        ),
        FieldType::Ifd8 => TagValue::Ifd8(
            (0..n).map(|i| byte_order.read_u64(&raw[i * 8..])).collect(),
        ),
    };

    Ok(value)
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a [`TagValue`] to its raw on-disk byte run.
///
/// The output length is always `value.count() * element width`; the writer
/// decides from that whether the bytes land inline or in the out-of-line
/// value area.
pub fn encode_value(value: &TagValue, byte_order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.byte_len() as usize);
    match value {
        TagValue::Byte(v) | TagValue::Undefined(v) => out.extend_from_slice(v),
        TagValue::SByte(v) => out.extend(v.iter().map(|&x| x as u8)),
        TagValue::Ascii(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        TagValue::Short(v) => v.iter().for_each(|&x| byte_order.put_u16(&mut out, x)),
        TagValue::SShort(v) => v.iter().for_each(|&x| byte_order.put_i16(&mut out, x)),
        TagValue::Long(v) => v.iter().for_each(|&x| byte_order.put_u32(&mut out, x)),
        TagValue::SLong(v) => v.iter().for_each(|&x| byte_order.put_i32(&mut out, x)),
        TagValue::Rational(v) => v.iter().for_each(|&(num, den)| {
            byte_order.put_u32(&mut out, num);
            byte_order.put_u32(&mut out, den);
        }),
        TagValue::SRational(v) => v.iter().for_each(|&(num, den)| {
            byte_order.put_i32(&mut out, num);
            byte_order.put_i32(&mut out, den);
        }),
        TagValue::Float(v) => v.iter().for_each(|&x| byte_order.put_f32(&mut out, x)),
        TagValue::Double(v) => v.iter().for_each(|&x| byte_order.put_f64(&mut out, x)),
        TagValue::Long8(v) | TagValue::Ifd8(v) => {
            v.iter().for_each(|&x| byte_order.put_u64(&mut out, x))
        }
        TagValue::SLong8(v) => v.iter().for_each(|&x| byte_order.put_i64(&mut out, x)),
    }
    debug_assert_eq!(out.len() as u64, value.byte_len());
    out
}

// =============================================================================
// Tests
// =============================================================================
