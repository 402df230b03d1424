//! Compression codecs for strip and tile payloads.
//!
//! Each scheme implements [`Codec`], a symmetric decode/encode pair over
//! whole chunks. Codecs never consult directory tags themselves; the raster
//! layer resolves geometry and hands the relevant parameters down through
//! [`CodecParams`].

use crate::error::TiffError;

pub mod ccitt;
pub mod deflate;
pub mod lzw;
pub mod packbits;

// =============================================================================
// Compression scheme
// =============================================================================

/// Legacy Deflate id written by some producers (tag value 32946).
const COMPRESSION_DEFLATE_LEGACY: u16 = 32946;

/// Compression scheme identifiers from the Compression tag (259).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// No compression (1)
    None,
    /// CCITT Group 3 one-dimensional Modified Huffman (3)
    CcittGroup3,
    /// CCITT Group 4 two-dimensional T.6 (4)
    CcittGroup4,
    /// TIFF-variant LZW (5)
    Lzw,
    /// Deflate in a zlib wrapper (8, or legacy 32946)
    Deflate,
    /// PackBits run-length encoding (32773)
    PackBits,
}

impl Compression {
    /// Map a Compression tag value to a scheme.
    ///
    /// Unrecognized values come back as `Err` so callers can surface the
    /// numeric id; recognized-but-unimplemented schemes do not exist — every
    /// variant here has a codec.
    pub fn from_tag_value(value: u16) -> Result<Self, TiffError> {
        match value {
            1 => Ok(Compression::None),
            3 => Ok(Compression::CcittGroup3),
            4 => Ok(Compression::CcittGroup4),
            5 => Ok(Compression::Lzw),
            8 | COMPRESSION_DEFLATE_LEGACY => Ok(Compression::Deflate),
            32773 => Ok(Compression::PackBits),
            other => Err(TiffError::UnsupportedCompression(other)),
        }
    }

    /// Canonical tag value for this scheme (legacy aliases normalize away).
    pub fn tag_value(&self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::CcittGroup3 => 3,
            Compression::CcittGroup4 => 4,
            Compression::Lzw => 5,
            Compression::Deflate => 8,
            Compression::PackBits => 32773,
        }
    }
}

// =============================================================================
// Codec trait
// =============================================================================

/// Bit ordering of compressed data within each byte (FillOrder tag 266).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillOrder {
    /// Most significant bit first (FillOrder = 1, the default)
    #[default]
    Msb,
    /// Least significant bit first (FillOrder = 2)
    Lsb,
}

/// Parameters a codec may need beyond the raw bytes.
///
/// `expected_len` caps decoder output: a stream that would produce more
/// bytes than the chunk's nominal size is corrupt. Edge strips and tiles
/// may legitimately decode to fewer bytes; the raster layer clips.
#[derive(Debug, Clone, Copy)]
pub struct CodecParams {
    /// Maximum decoded size in bytes for this chunk
    pub expected_len: usize,
    /// Image (or tile) width in pixels, for row-structured schemes
    pub pixel_width: usize,
    /// Bytes per decoded row
    pub row_stride: usize,
    /// Bit order of the compressed stream
    pub fill_order: FillOrder,
}

impl CodecParams {
    /// Parameters for byte-stream codecs that don't care about rows.
    pub fn sized(expected_len: usize) -> Self {
        CodecParams {
            expected_len,
            pixel_width: 0,
            row_stride: 0,
            fill_order: FillOrder::Msb,
        }
    }
}

/// A symmetric compression scheme over whole strip/tile chunks.
///
/// Implementations are stateless and shareable; all per-chunk state lives
/// in the call frame, so one codec instance can serve chunks from multiple
/// threads at once.
pub trait Codec: Send + Sync {
    /// Decompress one chunk.
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError>;

    /// Compress one chunk.
    fn encode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError>;
}

/// The identity codec for Compression = 1.
struct Passthrough;

impl Codec for Passthrough {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        if input.len() > params.expected_len {
            return Err(TiffError::corrupt(
                "none",
                format!(
                    "chunk holds {} bytes but at most {} were declared",
                    input.len(),
                    params.expected_len
                ),
            ));
        }
        Ok(input.to_vec())
    }

    fn encode(&self, input: &[u8], _params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        Ok(input.to_vec())
    }
}

/// Look up the codec for a compression scheme.
pub fn codec_for(compression: Compression) -> Box<dyn Codec> {
    match compression {
        Compression::None => Box::new(Passthrough),
        Compression::CcittGroup3 => Box::new(ccitt::Group3),
        Compression::CcittGroup4 => Box::new(ccitt::Group4),
        Compression::Lzw => Box::new(lzw::LzwCodec),
        Compression::Deflate => Box::new(deflate::DeflateCodec),
        Compression::PackBits => Box::new(packbits::PackBitsCodec),
    }
}

// =============================================================================
// Tests
// =============================================================================
