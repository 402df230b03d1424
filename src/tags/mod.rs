//! Tag vocabulary: field types, well-known tag ids, and the tag registry.

mod field_type;
mod registry;

pub use field_type::FieldType;
pub use registry::{lookup, Cardinality, TagMetadata};

/// Well-known TIFF tag ids.
///
/// These are the tags the container parser and raster assembler consult
/// directly. Tags outside this list are still parsed into typed values; they
/// are simply opaque to the geometry resolution code.
pub mod tag {
    /// Image width in pixels
    pub const IMAGE_WIDTH: u16 = 256;
    /// Image height (length) in pixels
    pub const IMAGE_LENGTH: u16 = 257;
    /// Bits per sample, one value per sample
    pub const BITS_PER_SAMPLE: u16 = 258;
    /// Compression scheme id
    pub const COMPRESSION: u16 = 259;
    /// Photometric interpretation (0 = WhiteIsZero, 1 = BlackIsZero, 2 = RGB, ...)
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    /// Fill order of bits within a byte (1 = MSB-first, 2 = LSB-first)
    pub const FILL_ORDER: u16 = 266;
    /// Description string
    pub const IMAGE_DESCRIPTION: u16 = 270;
    /// Byte offsets of strips
    pub const STRIP_OFFSETS: u16 = 273;
    /// Number of samples (components) per pixel
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    /// Row count per strip
    pub const ROWS_PER_STRIP: u16 = 278;
    /// Byte counts of strips, index-aligned with STRIP_OFFSETS
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    /// Pixels per unit in X direction
    pub const X_RESOLUTION: u16 = 282;
    /// Pixels per unit in Y direction
    pub const Y_RESOLUTION: u16 = 283;
    /// How samples are organized (1 = chunky, 2 = planar)
    pub const PLANAR_CONFIGURATION: u16 = 284;
    /// Unit of resolution (1 = none, 2 = inch, 3 = centimeter)
    pub const RESOLUTION_UNIT: u16 = 296;
    /// Software that produced the file
    pub const SOFTWARE: u16 = 305;
    /// Palette for palette-color images
    pub const COLOR_MAP: u16 = 320;
    /// Width of each tile in pixels
    pub const TILE_WIDTH: u16 = 322;
    /// Height (length) of each tile in pixels
    pub const TILE_LENGTH: u16 = 323;
    /// Byte offsets of tiles
    pub const TILE_OFFSETS: u16 = 324;
    /// Byte counts of tiles, index-aligned with TILE_OFFSETS
    pub const TILE_BYTE_COUNTS: u16 = 325;
    /// Offsets of child IFDs
    pub const SUB_IFDS: u16 = 330;
    /// Pre-compression differencing predictor (1 = none, 2 = horizontal)
    pub const PREDICTOR: u16 = 317;
    /// Per-sample data interpretation (1 = unsigned, 2 = signed, 3 = float)
    pub const SAMPLE_FORMAT: u16 = 339;
}
