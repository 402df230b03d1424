use thiserror::Error;

/// Errors that can occur when reading or writing TIFF files.
///
/// Low-level readers fail fast and propagate upward unmodified; the library
/// never substitutes default values for structurally required fields.
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// Invalid TIFF magic bytes (not II or MM)
    #[error("invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// Buffer or byte source is shorter than a required field
    #[error("truncated data: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// Offset points outside the byte source
    #[error("invalid offset: {offset} is outside the byte source of {size} bytes")]
    InvalidOffset { offset: u64, size: u64 },

    /// The IFD chain revisits an offset it has already parsed
    #[error("cyclic directory chain: IFD offset {0} was already visited")]
    CyclicDirectoryChain(u64),

    /// Two entries in one directory carry the same tag id
    #[error("duplicate tag {0} in directory")]
    DuplicateTag(u16),

    /// On-disk field type disagrees with the registry's expectation
    #[error("tag {tag} type mismatch: registry expects {expected}, file declares {actual}")]
    TagTypeMismatch {
        tag: u16,
        expected: &'static str,
        actual: &'static str,
    },

    /// A tag required to resolve image geometry is absent
    #[error("missing mandatory tag {name} ({tag})")]
    MissingMandatoryTag { tag: u16, name: &'static str },

    /// Compression scheme id with no registered codec
    #[error("unsupported compression scheme {0}")]
    UnsupportedCompression(u16),

    /// Codec-level decode failure: the compressed stream cannot be trusted
    #[error("corrupt {codec} stream: {reason}")]
    CorruptStream {
        codec: &'static str,
        reason: String,
    },

    /// Decoded byte count disagrees with the count derived from geometry
    #[error("geometry mismatch: expected {expected} decoded bytes, got {actual}")]
    GeometryMismatch { expected: u64, actual: u64 },

    /// Field type value with no TIFF 6.0 / BigTIFF meaning
    #[error("unknown field type {0}")]
    UnknownFieldType(u16),

    /// Tag is present but its value has the wrong shape for its consumer
    #[error("invalid value for tag {tag}: {message}")]
    InvalidTagValue { tag: u16, message: String },

    /// Valid TIFF construct this library does not implement
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
}

impl TiffError {
    /// Shorthand for codec decode failures.
    pub(crate) fn corrupt(codec: &'static str, reason: impl Into<String>) -> Self {
        TiffError::CorruptStream {
            codec,
            reason: reason.into(),
        }
    }
}
