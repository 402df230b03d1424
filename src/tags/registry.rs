//! Data-driven tag registry.
//!
//! A static mapping from numeric tag id to metadata: canonical name, the
//! field types the TIFF specification allows for the tag, and the expected
//! element cardinality. The registry is embedded in the binary, sorted by tag
//! id, and never mutated at runtime. It is consulted for diagnostics and for
//! strict-mode type and element-count validation; it never gates which tags
//! can be parsed.

use super::FieldType;

/// Expected element count for a tag's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly this many elements
    Exactly(u32),
    /// One element per sample (SamplesPerPixel)
    PerSample,
    /// One element per strip or tile
    PerChunk,
    /// Any count
    Any,
}

/// Registry metadata for one tag id.
#[derive(Debug, Clone, Copy)]
pub struct TagMetadata {
    /// Numeric tag id
    pub id: u16,
    /// Canonical name from the TIFF specification
    pub name: &'static str,
    /// Field types the specification allows for this tag
    pub types: &'static [FieldType],
    /// Expected element count
    pub cardinality: Cardinality,
}

impl TagMetadata {
    /// Whether the on-disk field type matches one of the allowed types.
    pub fn accepts(&self, field_type: FieldType) -> bool {
        self.types.contains(&field_type)
    }
}

use Cardinality::{Any, Exactly, PerChunk, PerSample};
use FieldType::{Ascii, Byte, Long, Long8, Rational, Short, Undefined};

/// Sorted by id; `lookup` binary-searches it.
static REGISTRY: &[TagMetadata] = &[
    TagMetadata { id: 254, name: "NewSubfileType", types: &[Long], cardinality: Exactly(1) },
    TagMetadata { id: 255, name: "SubfileType", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 256, name: "ImageWidth", types: &[Short, Long, Long8], cardinality: Exactly(1) },
    TagMetadata { id: 257, name: "ImageLength", types: &[Short, Long, Long8], cardinality: Exactly(1) },
    TagMetadata { id: 258, name: "BitsPerSample", types: &[Short], cardinality: PerSample },
    TagMetadata { id: 259, name: "Compression", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 262, name: "PhotometricInterpretation", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 263, name: "Threshholding", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 266, name: "FillOrder", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 269, name: "DocumentName", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 270, name: "ImageDescription", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 271, name: "Make", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 272, name: "Model", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 273, name: "StripOffsets", types: &[Short, Long, Long8], cardinality: PerChunk },
    TagMetadata { id: 274, name: "Orientation", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 277, name: "SamplesPerPixel", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 278, name: "RowsPerStrip", types: &[Short, Long], cardinality: Exactly(1) },
    TagMetadata { id: 279, name: "StripByteCounts", types: &[Short, Long, Long8], cardinality: PerChunk },
    TagMetadata { id: 282, name: "XResolution", types: &[Rational], cardinality: Exactly(1) },
    TagMetadata { id: 283, name: "YResolution", types: &[Rational], cardinality: Exactly(1) },
    TagMetadata { id: 284, name: "PlanarConfiguration", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 296, name: "ResolutionUnit", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 305, name: "Software", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 306, name: "DateTime", types: &[Ascii], cardinality: Exactly(20) },
    TagMetadata { id: 315, name: "Artist", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 317, name: "Predictor", types: &[Short], cardinality: Exactly(1) },
    TagMetadata { id: 320, name: "ColorMap", types: &[Short], cardinality: Any },
    TagMetadata { id: 322, name: "TileWidth", types: &[Short, Long], cardinality: Exactly(1) },
    TagMetadata { id: 323, name: "TileLength", types: &[Short, Long], cardinality: Exactly(1) },
    TagMetadata { id: 324, name: "TileOffsets", types: &[Long, Long8], cardinality: PerChunk },
    TagMetadata { id: 325, name: "TileByteCounts", types: &[Short, Long, Long8], cardinality: PerChunk },
    TagMetadata { id: 330, name: "SubIFDs", types: &[Long, Long8, FieldType::Ifd8], cardinality: Any },
    TagMetadata { id: 338, name: "ExtraSamples", types: &[Short], cardinality: Any },
    TagMetadata { id: 339, name: "SampleFormat", types: &[Short], cardinality: PerSample },
    TagMetadata { id: 347, name: "JPEGTables", types: &[Undefined], cardinality: Any },
    TagMetadata { id: 33432, name: "Copyright", types: &[Ascii], cardinality: Any },
    TagMetadata { id: 34675, name: "ICCProfile", types: &[Undefined, Byte], cardinality: Any },
];

/// Look up registry metadata for a tag id.
///
/// Returns `None` for tags outside the registry; unknown tags are not an
/// error, they simply carry opaque values.
pub fn lookup(tag_id: u16) -> Option<&'static TagMetadata> {
    REGISTRY
        .binary_search_by_key(&tag_id, |m| m.id)
        .ok()
        .map(|i| &REGISTRY[i])
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_sorted() {
        for pair in REGISTRY.windows(2) {
            assert!(pair[0].id < pair[1].id, "registry out of order at {}", pair[1].id);
        }
    }

    #[test]
    fn test_lookup_known_tags() {
        let width = lookup(256).unwrap();
        assert_eq!(width.name, "ImageWidth");
        assert!(width.accepts(FieldType::Short));
        assert!(width.accepts(FieldType::Long));
        assert!(!width.accepts(FieldType::Ascii));

        let resolution = lookup(282).unwrap();
        assert_eq!(resolution.name, "XResolution");
        assert!(resolution.accepts(FieldType::Rational));

        assert_eq!(lookup(325).unwrap().name, "TileByteCounts");
    }

    #[test]
    fn test_lookup_unknown_tag() {
        assert!(lookup(0).is_none());
        assert!(lookup(40_000).is_none());
    }

    #[test]
    fn test_cardinality() {
        assert_eq!(lookup(259).unwrap().cardinality, Cardinality::Exactly(1));
        assert_eq!(lookup(258).unwrap().cardinality, Cardinality::PerSample);
        assert_eq!(lookup(273).unwrap().cardinality, Cardinality::PerChunk);
    }
}
