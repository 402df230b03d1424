//! The directory (IFD) model.
//!
//! An Image File Directory is one page's ordered set of tagged values plus a
//! pointer to the next directory in the chain (or none) and zero or more
//! sub-IFD offsets reachable via tag 330. Directories are immutable once
//! constructed; callers preparing a write pass build them through
//! [`DirectoryBuilder`].

use tracing::warn;

use crate::error::TiffError;
use crate::options::ReadOptions;
use crate::tags;
use crate::value::TagValue;

// =============================================================================
// Entry
// =============================================================================

/// One (tag id, value) pair within a directory.
///
/// `was_inline` records whether the value bytes lived in the entry's value
/// slot on disk. It is an encode hint only; consumers see a resolved
/// [`TagValue`] either way.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Numeric tag id
    pub tag: u16,
    /// Decoded, owned value
    pub value: TagValue,
    /// Whether the value was stored inline in the entry's value slot
    pub was_inline: bool,
}

// The inline flag is storage detail, not content. Two entries with the same
// tag and value are equal regardless of how the bytes were placed on disk.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.value == other.value
    }
}

// =============================================================================
// Directory
// =============================================================================

/// One Image File Directory: ordered entries with unique tag ids.
///
/// Constructed by the container parser during a read pass or by
/// [`DirectoryBuilder`] before a write pass. Entry order is preserved from
/// the file on read; the builder sorts entries ascending by tag id, which is
/// what TIFF 6.0 recommends for writers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directory {
    entries: Vec<Entry>,
    next_ifd_offset: Option<u64>,
}

impl Directory {
    /// Assemble a directory from parsed entries, enforcing tag uniqueness.
    ///
    /// In strict mode a repeated tag id fails with
    /// [`TiffError::DuplicateTag`]; in lenient mode the first occurrence
    /// wins and later ones are discarded with a warning.
    pub fn from_entries(
        entries: Vec<Entry>,
        next_ifd_offset: Option<u64>,
        options: &ReadOptions,
    ) -> Result<Self, TiffError> {
        let mut unique: Vec<Entry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if unique.iter().any(|e| e.tag == entry.tag) {
                if options.is_strict() {
                    return Err(TiffError::DuplicateTag(entry.tag));
                }
                warn!(tag = entry.tag, "duplicate tag in IFD, keeping first occurrence");
                continue;
            }
            unique.push(entry);
        }
        Ok(Directory {
            entries: unique,
            next_ifd_offset,
        })
    }

    /// Ordered entries of this directory.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the value for a tag id.
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.iter().find(|e| e.tag == tag).map(|e| &e.value)
    }

    /// Whether the directory contains a tag.
    pub fn contains(&self, tag: u16) -> bool {
        self.get(tag).is_some()
    }

    /// Offset of the next IFD in the chain, `None` at the end.
    pub fn next_ifd_offset(&self) -> Option<u64> {
        self.next_ifd_offset
    }

    /// Sub-IFD offsets from tag 330, empty when absent.
    pub fn sub_ifd_offsets(&self) -> Vec<u64> {
        self.get(tags::tag::SUB_IFDS)
            .and_then(|v| v.u64_values())
            .unwrap_or_default()
    }

    /// Value of a single-valued unsigned integer tag, or a
    /// [`TiffError::MissingMandatoryTag`] naming it.
    pub(crate) fn require_u32(&self, tag: u16, name: &'static str) -> Result<u32, TiffError> {
        self.get(tag)
            .ok_or(TiffError::MissingMandatoryTag { tag, name })?
            .first_u32()
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag,
                message: format!("{name} is not an unsigned integer value"),
            })
    }
}

// =============================================================================
// DirectoryBuilder
// =============================================================================

/// Builder for directories destined for a write pass.
///
/// Entries may be set in any order; `build` sorts them ascending by tag id.
/// Setting a tag twice replaces the earlier value.
#[derive(Debug, Clone, Default)]
pub struct DirectoryBuilder {
    entries: Vec<Entry>,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a tag's value, replacing any previous value for the same tag.
    pub fn set(&mut self, tag: u16, value: TagValue) -> &mut Self {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.tag == tag) {
            existing.value = value;
        } else {
            self.entries.push(Entry {
                tag,
                value,
                was_inline: false,
            });
        }
        self
    }

    /// Remove a tag if present.
    pub fn remove(&mut self, tag: u16) -> &mut Self {
        self.entries.retain(|e| e.tag != tag);
        self
    }

    /// Whether the builder already carries a tag.
    pub fn contains(&self, tag: u16) -> bool {
        self.entries.iter().any(|e| e.tag == tag)
    }

    /// Finish the directory. Entries come out sorted ascending by tag id;
    /// the next-IFD offset is assigned by the container writer during
    /// layout, never by the builder.
    pub fn build(mut self) -> Directory {
        self.entries.sort_by_key(|e| e.tag);
        Directory {
            entries: self.entries,
            next_ifd_offset: None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: u16, value: TagValue) -> Entry {
        Entry {
            tag,
            value,
            was_inline: true,
        }
    }

    #[test]
    fn test_get_and_order_preserved() {
        let dir = Directory::from_entries(
            vec![
                entry(257, TagValue::Short(vec![10])),
                entry(256, TagValue::Short(vec![20])),
            ],
            Some(100),
            &ReadOptions::strict(),
        )
        .unwrap();

        // File order is preserved on read, even when not ascending.
        assert_eq!(dir.entries()[0].tag, 257);
        assert_eq!(dir.get(256), Some(&TagValue::Short(vec![20])));
        assert_eq!(dir.get(999), None);
        assert_eq!(dir.next_ifd_offset(), Some(100));
    }

    #[test]
    fn test_duplicate_tag_strict_fails() {
        let result = Directory::from_entries(
            vec![
                entry(256, TagValue::Short(vec![1])),
                entry(256, TagValue::Short(vec![2])),
            ],
            None,
            &ReadOptions::strict(),
        );
        assert!(matches!(result, Err(TiffError::DuplicateTag(256))));
    }

    #[test]
    fn test_duplicate_tag_lenient_keeps_first() {
        let dir = Directory::from_entries(
            vec![
                entry(256, TagValue::Short(vec![1])),
                entry(256, TagValue::Short(vec![2])),
            ],
            None,
            &ReadOptions::lenient(),
        )
        .unwrap();
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(256), Some(&TagValue::Short(vec![1])));
    }

    #[test]
    fn test_sub_ifd_offsets() {
        let dir = Directory::from_entries(
            vec![entry(330, TagValue::Long(vec![500, 900]))],
            None,
            &ReadOptions::strict(),
        )
        .unwrap();
        assert_eq!(dir.sub_ifd_offsets(), vec![500, 900]);

        let empty = Directory::default();
        assert!(empty.sub_ifd_offsets().is_empty());
    }

    #[test]
    fn test_builder_sorts_and_replaces() {
        let mut builder = DirectoryBuilder::new();
        builder
            .set(277, TagValue::Short(vec![3]))
            .set(256, TagValue::Short(vec![64]))
            .set(277, TagValue::Short(vec![1]));
        let dir = builder.build();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.entries()[0].tag, 256);
        assert_eq!(dir.get(277), Some(&TagValue::Short(vec![1])));
        assert_eq!(dir.next_ifd_offset(), None);
    }
}
