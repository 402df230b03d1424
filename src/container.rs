//! TIFF container reading and writing.
//!
//! Reading: parse the file header (byte order, version, first-IFD offset),
//! then walk the IFD chain, resolving every entry's value (inline slot or
//! out-of-line byte run) into an owned [`TagValue`], until a next-IFD offset
//! of zero. The resulting ordered directory sequence is the page list for
//! multi-page files.
//!
//! Writing mirrors the read structurally: a two-pass layout first computes
//! region sizes, then assigns absolute offsets, then serializes — header,
//! per-directory entry tables with inline values resolved at encode time,
//! out-of-line value areas, and strip/tile payload areas.
//!
//! # Header layout
//!
//! ```text
//! Classic TIFF (8 bytes)             BigTIFF (16 bytes)
//! 0-1  byte order ("II"/"MM")        0-1   byte order ("II"/"MM")
//! 2-3  version = 42                  2-3   version = 43
//! 4-7  first IFD offset (u32)        4-5   offset byte size (must be 8)
//!                                    6-7   reserved
//!                                    8-15  first IFD offset (u64)
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::TiffError;
use crate::ifd::{Directory, Entry};
use crate::io::{ByteOrder, ByteSource};
use crate::options::ReadOptions;
use crate::tags::{self, Cardinality, FieldType};
use crate::value::{decode_value, encode_value, TagValue};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,
    /// Whether this is a BigTIFF file (64-bit offsets, 20-byte entries)
    pub big_tiff: bool,
    /// Offset to the first IFD
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// BigTIFF is negotiated from the version field only (43 vs 42); no
    /// other byte pattern switches the layout.
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::Truncated {
                offset: 0,
                needed: TIFF_HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }

        // The byte-order mark is two identical bytes, so reading it
        // little-endian is safe before the order is known.
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        match version {
            VERSION_TIFF => {
                let first_ifd_offset = byte_order.read_u32(&bytes[4..8]) as u64;
                if first_ifd_offset >= file_size {
                    return Err(TiffError::InvalidOffset {
                        offset: first_ifd_offset,
                        size: file_size,
                    });
                }
                Ok(TiffHeader {
                    byte_order,
                    big_tiff: false,
                    first_ifd_offset,
                })
            }
            VERSION_BIGTIFF => {
                if bytes.len() < BIGTIFF_HEADER_SIZE {
                    return Err(TiffError::Truncated {
                        offset: 0,
                        needed: BIGTIFF_HEADER_SIZE as u64,
                        available: bytes.len() as u64,
                    });
                }
                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }
                // Bytes 6-7 are reserved; not strictly required to be zero.
                let first_ifd_offset = byte_order.read_u64(&bytes[8..16]);
                if first_ifd_offset >= file_size {
                    return Err(TiffError::InvalidOffset {
                        offset: first_ifd_offset,
                        size: file_size,
                    });
                }
                Ok(TiffHeader {
                    byte_order,
                    big_tiff: true,
                    first_ifd_offset,
                })
            }
            _ => Err(TiffError::InvalidVersion(version)),
        }
    }

    /// Size of one IFD entry: 12 bytes classic, 20 bytes BigTIFF.
    #[inline]
    pub const fn entry_size(&self) -> usize {
        if self.big_tiff {
            20
        } else {
            12
        }
    }

    /// Size of the entry-count field at the start of an IFD.
    #[inline]
    pub const fn count_size(&self) -> usize {
        if self.big_tiff {
            8
        } else {
            2
        }
    }

    /// Size of the next-IFD offset at the end of an IFD, and of each
    /// entry's value/offset slot.
    #[inline]
    pub const fn offset_size(&self) -> usize {
        if self.big_tiff {
            8
        } else {
            4
        }
    }
}

// =============================================================================
// Tiff
// =============================================================================

/// A fully parsed TIFF container: header plus the ordered page list.
///
/// All tag values are owned copies; the byte source is not retained.
#[derive(Debug, Clone)]
pub struct Tiff {
    /// Parsed file header
    pub header: TiffHeader,
    /// Directories in chain order (the page list)
    pub directories: Vec<Directory>,
}

impl Tiff {
    /// Byte order of the file.
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Whether the file is BigTIFF.
    pub fn is_big_tiff(&self) -> bool {
        self.header.big_tiff
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Parse a complete TIFF container from a byte source.
///
/// Walks the IFD chain until a next-offset of zero. Visited offsets are
/// tracked explicitly: a repeated offset fails with
/// [`TiffError::CyclicDirectoryChain`] rather than looping.
pub fn read_tiff<S: ByteSource>(source: S, options: &ReadOptions) -> Result<Tiff, TiffError> {
    let file_size = source.len();
    let header_len = (BIGTIFF_HEADER_SIZE as u64).min(file_size) as usize;
    let header_bytes = source.read_exact_at(0, header_len)?;
    let header = TiffHeader::parse(&header_bytes, file_size)?;

    let mut directories = Vec::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut next = Some(header.first_ifd_offset);

    while let Some(offset) = next {
        if !visited.insert(offset) {
            return Err(TiffError::CyclicDirectoryChain(offset));
        }
        let directory = read_directory_at(&source, &header, offset, options)?;
        next = directory.next_ifd_offset();
        if let Some(n) = next {
            if n >= file_size {
                return Err(TiffError::InvalidOffset {
                    offset: n,
                    size: file_size,
                });
            }
        }
        directories.push(directory);
    }

    debug!(pages = directories.len(), big_tiff = header.big_tiff, "parsed TIFF container");
    Ok(Tiff {
        header,
        directories,
    })
}

/// Parse one directory at an absolute offset.
///
/// Also the entry point for sub-IFDs (tag 330): callers traversing sub-IFD
/// offsets should keep their own visited set if the file is untrusted.
pub fn read_directory_at<S: ByteSource>(
    source: &S,
    header: &TiffHeader,
    offset: u64,
    options: &ReadOptions,
) -> Result<Directory, TiffError> {
    let file_size = source.len();
    if offset >= file_size {
        return Err(TiffError::InvalidOffset {
            offset,
            size: file_size,
        });
    }
    let order = header.byte_order;

    let count_bytes = source.read_exact_at(offset, header.count_size())?;
    let entry_count = if header.big_tiff {
        order.read_u64(&count_bytes)
    } else {
        order.read_u16(&count_bytes) as u64
    };

    // Entry table plus the trailing next-IFD offset, in one read.
    let table_len = (entry_count as usize)
        .checked_mul(header.entry_size())
        .and_then(|n| n.checked_add(header.offset_size()))
        .ok_or(TiffError::InvalidOffset {
            offset,
            size: file_size,
        })?;
    let table = source.read_exact_at(offset + header.count_size() as u64, table_len)?;

    let mut entries = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count as usize {
        let raw_entry = &table[i * header.entry_size()..(i + 1) * header.entry_size()];
        if let Some(entry) = parse_entry(source, header, raw_entry, options)? {
            entries.push(entry);
        }
    }

    let next_pos = entry_count as usize * header.entry_size();
    let next_offset = if header.big_tiff {
        order.read_u64(&table[next_pos..])
    } else {
        order.read_u32(&table[next_pos..]) as u64
    };

    Directory::from_entries(
        entries,
        if next_offset == 0 { None } else { Some(next_offset) },
        options,
    )
}

/// Parse one 12- or 20-byte entry, resolving its value.
///
/// Returns `Ok(None)` when a lenient parse skips an undecodable entry.
fn parse_entry<S: ByteSource>(
    source: &S,
    header: &TiffHeader,
    raw: &[u8],
    options: &ReadOptions,
) -> Result<Option<Entry>, TiffError> {
    let order = header.byte_order;
    let tag = order.read_u16(&raw[0..2]);
    let type_raw = order.read_u16(&raw[2..4]);
    let count = if header.big_tiff {
        order.read_u64(&raw[4..12])
    } else {
        order.read_u32(&raw[4..8]) as u64
    };
    let slot = &raw[raw.len() - header.offset_size()..];

    let Some(field_type) = FieldType::from_u16(type_raw) else {
        if options.is_strict() {
            return Err(TiffError::UnknownFieldType(type_raw));
        }
        warn!(tag, field_type = type_raw, "skipping entry with unknown field type");
        return Ok(None);
    };

    // Registry validation: diagnostics in lenient mode, rejection in strict.
    if let Some(meta) = tags::lookup(tag) {
        if !meta.accepts(field_type) {
            if options.is_strict() {
                return Err(TiffError::TagTypeMismatch {
                    tag,
                    expected: meta.types[0].name(),
                    actual: field_type.name(),
                });
            }
            warn!(
                tag,
                name = meta.name,
                declared = field_type.name(),
                "tag declared with off-registry field type"
            );
        }
        if let Cardinality::Exactly(n) = meta.cardinality {
            if count != n as u64 {
                if options.is_strict() {
                    return Err(TiffError::InvalidTagValue {
                        tag,
                        message: format!("{} declares {count} elements, expected {n}", meta.name),
                    });
                }
                warn!(tag, name = meta.name, count, expected = n, "unexpected element count");
            }
        }
    }

    let total = count
        .checked_mul(field_type.size_in_bytes() as u64)
        .ok_or(TiffError::InvalidTagValue {
            tag,
            message: format!("value size overflows: count {count}"),
        })?;

    let (raw_value, was_inline) = if field_type.fits_inline(count, header.big_tiff) {
        (bytes::Bytes::copy_from_slice(&slot[..total as usize]), true)
    } else {
        let value_offset = if header.big_tiff {
            order.read_u64(slot)
        } else {
            order.read_u32(slot) as u64
        };
        if value_offset >= source.len() {
            return Err(TiffError::InvalidOffset {
                offset: value_offset,
                size: source.len(),
            });
        }
        let total = usize::try_from(total).map_err(|_| TiffError::InvalidTagValue {
            tag,
            message: format!("value size {total} exceeds addressable memory"),
        })?;
        (source.read_exact_at(value_offset, total)?, false)
    };

    let value = decode_value(field_type, count, &raw_value, order)?;
    Ok(Some(Entry {
        tag,
        value,
        was_inline,
    }))
}

// =============================================================================
// Writing
// =============================================================================

/// One page to be written: a directory plus its strip/tile payload chunks.
///
/// When `chunks` is non-empty the writer lays them out after the directory's
/// value area and rewrites the offsets/byte-counts tags (tile tags when the
/// directory carries TileWidth, strip tags otherwise) once positions are
/// known. A page with no chunks writes its directory verbatim.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub directory: Directory,
    pub chunks: Vec<Vec<u8>>,
}

impl Page {
    /// A page carrying only tags.
    pub fn bare(directory: Directory) -> Self {
        Page {
            directory,
            chunks: Vec::new(),
        }
    }

    /// A page with strip/tile payload data.
    pub fn with_chunks(directory: Directory, chunks: Vec<Vec<u8>>) -> Self {
        Page { directory, chunks }
    }
}

/// Serialize pages into a complete TIFF byte stream.
///
/// Layout per page: entry table, word-aligned out-of-line value area, then
/// word-aligned payload chunks. Offsets are assigned in a sizing pass before
/// serialization, so the output is deterministic.
pub fn write_tiff(
    pages: &[Page],
    byte_order: ByteOrder,
    big_tiff: bool,
) -> Result<Vec<u8>, TiffError> {
    if pages.is_empty() {
        return Err(TiffError::UnsupportedFeature(
            "a TIFF container must hold at least one directory".into(),
        ));
    }

    let header_size = if big_tiff {
        BIGTIFF_HEADER_SIZE
    } else {
        TIFF_HEADER_SIZE
    };
    let count_size = if big_tiff { 8 } else { 2 };
    let entry_size = if big_tiff { 20 } else { 12 };
    let offset_size = if big_tiff { 8 } else { 4 };

    // Pass 1: resolve final per-page directories (payload tags rewritten with
    // placeholder offsets; counts and types are final so sizes are stable).
    let mut final_dirs = Vec::with_capacity(pages.len());
    for page in pages {
        final_dirs.push(directory_with_chunk_tags(page, big_tiff)?);
    }

    // Pass 2: compute absolute positions for each region.
    let mut ifd_offsets = Vec::with_capacity(pages.len());
    let mut chunk_offsets: Vec<Vec<u64>> = Vec::with_capacity(pages.len());
    let mut cursor = header_size as u64;
    for (page, dir) in pages.iter().zip(&final_dirs) {
        ifd_offsets.push(cursor);
        let table_size = count_size + dir.len() * entry_size + offset_size;
        cursor += table_size as u64;

        // Out-of-line value area, each value padded to a word boundary.
        for entry in dir.entries() {
            if !entry.value.fits_inline(big_tiff) {
                cursor += word_aligned(entry.value.byte_len());
            }
        }

        // Payload area.
        let mut offsets = Vec::with_capacity(page.chunks.len());
        for chunk in &page.chunks {
            offsets.push(cursor);
            cursor += word_aligned(chunk.len() as u64);
        }
        chunk_offsets.push(offsets);
    }

    if !big_tiff && cursor > u32::MAX as u64 {
        return Err(TiffError::UnsupportedFeature(format!(
            "classic TIFF cannot address {cursor} bytes; use BigTIFF"
        )));
    }

    // Pass 3: serialize.
    let mut out = Vec::with_capacity(cursor as usize);
    write_header(&mut out, byte_order, big_tiff, ifd_offsets[0]);

    for (i, (page, dir)) in pages.iter().zip(&final_dirs).enumerate() {
        debug_assert_eq!(out.len() as u64, ifd_offsets[i]);
        let dir = patch_chunk_offsets(dir.clone(), page, &chunk_offsets[i], big_tiff)?;
        let next = ifd_offsets.get(i + 1).copied().unwrap_or(0);
        write_directory(&mut out, &dir, byte_order, big_tiff, next);

        for chunk in &page.chunks {
            out.extend_from_slice(chunk);
            if chunk.len() % 2 == 1 {
                out.push(0);
            }
        }
    }

    debug_assert_eq!(out.len() as u64, cursor);
    Ok(out)
}

fn word_aligned(len: u64) -> u64 {
    len + (len % 2)
}

fn write_header(out: &mut Vec<u8>, byte_order: ByteOrder, big_tiff: bool, first_ifd: u64) {
    match byte_order {
        ByteOrder::LittleEndian => out.extend_from_slice(b"II"),
        ByteOrder::BigEndian => out.extend_from_slice(b"MM"),
    }
    if big_tiff {
        byte_order.put_u16(out, VERSION_BIGTIFF);
        byte_order.put_u16(out, 8);
        byte_order.put_u16(out, 0);
        byte_order.put_u64(out, first_ifd);
    } else {
        byte_order.put_u16(out, VERSION_TIFF);
        byte_order.put_u32(out, first_ifd as u32);
    }
}

/// Rewrite the strip/tile offset and byte-count tags for a page with payload
/// chunks. Offsets get placeholder zeros; byte counts are final.
fn directory_with_chunk_tags(page: &Page, big_tiff: bool) -> Result<Directory, TiffError> {
    if page.chunks.is_empty() {
        return Ok(page.directory.clone());
    }

    let tiled = page.directory.contains(tags::tag::TILE_WIDTH);
    let (offsets_tag, counts_tag) = if tiled {
        (tags::tag::TILE_OFFSETS, tags::tag::TILE_BYTE_COUNTS)
    } else {
        (tags::tag::STRIP_OFFSETS, tags::tag::STRIP_BYTE_COUNTS)
    };

    let n = page.chunks.len();
    let placeholder = if big_tiff {
        TagValue::Long8(vec![0; n])
    } else {
        TagValue::Long(vec![0; n])
    };
    let counts: Vec<u32> = page
        .chunks
        .iter()
        .map(|c| {
            u32::try_from(c.len()).map_err(|_| {
                TiffError::UnsupportedFeature("strip/tile chunk exceeds 4 GiB".into())
            })
        })
        .collect::<Result<_, _>>()?;

    // Rebuild the entry list with the payload tags replaced, keeping the
    // directory's entry order (appending when absent).
    let mut entries: Vec<Entry> = page
        .directory
        .entries()
        .iter()
        .filter(|e| e.tag != offsets_tag && e.tag != counts_tag)
        .cloned()
        .collect();
    entries.push(Entry {
        tag: offsets_tag,
        value: placeholder,
        was_inline: false,
    });
    entries.push(Entry {
        tag: counts_tag,
        value: TagValue::Long(counts),
        was_inline: false,
    });
    entries.sort_by_key(|e| e.tag);

    Directory::from_entries(entries, None, &ReadOptions::strict())
}

/// Substitute the real chunk offsets into the placeholder offsets tag.
fn patch_chunk_offsets(
    dir: Directory,
    page: &Page,
    offsets: &[u64],
    big_tiff: bool,
) -> Result<Directory, TiffError> {
    if page.chunks.is_empty() {
        return Ok(dir);
    }
    let tiled = dir.contains(tags::tag::TILE_WIDTH);
    let offsets_tag = if tiled {
        tags::tag::TILE_OFFSETS
    } else {
        tags::tag::STRIP_OFFSETS
    };

    let value = if big_tiff {
        TagValue::Long8(offsets.to_vec())
    } else {
        TagValue::Long(offsets.iter().map(|&o| o as u32).collect())
    };

    let entries = dir
        .entries()
        .iter()
        .map(|e| {
            if e.tag == offsets_tag {
                Entry {
                    tag: e.tag,
                    value: value.clone(),
                    was_inline: false,
                }
            } else {
                e.clone()
            }
        })
        .collect();
    Directory::from_entries(entries, None, &ReadOptions::strict())
}

/// Serialize one directory: entry count, entries in order, next-IFD offset,
/// then the out-of-line value area.
fn write_directory(
    out: &mut Vec<u8>,
    dir: &Directory,
    byte_order: ByteOrder,
    big_tiff: bool,
    next_ifd: u64,
) {
    let entry_size = if big_tiff { 20 } else { 12 };
    let count_size: usize = if big_tiff { 8 } else { 2 };
    let offset_size: usize = if big_tiff { 8 } else { 4 };
    let table_start = out.len();
    let value_area_start =
        table_start + count_size + dir.len() * entry_size + offset_size;

    if big_tiff {
        byte_order.put_u64(out, dir.len() as u64);
    } else {
        byte_order.put_u16(out, dir.len() as u16);
    }

    let mut value_cursor = value_area_start as u64;
    let mut value_area: Vec<u8> = Vec::new();

    for entry in dir.entries() {
        let raw = encode_value(&entry.value, byte_order);
        byte_order.put_u16(out, entry.tag);
        byte_order.put_u16(out, entry.value.field_type().as_u16());
        if big_tiff {
            byte_order.put_u64(out, entry.value.count());
        } else {
            byte_order.put_u32(out, entry.value.count() as u32);
        }

        if entry.value.fits_inline(big_tiff) {
            // Inline: value bytes left-justified in the slot, zero padded.
            let mut slot = raw;
            slot.resize(offset_size, 0);
            out.extend_from_slice(&slot);
        } else {
            if big_tiff {
                byte_order.put_u64(out, value_cursor);
            } else {
                byte_order.put_u32(out, value_cursor as u32);
            }
            value_cursor += word_aligned(raw.len() as u64);
            let padded = raw.len() % 2 == 1;
            value_area.extend_from_slice(&raw);
            if padded {
                value_area.push(0);
            }
        }
    }

    if big_tiff {
        byte_order.put_u64(out, next_ifd);
    } else {
        byte_order.put_u32(out, next_ifd as u32);
    }

    debug_assert_eq!(out.len(), value_area_start);
    out.extend_from_slice(&value_area);
}

// =============================================================================
// Tests
// =============================================================================
