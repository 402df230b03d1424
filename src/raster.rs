//! Raster assembly: from directory tags and strip/tile payloads to decoded
//! pixel planes, and back.
//!
//! Geometry comes from the directory alone. A final strip may decode short
//! (only the rows that exist) or padded out to rows-per-strip; either way
//! only the real rows land in the raster. Tiles are always full-size on disk
//! and edge tiles are clipped while copying into the raster.

use tracing::debug;

use crate::codec::{codec_for, Codec, CodecParams, Compression, FillOrder};
use crate::container::Page;
use crate::error::TiffError;
use crate::ifd::{Directory, DirectoryBuilder};
use crate::io::{ByteOrder, ByteSource};
use crate::tags::tag;
use crate::value::TagValue;

// =============================================================================
// Geometry
// =============================================================================

/// How a page's pixel data is chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLayout {
    Strips { rows_per_strip: u32 },
    Tiles { tile_width: u32, tile_length: u32 },
}

/// Resolved pixel geometry for one page.
///
/// Width, height, bits per sample, samples per pixel, compression and
/// photometric interpretation are mandatory; planar configuration,
/// predictor, fill order and rows-per-strip fall back to their TIFF
/// defaults when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub compression: Compression,
    pub photometric: u16,
    /// PlanarConfiguration == 2: one chunk sequence per sample plane
    pub planar: bool,
    /// Predictor tag: 1 (none) or 2 (horizontal differencing)
    pub predictor: u16,
    pub fill_order: FillOrder,
    pub layout: ChunkLayout,
}

impl ImageGeometry {
    pub fn resolve(directory: &Directory) -> Result<Self, TiffError> {
        let width = directory.require_u32(tag::IMAGE_WIDTH, "ImageWidth")?;
        let height = directory.require_u32(tag::IMAGE_LENGTH, "ImageLength")?;
        if width == 0 || height == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: tag::IMAGE_WIDTH,
                message: format!("degenerate image dimensions {width}x{height}"),
            });
        }

        let samples_per_pixel = directory
            .get(tag::SAMPLES_PER_PIXEL)
            .and_then(TagValue::first_u16)
            .ok_or(TiffError::MissingMandatoryTag {
                tag: tag::SAMPLES_PER_PIXEL,
                name: "SamplesPerPixel",
            })?;
        if samples_per_pixel == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: tag::SAMPLES_PER_PIXEL,
                message: "zero samples per pixel".into(),
            });
        }

        let bits = directory
            .get(tag::BITS_PER_SAMPLE)
            .and_then(TagValue::u16_values)
            .ok_or(TiffError::MissingMandatoryTag {
                tag: tag::BITS_PER_SAMPLE,
                name: "BitsPerSample",
            })?;
        let &bits_per_sample = bits.first().ok_or(TiffError::InvalidTagValue {
            tag: tag::BITS_PER_SAMPLE,
            message: "empty bits per sample array".into(),
        })?;
        if bits.iter().any(|&b| b != bits_per_sample) {
            return Err(TiffError::UnsupportedFeature(format!(
                "heterogeneous bits per sample {bits:?}"
            )));
        }
        if !matches!(bits_per_sample, 1 | 8 | 16 | 32) {
            return Err(TiffError::UnsupportedFeature(format!(
                "{bits_per_sample} bits per sample"
            )));
        }

        let compression_raw = directory
            .get(tag::COMPRESSION)
            .and_then(TagValue::first_u16)
            .ok_or(TiffError::MissingMandatoryTag {
                tag: tag::COMPRESSION,
                name: "Compression",
            })?;
        let compression = Compression::from_tag_value(compression_raw)?;

        let photometric = directory
            .get(tag::PHOTOMETRIC_INTERPRETATION)
            .and_then(TagValue::first_u16)
            .ok_or(TiffError::MissingMandatoryTag {
                tag: tag::PHOTOMETRIC_INTERPRETATION,
                name: "PhotometricInterpretation",
            })?;

        let planar = match directory
            .get(tag::PLANAR_CONFIGURATION)
            .and_then(TagValue::first_u16)
            .unwrap_or(1)
        {
            1 => false,
            2 => true,
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag: tag::PLANAR_CONFIGURATION,
                    message: format!("planar configuration {other}"),
                })
            }
        };

        let predictor = directory
            .get(tag::PREDICTOR)
            .and_then(TagValue::first_u16)
            .unwrap_or(1);
        match predictor {
            1 | 2 => {}
            3 => {
                return Err(TiffError::UnsupportedFeature(
                    "floating point predictor".into(),
                ))
            }
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag: tag::PREDICTOR,
                    message: format!("predictor {other}"),
                })
            }
        }
        if predictor == 2 && bits_per_sample < 8 {
            return Err(TiffError::UnsupportedFeature(
                "horizontal predictor on sub-byte samples".into(),
            ));
        }

        let fill_order = match directory
            .get(tag::FILL_ORDER)
            .and_then(TagValue::first_u16)
            .unwrap_or(1)
        {
            1 => FillOrder::Msb,
            2 => FillOrder::Lsb,
            other => {
                return Err(TiffError::InvalidTagValue {
                    tag: tag::FILL_ORDER,
                    message: format!("fill order {other}"),
                })
            }
        };

        let layout = if directory.contains(tag::TILE_WIDTH) {
            let tile_width = directory.require_u32(tag::TILE_WIDTH, "TileWidth")?;
            let tile_length = directory.require_u32(tag::TILE_LENGTH, "TileLength")?;
            if tile_width == 0 || tile_length == 0 || tile_width % 16 != 0 || tile_length % 16 != 0
            {
                return Err(TiffError::InvalidTagValue {
                    tag: tag::TILE_WIDTH,
                    message: format!("tile dimensions {tile_width}x{tile_length} are not multiples of 16"),
                });
            }
            ChunkLayout::Tiles {
                tile_width,
                tile_length,
            }
        } else {
            let rows_per_strip = directory
                .get(tag::ROWS_PER_STRIP)
                .and_then(TagValue::first_u32)
                .unwrap_or(height)
                .min(height);
            if rows_per_strip == 0 {
                return Err(TiffError::InvalidTagValue {
                    tag: tag::ROWS_PER_STRIP,
                    message: "zero rows per strip".into(),
                });
            }
            ChunkLayout::Strips { rows_per_strip }
        };

        Ok(ImageGeometry {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            compression,
            photometric,
            planar,
            predictor,
            fill_order,
            layout,
        })
    }

    /// Samples interleaved within one chunk's rows: all of them for chunky
    /// data, exactly one for planar.
    fn chunk_samples(&self) -> usize {
        if self.planar {
            1
        } else {
            self.samples_per_pixel as usize
        }
    }

    fn plane_count(&self) -> usize {
        if self.planar {
            self.samples_per_pixel as usize
        } else {
            1
        }
    }

    /// Bytes per raster row within one plane.
    fn row_stride(&self) -> usize {
        packed_stride(self.width, self.bits_per_sample, self.chunk_samples())
    }

    /// Total chunks across all planes.
    fn chunk_count(&self) -> usize {
        self.plane_count()
            * match self.layout {
                ChunkLayout::Strips { rows_per_strip } => {
                    div_ceil(self.height, rows_per_strip) as usize
                }
                ChunkLayout::Tiles {
                    tile_width,
                    tile_length,
                } => (div_ceil(self.width, tile_width) * div_ceil(self.height, tile_length)) as usize,
            }
    }
}

fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

fn packed_stride(width_px: u32, bits: u16, samples: usize) -> usize {
    ((width_px as usize * bits as usize * samples) + 7) / 8
}

// =============================================================================
// Raster
// =============================================================================

/// Decoded pixel data for one page.
///
/// Chunky rasters hold a single interleaved plane; planar rasters hold one
/// plane per sample. Rows are packed MSB-first for 1-bit data; multi-byte
/// samples keep the byte order of the file they came from (or the order
/// given to [`encode_page`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub photometric: u16,
    pub planar: bool,
    pub planes: Vec<Vec<u8>>,
}

impl Raster {
    /// A single-plane raster with interleaved samples.
    pub fn chunky(
        width: u32,
        height: u32,
        bits_per_sample: u16,
        samples_per_pixel: u16,
        photometric: u16,
        data: Vec<u8>,
    ) -> Result<Self, TiffError> {
        let stride = packed_stride(width, bits_per_sample, samples_per_pixel as usize);
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(TiffError::GeometryMismatch {
                expected: expected as u64,
                actual: data.len() as u64,
            });
        }
        Ok(Raster {
            width,
            height,
            bits_per_sample,
            samples_per_pixel,
            photometric,
            planar: false,
            planes: vec![data],
        })
    }

    /// A raster with one plane per sample.
    pub fn with_planes(
        width: u32,
        height: u32,
        bits_per_sample: u16,
        photometric: u16,
        planes: Vec<Vec<u8>>,
    ) -> Result<Self, TiffError> {
        let stride = packed_stride(width, bits_per_sample, 1);
        let expected = stride * height as usize;
        for plane in &planes {
            if plane.len() != expected {
                return Err(TiffError::GeometryMismatch {
                    expected: expected as u64,
                    actual: plane.len() as u64,
                });
            }
        }
        Ok(Raster {
            width,
            height,
            bits_per_sample,
            samples_per_pixel: planes.len() as u16,
            photometric,
            planar: true,
            planes,
        })
    }

    /// Bytes per row within one plane.
    pub fn row_stride(&self) -> usize {
        let samples = if self.planar {
            1
        } else {
            self.samples_per_pixel as usize
        };
        packed_stride(self.width, self.bits_per_sample, samples)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one page's pixel data into a raster.
///
/// `byte_order` is the containing file's; it governs multi-byte sample
/// interpretation for the horizontal predictor.
pub fn decode_page<S: ByteSource>(
    source: &S,
    directory: &Directory,
    byte_order: ByteOrder,
) -> Result<Raster, TiffError> {
    let geom = ImageGeometry::resolve(directory)?;
    let codec = codec_for(geom.compression);
    let (offsets, counts) = chunk_ranges(directory, &geom)?;

    debug!(
        width = geom.width,
        height = geom.height,
        compression = geom.compression.tag_value(),
        chunks = offsets.len(),
        "decoding page"
    );

    let planes = match geom.layout {
        ChunkLayout::Strips { rows_per_strip } => decode_strips(
            source,
            &geom,
            codec.as_ref(),
            &offsets,
            &counts,
            rows_per_strip,
            byte_order,
        )?,
        ChunkLayout::Tiles {
            tile_width,
            tile_length,
        } => decode_tiles(
            source,
            &geom,
            codec.as_ref(),
            &offsets,
            &counts,
            tile_width,
            tile_length,
            byte_order,
        )?,
    };

    Ok(Raster {
        width: geom.width,
        height: geom.height,
        bits_per_sample: geom.bits_per_sample,
        samples_per_pixel: geom.samples_per_pixel,
        photometric: geom.photometric,
        planar: geom.planar,
        planes,
    })
}

/// Strip/tile offsets and byte counts, validated against the geometry.
fn chunk_ranges(
    directory: &Directory,
    geom: &ImageGeometry,
) -> Result<(Vec<u64>, Vec<u64>), TiffError> {
    let (offsets_tag, offsets_name, counts_tag, counts_name) = match geom.layout {
        ChunkLayout::Strips { .. } => (
            tag::STRIP_OFFSETS,
            "StripOffsets",
            tag::STRIP_BYTE_COUNTS,
            "StripByteCounts",
        ),
        ChunkLayout::Tiles { .. } => (
            tag::TILE_OFFSETS,
            "TileOffsets",
            tag::TILE_BYTE_COUNTS,
            "TileByteCounts",
        ),
    };

    let offsets = directory
        .get(offsets_tag)
        .and_then(TagValue::u64_values)
        .ok_or(TiffError::MissingMandatoryTag {
            tag: offsets_tag,
            name: offsets_name,
        })?;
    let counts = directory
        .get(counts_tag)
        .and_then(TagValue::u64_values)
        .ok_or(TiffError::MissingMandatoryTag {
            tag: counts_tag,
            name: counts_name,
        })?;

    let expected = geom.chunk_count();
    if offsets.len() != expected || counts.len() != expected {
        return Err(TiffError::GeometryMismatch {
            expected: expected as u64,
            actual: offsets.len().min(counts.len()) as u64,
        });
    }
    Ok((offsets, counts))
}

fn read_chunk<S: ByteSource>(source: &S, offset: u64, count: u64) -> Result<bytes::Bytes, TiffError> {
    let len = usize::try_from(count).map_err(|_| TiffError::InvalidOffset {
        offset,
        size: source.len(),
    })?;
    source.read_exact_at(offset, len)
}

#[allow(clippy::too_many_arguments)]
fn decode_strips<S: ByteSource>(
    source: &S,
    geom: &ImageGeometry,
    codec: &dyn Codec,
    offsets: &[u64],
    counts: &[u64],
    rows_per_strip: u32,
    byte_order: ByteOrder,
) -> Result<Vec<Vec<u8>>, TiffError> {
    let stride = geom.row_stride();
    let strips_per_plane = div_ceil(geom.height, rows_per_strip) as usize;

    let mut planes = Vec::with_capacity(geom.plane_count());
    for plane in 0..geom.plane_count() {
        let mut buf = Vec::with_capacity(geom.height as usize * stride);
        for strip in 0..strips_per_plane {
            let idx = plane * strips_per_plane + strip;
            let rows = rows_per_strip.min(geom.height - strip as u32 * rows_per_strip) as usize;
            let needed = rows * stride;
            // Some writers pad the final strip out to rows_per_strip rows.
            let nominal = rows_per_strip as usize * stride;

            let compressed = read_chunk(source, offsets[idx], counts[idx])?;
            let params = CodecParams {
                expected_len: nominal,
                pixel_width: geom.width as usize,
                row_stride: stride,
                fill_order: geom.fill_order,
            };
            let mut decoded = codec.decode(&compressed, &params)?;
            if decoded.len() < needed || decoded.len() > nominal {
                return Err(TiffError::GeometryMismatch {
                    expected: needed as u64,
                    actual: decoded.len() as u64,
                });
            }
            if geom.predictor == 2 {
                for row in decoded.chunks_exact_mut(stride) {
                    predictor_unapply(row, geom.bits_per_sample, geom.chunk_samples(), byte_order);
                }
            }
            buf.extend_from_slice(&decoded[..needed]);
        }
        planes.push(buf);
    }
    Ok(planes)
}

#[allow(clippy::too_many_arguments)]
fn decode_tiles<S: ByteSource>(
    source: &S,
    geom: &ImageGeometry,
    codec: &dyn Codec,
    offsets: &[u64],
    counts: &[u64],
    tile_width: u32,
    tile_length: u32,
    byte_order: ByteOrder,
) -> Result<Vec<Vec<u8>>, TiffError> {
    let plane_stride = geom.row_stride();
    let tile_stride = packed_stride(tile_width, geom.bits_per_sample, geom.chunk_samples());
    let tile_len = tile_stride * tile_length as usize;
    let across = div_ceil(geom.width, tile_width) as usize;
    let down = div_ceil(geom.height, tile_length) as usize;
    // Tile widths are multiples of 16, so horizontal byte offsets are exact
    // even for 1-bit data.
    let bytes_per_tile_column =
        tile_width as usize * geom.bits_per_sample as usize * geom.chunk_samples() / 8;

    let mut planes = Vec::with_capacity(geom.plane_count());
    for plane in 0..geom.plane_count() {
        let mut buf = vec![0u8; geom.height as usize * plane_stride];
        for ty in 0..down {
            for tx in 0..across {
                let idx = plane * across * down + ty * across + tx;
                let compressed = read_chunk(source, offsets[idx], counts[idx])?;
                let params = CodecParams {
                    expected_len: tile_len,
                    pixel_width: tile_width as usize,
                    row_stride: tile_stride,
                    fill_order: geom.fill_order,
                };
                let mut decoded = codec.decode(&compressed, &params)?;
                // Tiles are stored at full size; edge tiles carry padding.
                if decoded.len() != tile_len {
                    return Err(TiffError::GeometryMismatch {
                        expected: tile_len as u64,
                        actual: decoded.len() as u64,
                    });
                }
                if geom.predictor == 2 {
                    for row in decoded.chunks_exact_mut(tile_stride) {
                        predictor_unapply(
                            row,
                            geom.bits_per_sample,
                            geom.chunk_samples(),
                            byte_order,
                        );
                    }
                }

                let x_bytes = tx * bytes_per_tile_column;
                let copy_bytes = tile_stride.min(plane_stride - x_bytes);
                let rows_here = (tile_length as usize).min(geom.height as usize - ty * tile_length as usize);
                for r in 0..rows_here {
                    let dst = (ty * tile_length as usize + r) * plane_stride + x_bytes;
                    buf[dst..dst + copy_bytes]
                        .copy_from_slice(&decoded[r * tile_stride..r * tile_stride + copy_bytes]);
                }
            }
        }
        planes.push(buf);
    }
    Ok(planes)
}

// =============================================================================
// Encoding
// =============================================================================

/// Knobs for [`encode_page`].
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub compression: Compression,
    /// Strip height; the whole image becomes one strip when `None`.
    pub rows_per_strip: Option<u32>,
    /// Apply horizontal differencing before compression (Predictor = 2).
    pub predictor: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            compression: Compression::None,
            rows_per_strip: None,
            predictor: false,
        }
    }
}

/// Compress a raster into a strip-laid-out page ready for the writer.
pub fn encode_page(
    raster: &Raster,
    byte_order: ByteOrder,
    options: &EncodeOptions,
) -> Result<Page, TiffError> {
    if raster.width == 0 || raster.height == 0 {
        return Err(TiffError::GeometryMismatch {
            expected: 1,
            actual: 0,
        });
    }
    if options.predictor && raster.bits_per_sample < 8 {
        return Err(TiffError::UnsupportedFeature(
            "horizontal predictor on sub-byte samples".into(),
        ));
    }

    let codec = codec_for(options.compression);
    let stride = raster.row_stride();
    let rows_per_strip = options
        .rows_per_strip
        .unwrap_or(raster.height)
        .clamp(1, raster.height);
    let samples = if raster.planar {
        1
    } else {
        raster.samples_per_pixel as usize
    };

    let mut chunks = Vec::new();
    for plane in &raster.planes {
        for strip in plane.chunks(rows_per_strip as usize * stride) {
            let params = CodecParams {
                expected_len: strip.len(),
                pixel_width: raster.width as usize,
                row_stride: stride,
                fill_order: FillOrder::Msb,
            };
            let encoded = if options.predictor {
                let mut differenced = strip.to_vec();
                for row in differenced.chunks_exact_mut(stride) {
                    predictor_apply(row, raster.bits_per_sample, samples, byte_order);
                }
                codec.encode(&differenced, &params)?
            } else {
                codec.encode(strip, &params)?
            };
            chunks.push(encoded);
        }
    }

    let spp = raster.samples_per_pixel;
    let mut builder = DirectoryBuilder::new();
    builder
        .set(tag::IMAGE_WIDTH, TagValue::Long(vec![raster.width]))
        .set(tag::IMAGE_LENGTH, TagValue::Long(vec![raster.height]))
        .set(
            tag::BITS_PER_SAMPLE,
            TagValue::Short(vec![raster.bits_per_sample; spp as usize]),
        )
        .set(
            tag::COMPRESSION,
            TagValue::Short(vec![options.compression.tag_value()]),
        )
        .set(
            tag::PHOTOMETRIC_INTERPRETATION,
            TagValue::Short(vec![raster.photometric]),
        )
        .set(tag::SAMPLES_PER_PIXEL, TagValue::Short(vec![spp]))
        .set(tag::ROWS_PER_STRIP, TagValue::Long(vec![rows_per_strip]))
        .set(
            tag::PLANAR_CONFIGURATION,
            TagValue::Short(vec![if raster.planar { 2 } else { 1 }]),
        );
    if options.predictor {
        builder.set(tag::PREDICTOR, TagValue::Short(vec![2]));
    }

    Ok(Page::with_chunks(builder.build(), chunks))
}

// =============================================================================
// Horizontal predictor
// =============================================================================

/// Undo horizontal differencing in place for one row.
fn predictor_unapply(row: &mut [u8], bits: u16, components: usize, byte_order: ByteOrder) {
    match bits {
        8 => {
            for i in components..row.len() {
                row[i] = row[i].wrapping_add(row[i - components]);
            }
        }
        16 => {
            let n = row.len() / 2;
            for i in components..n {
                let prev = byte_order.read_u16(&row[2 * (i - components)..]);
                let cur = byte_order.read_u16(&row[2 * i..]);
                store_u16(byte_order, &mut row[2 * i..2 * i + 2], cur.wrapping_add(prev));
            }
        }
        32 => {
            let n = row.len() / 4;
            for i in components..n {
                let prev = byte_order.read_u32(&row[4 * (i - components)..]);
                let cur = byte_order.read_u32(&row[4 * i..]);
                store_u32(byte_order, &mut row[4 * i..4 * i + 4], cur.wrapping_add(prev));
            }
        }
        _ => {}
    }
}

/// Apply horizontal differencing in place for one row.
fn predictor_apply(row: &mut [u8], bits: u16, components: usize, byte_order: ByteOrder) {
    match bits {
        8 => {
            for i in (components..row.len()).rev() {
                row[i] = row[i].wrapping_sub(row[i - components]);
            }
        }
        16 => {
            let n = row.len() / 2;
            for i in (components..n).rev() {
                let prev = byte_order.read_u16(&row[2 * (i - components)..]);
                let cur = byte_order.read_u16(&row[2 * i..]);
                store_u16(byte_order, &mut row[2 * i..2 * i + 2], cur.wrapping_sub(prev));
            }
        }
        32 => {
            let n = row.len() / 4;
            for i in (components..n).rev() {
                let prev = byte_order.read_u32(&row[4 * (i - components)..]);
                let cur = byte_order.read_u32(&row[4 * i..]);
                store_u32(byte_order, &mut row[4 * i..4 * i + 4], cur.wrapping_sub(prev));
            }
        }
        _ => {}
    }
}

fn store_u16(byte_order: ByteOrder, buf: &mut [u8], value: u16) {
    let bytes = match byte_order {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    };
    buf.copy_from_slice(&bytes);
}

fn store_u32(byte_order: ByteOrder, buf: &mut [u8], value: u32) {
    let bytes = match byte_order {
        ByteOrder::LittleEndian => value.to_le_bytes(),
        ByteOrder::BigEndian => value.to_be_bytes(),
    };
    buf.copy_from_slice(&bytes);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{read_tiff, write_tiff};
    use crate::options::ReadOptions;

    fn gray_raster(width: u32, height: u32) -> Raster {
        let data: Vec<u8> = (0..width as usize * height as usize)
            .map(|i| (i * 31 % 251) as u8)
            .collect();
        Raster::chunky(width, height, 8, 1, 1, data).unwrap()
    }

    /// encode -> serialize -> parse -> decode
    fn full_cycle(raster: &Raster, order: ByteOrder, options: &EncodeOptions) -> Raster {
        let page = encode_page(raster, order, options).unwrap();
        let bytes = write_tiff(&[page], order, false).unwrap();
        let tiff = read_tiff(bytes.as_slice(), &ReadOptions::strict()).unwrap();
        decode_page(&bytes.as_slice(), &tiff.directories[0], tiff.byte_order()).unwrap()
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    #[test]
    fn test_geometry_defaults() {
        let page = encode_page(&gray_raster(10, 4), ByteOrder::LittleEndian, &EncodeOptions::default()).unwrap();
        let geom = ImageGeometry::resolve(&page.directory).unwrap();
        assert_eq!(geom.width, 10);
        assert_eq!(geom.height, 4);
        assert!(!geom.planar);
        assert_eq!(geom.predictor, 1);
        assert_eq!(geom.fill_order, FillOrder::Msb);
        assert_eq!(geom.layout, ChunkLayout::Strips { rows_per_strip: 4 });
        assert_eq!(geom.chunk_count(), 1);
    }

    #[test]
    fn test_geometry_missing_mandatory_tag() {
        let mut builder = DirectoryBuilder::new();
        builder.set(tag::IMAGE_WIDTH, TagValue::Long(vec![4]));
        let result = ImageGeometry::resolve(&builder.build());
        assert!(matches!(
            result,
            Err(TiffError::MissingMandatoryTag { name: "ImageLength", .. })
        ));
    }

    #[test]
    fn test_geometry_rejects_empty_bits_per_sample() {
        // A zero-count BitsPerSample entry parses; resolution must not panic.
        let mut page = encode_page(&gray_raster(4, 4), ByteOrder::LittleEndian, &EncodeOptions::default()).unwrap();
        let mut builder = DirectoryBuilder::new();
        for e in page.directory.entries() {
            builder.set(e.tag, e.value.clone());
        }
        builder.set(tag::BITS_PER_SAMPLE, TagValue::Short(vec![]));
        page.directory = builder.build();
        assert!(matches!(
            ImageGeometry::resolve(&page.directory),
            Err(TiffError::InvalidTagValue { tag: tag::BITS_PER_SAMPLE, .. })
        ));
    }

    #[test]
    fn test_geometry_rejects_float_predictor() {
        let mut page = encode_page(&gray_raster(4, 4), ByteOrder::LittleEndian, &EncodeOptions::default()).unwrap();
        let mut builder = DirectoryBuilder::new();
        for e in page.directory.entries() {
            builder.set(e.tag, e.value.clone());
        }
        builder.set(tag::PREDICTOR, TagValue::Short(vec![3]));
        page.directory = builder.build();
        assert!(matches!(
            ImageGeometry::resolve(&page.directory),
            Err(TiffError::UnsupportedFeature(_))
        ));
    }

    // -------------------------------------------------------------------------
    // Predictor
    // -------------------------------------------------------------------------

    #[test]
    fn test_predictor_roundtrip_8bit() {
        let mut row = vec![10u8, 20, 15, 250, 3, 3];
        let original = row.clone();
        predictor_apply(&mut row, 8, 1, ByteOrder::LittleEndian);
        assert_eq!(row, vec![10, 10, 251, 235, 9, 0]);
        predictor_unapply(&mut row, 8, 1, ByteOrder::LittleEndian);
        assert_eq!(row, original);
    }

    #[test]
    fn test_predictor_respects_components() {
        // RGB row: each channel differences against itself.
        let mut row = vec![10u8, 20, 30, 11, 22, 33];
        predictor_apply(&mut row, 8, 3, ByteOrder::LittleEndian);
        assert_eq!(row, vec![10, 20, 30, 1, 2, 3]);
    }

    #[test]
    fn test_predictor_roundtrip_16bit_both_orders() {
        for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
            let samples: Vec<u16> = vec![100, 65535, 0, 300, 300, 12345];
            let mut row = Vec::new();
            for s in &samples {
                match order {
                    ByteOrder::LittleEndian => row.extend_from_slice(&s.to_le_bytes()),
                    ByteOrder::BigEndian => row.extend_from_slice(&s.to_be_bytes()),
                }
            }
            let original = row.clone();
            predictor_apply(&mut row, 16, 1, order);
            assert_ne!(row, original);
            predictor_unapply(&mut row, 16, 1, order);
            assert_eq!(row, original);
        }
    }

    // -------------------------------------------------------------------------
    // Full decode/encode cycles
    // -------------------------------------------------------------------------

    #[test]
    fn test_cycle_uncompressed_gray() {
        let raster = gray_raster(13, 7);
        assert_eq!(full_cycle(&raster, ByteOrder::LittleEndian, &EncodeOptions::default()), raster);
    }

    #[test]
    fn test_cycle_every_byte_codec() {
        let raster = gray_raster(32, 16);
        for compression in [
            Compression::None,
            Compression::Lzw,
            Compression::Deflate,
            Compression::PackBits,
        ] {
            let options = EncodeOptions {
                compression,
                rows_per_strip: Some(5),
                predictor: false,
            };
            assert_eq!(
                full_cycle(&raster, ByteOrder::LittleEndian, &options),
                raster,
                "{compression:?}"
            );
        }
    }

    #[test]
    fn test_cycle_partial_final_strip() {
        // 10 rows at 8 rows per strip: the second strip holds 2 rows.
        let raster = gray_raster(6, 10);
        let options = EncodeOptions {
            compression: Compression::PackBits,
            rows_per_strip: Some(8),
            predictor: false,
        };
        let page = encode_page(&raster, ByteOrder::LittleEndian, &options).unwrap();
        assert_eq!(page.chunks.len(), 2);
        assert_eq!(full_cycle(&raster, ByteOrder::LittleEndian, &options), raster);
    }

    #[test]
    fn test_padded_final_strip_rows_are_discarded() {
        // Some writers pad the final strip out to rows_per_strip rows; the
        // decoded rows past the image height must be dropped, not rejected.
        let raster = gray_raster(4, 10);
        let options = EncodeOptions {
            compression: Compression::None,
            rows_per_strip: Some(8),
            predictor: false,
        };
        let mut page = encode_page(&raster, ByteOrder::LittleEndian, &options).unwrap();
        assert_eq!(page.chunks[1].len(), 4 * 2);
        page.chunks[1].resize(4 * 8, 0xAA);
        let bytes = write_tiff(&[page], ByteOrder::LittleEndian, false).unwrap();

        let tiff = read_tiff(bytes.as_slice(), &ReadOptions::strict()).unwrap();
        let decoded =
            decode_page(&bytes.as_slice(), &tiff.directories[0], tiff.byte_order()).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_padded_final_strip_compressed() {
        let raster = gray_raster(6, 10);
        let options = EncodeOptions {
            compression: Compression::PackBits,
            rows_per_strip: Some(8),
            predictor: false,
        };
        let mut page = encode_page(&raster, ByteOrder::LittleEndian, &options).unwrap();
        // Re-encode the final strip padded to a full 8 rows.
        let mut padded = raster.planes[0][8 * 6..].to_vec();
        padded.resize(8 * 6, 0);
        let codec = codec_for(Compression::PackBits);
        page.chunks[1] = codec
            .encode(&padded, &CodecParams::sized(padded.len()))
            .unwrap();
        let bytes = write_tiff(&[page], ByteOrder::LittleEndian, false).unwrap();

        let tiff = read_tiff(bytes.as_slice(), &ReadOptions::strict()).unwrap();
        let decoded =
            decode_page(&bytes.as_slice(), &tiff.directories[0], tiff.byte_order()).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_cycle_predictor_lzw() {
        let raster = gray_raster(40, 9);
        let options = EncodeOptions {
            compression: Compression::Lzw,
            rows_per_strip: Some(4),
            predictor: true,
        };
        let decoded = full_cycle(&raster, ByteOrder::BigEndian, &options);
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_cycle_rgb_chunky_and_planar() {
        let rgb: Vec<u8> = (0..8 * 4 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let chunky = Raster::chunky(8, 4, 8, 3, 2, rgb.clone()).unwrap();
        assert_eq!(full_cycle(&chunky, ByteOrder::LittleEndian, &EncodeOptions::default()), chunky);

        let planes: Vec<Vec<u8>> = (0..3)
            .map(|p| rgb.iter().skip(p).step_by(3).copied().collect())
            .collect();
        let planar = Raster::with_planes(8, 4, 8, 2, planes).unwrap();
        let options = EncodeOptions {
            compression: Compression::Deflate,
            rows_per_strip: Some(3),
            predictor: false,
        };
        let page = encode_page(&planar, ByteOrder::LittleEndian, &options).unwrap();
        assert_eq!(page.chunks.len(), 6); // 2 strips x 3 planes
        assert_eq!(full_cycle(&planar, ByteOrder::LittleEndian, &options), planar);
    }

    #[test]
    fn test_cycle_bilevel_ccitt() {
        // 2x2 checkerboard blocks over a 16x6 bilevel image.
        let width = 16u32;
        let stride = 2usize;
        let mut data = vec![0u8; stride * 6];
        for y in 0..6usize {
            for x in 0..16usize {
                if (x / 2 + y / 2) % 2 == 0 {
                    data[y * stride + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        let raster = Raster::chunky(width, 6, 1, 1, 0, data).unwrap();
        for compression in [Compression::CcittGroup3, Compression::CcittGroup4] {
            let options = EncodeOptions {
                compression,
                rows_per_strip: Some(4), // second strip is short
                predictor: false,
            };
            assert_eq!(
                full_cycle(&raster, ByteOrder::LittleEndian, &options),
                raster,
                "{compression:?}"
            );
        }
    }

    #[test]
    fn test_decode_rejects_wrong_chunk_count() {
        let raster = gray_raster(4, 4);
        let page = encode_page(&raster, ByteOrder::LittleEndian, &EncodeOptions::default()).unwrap();
        let bytes = write_tiff(&[page], ByteOrder::LittleEndian, false).unwrap();
        let tiff = read_tiff(bytes.as_slice(), &ReadOptions::strict()).unwrap();

        // Rebuild the directory claiming two strips where one exists.
        let mut builder = DirectoryBuilder::new();
        for e in tiff.directories[0].entries() {
            builder.set(e.tag, e.value.clone());
        }
        builder.set(tag::ROWS_PER_STRIP, TagValue::Long(vec![2]));
        let result = decode_page(&bytes.as_slice(), &builder.build(), ByteOrder::LittleEndian);
        assert!(matches!(result, Err(TiffError::GeometryMismatch { .. })));
    }

    #[test]
    fn test_decode_rejects_short_stream() {
        let raster = gray_raster(8, 8);
        let options = EncodeOptions {
            compression: Compression::PackBits,
            ..EncodeOptions::default()
        };
        let page = encode_page(&raster, ByteOrder::LittleEndian, &options).unwrap();
        // Claim the full image but provide a truncated stream.
        let truncated: Vec<u8> = page.chunks[0][..page.chunks[0].len() / 2].to_vec();
        let page = Page::with_chunks(page.directory.clone(), vec![truncated]);
        let bytes = write_tiff(&[page], ByteOrder::LittleEndian, false).unwrap();
        let tiff = read_tiff(bytes.as_slice(), &ReadOptions::strict()).unwrap();
        let result = decode_page(&bytes.as_slice(), &tiff.directories[0], ByteOrder::LittleEndian);
        assert!(matches!(
            result,
            Err(TiffError::GeometryMismatch { .. }) | Err(TiffError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_raster_construction_validates_size() {
        assert!(Raster::chunky(4, 4, 8, 1, 1, vec![0; 15]).is_err());
        assert!(Raster::chunky(4, 4, 8, 1, 1, vec![0; 16]).is_ok());
        // 1-bit rows are byte padded: 10 pixels -> 2 bytes per row.
        assert!(Raster::chunky(10, 3, 1, 1, 0, vec![0; 6]).is_ok());
    }
}
