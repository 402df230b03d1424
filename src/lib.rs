//! A TIFF container library: parse and write classic TIFF and BigTIFF
//! files, and decode or encode their strip/tile pixel payloads.
//!
//! The layers are independent and composable:
//!
//! - [`io`]: byte-order primitives and the [`ByteSource`] random-access trait
//! - [`tags`]: field types and the well-known tag registry
//! - [`value`]: decoded tag values ([`TagValue`]) and their wire codec
//! - [`ifd`]: the directory model ([`Directory`], [`DirectoryBuilder`])
//! - [`container`]: header parsing, IFD chain walking, two-pass writing
//! - [`codec`]: PackBits, LZW, Deflate, CCITT G3/G4 compression schemes
//! - [`raster`]: geometry resolution and pixel plane assembly
//!
//! Parsed structures own their data; no lifetime ties a [`Tiff`] to the
//! bytes it was read from. Reading is strict by default and can be relaxed
//! per call with [`ReadOptions::lenient`] for files from sloppy producers.
//!
//! # Example
//!
//! ```
//! use tiffwright::{
//!     decode_first_raster, encode_page, write_tiff, ByteOrder, EncodeOptions, Raster,
//!     ReadOptions,
//! };
//!
//! # fn main() -> Result<(), tiffwright::TiffError> {
//! // A 4x2 8-bit grayscale image.
//! let raster = Raster::chunky(4, 2, 8, 1, 1, vec![0, 64, 128, 255, 255, 128, 64, 0])?;
//! let page = encode_page(&raster, ByteOrder::LittleEndian, &EncodeOptions::default())?;
//! let bytes = write_tiff(&[page], ByteOrder::LittleEndian, false)?;
//!
//! let decoded = decode_first_raster(&bytes.as_slice(), &ReadOptions::strict())?;
//! assert_eq!(decoded, raster);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod container;
pub mod error;
pub mod ifd;
pub mod io;
pub mod options;
pub mod raster;
pub mod tags;
pub mod value;

pub use codec::{Codec, CodecParams, Compression, FillOrder};
pub use container::{read_directory_at, read_tiff, write_tiff, Page, Tiff, TiffHeader};
pub use error::TiffError;
pub use ifd::{Directory, DirectoryBuilder, Entry};
pub use io::{ByteOrder, ByteSource};
pub use options::{ReadOptions, Strictness};
pub use raster::{decode_page, encode_page, EncodeOptions, ImageGeometry, Raster};
pub use tags::FieldType;
pub use value::TagValue;

/// Parse a container and decode the first page's pixel data.
pub fn decode_first_raster<S: ByteSource>(
    source: &S,
    options: &ReadOptions,
) -> Result<Raster, TiffError> {
    let tiff = read_tiff(source, options)?;
    decode_page(source, &tiff.directories[0], tiff.byte_order())
}

/// Parse a container and decode every page's pixel data, in chain order.
pub fn decode_all_rasters<S: ByteSource>(
    source: &S,
    options: &ReadOptions,
) -> Result<Vec<Raster>, TiffError> {
    let tiff = read_tiff(source, options)?;
    tiff.directories
        .iter()
        .map(|dir| decode_page(source, dir, tiff.byte_order()))
        .collect()
}
