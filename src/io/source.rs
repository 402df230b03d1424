//! Random-access byte sources.
//!
//! The container parser and raster assembler never assume streaming-only
//! access: offsets into earlier parts of the file are required for both read
//! and write. Anything that can serve absolute-offset reads can back a parse.

use bytes::Bytes;

use crate::error::TiffError;

/// Trait for reading byte ranges from a TIFF byte source.
///
/// Implementations must be cheap to call repeatedly; the parser issues one
/// read per out-of-line value and one per strip/tile payload.
pub trait ByteSource {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns [`TiffError::InvalidOffset`] when the range does not lie
    /// within the source.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, TiffError>;

    /// Total size of the source in bytes.
    fn len(&self) -> u64;

    /// Whether the source is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for [u8] {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, TiffError> {
        let start = usize::try_from(offset).map_err(|_| TiffError::InvalidOffset {
            offset,
            size: self.len() as u64,
        })?;
        let end = start.checked_add(len).ok_or(TiffError::InvalidOffset {
            offset,
            size: self.len() as u64,
        })?;
        if end > self.len() {
            return Err(TiffError::Truncated {
                offset,
                needed: len as u64,
                available: (self.len() - start.min(self.len())) as u64,
            });
        }
        Ok(Bytes::copy_from_slice(&self[start..end]))
    }

    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }
}

impl ByteSource for Vec<u8> {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, TiffError> {
        self.as_slice().read_exact_at(offset, len)
    }

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

impl ByteSource for Bytes {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, TiffError> {
        let start = usize::try_from(offset).map_err(|_| TiffError::InvalidOffset {
            offset,
            size: ByteSource::len(self),
        })?;
        let end = start.checked_add(len).ok_or(TiffError::InvalidOffset {
            offset,
            size: ByteSource::len(self),
        })?;
        if end > Bytes::len(self) {
            return Err(TiffError::Truncated {
                offset,
                needed: len as u64,
                available: (Bytes::len(self) - start.min(Bytes::len(self))) as u64,
            });
        }
        // Zero-copy: slice shares the underlying allocation.
        Ok(self.slice(start..end))
    }

    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, TiffError> {
        (**self).read_exact_at(offset, len)
    }

    fn len(&self) -> u64 {
        (**self).len()
    }
}

// =============================================================================
// Tests
// =============================================================================
