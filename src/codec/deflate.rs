//! Deflate in a zlib wrapper (Compression = 8, legacy 32946).

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as Level;

use crate::error::TiffError;

use super::{Codec, CodecParams};

pub struct DeflateCodec;

impl Codec for DeflateCodec {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut out = Vec::with_capacity(params.expected_len);
        // Read one byte past the cap so an oversized stream is detected
        // instead of silently truncated.
        let mut decoder = ZlibDecoder::new(input).take(params.expected_len as u64 + 1);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| TiffError::corrupt("deflate", e.to_string()))?;
        if out.len() > params.expected_len {
            return Err(TiffError::corrupt(
                "deflate",
                format!("decoded stream exceeds the declared {} bytes", params.expected_len),
            ));
        }
        Ok(out)
    }

    fn encode(&self, input: &[u8], _params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
        encoder
            .write_all(input)
            .and_then(|_| encoder.finish())
            .map_err(|e| TiffError::corrupt("deflate", e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
