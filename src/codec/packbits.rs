//! PackBits run-length coding (Compression = 32773).
//!
//! The stream is a sequence of packets, each led by a signed control byte
//! `n`: `0..=127` copies the next `n + 1` literal bytes, `-127..=-1` repeats
//! the next byte `1 - n` times, and `-128` is a no-op filler.

use crate::error::TiffError;

use super::{Codec, CodecParams};

pub struct PackBitsCodec;

impl Codec for PackBitsCodec {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut out = Vec::with_capacity(params.expected_len);
        let mut pos = 0;

        while pos < input.len() {
            let control = input[pos] as i8;
            pos += 1;
            match control {
                0..=127 => {
                    let n = control as usize + 1;
                    let end = pos + n;
                    if end > input.len() {
                        return Err(TiffError::corrupt(
                            "packbits",
                            format!("literal run of {n} overruns the stream"),
                        ));
                    }
                    if out.len() + n > params.expected_len {
                        return Err(overrun(params.expected_len));
                    }
                    out.extend_from_slice(&input[pos..end]);
                    pos = end;
                }
                -127..=-1 => {
                    let n = (1 - control as isize) as usize;
                    if pos >= input.len() {
                        return Err(TiffError::corrupt(
                            "packbits",
                            "replicate run missing its byte",
                        ));
                    }
                    if out.len() + n > params.expected_len {
                        return Err(overrun(params.expected_len));
                    }
                    let byte = input[pos];
                    pos += 1;
                    out.resize(out.len() + n, byte);
                }
                -128 => {} // no-op
            }
        }

        Ok(out)
    }

    fn encode(&self, input: &[u8], _params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut out = Vec::with_capacity(input.len() + input.len() / 128 + 1);
        let mut pos = 0;

        while pos < input.len() {
            let run = run_length(&input[pos..]).min(128);
            if run >= 2 {
                out.push((1i8.wrapping_sub(run as i8)) as u8);
                out.push(input[pos]);
                pos += run;
                continue;
            }

            // Gather literals until a run worth breaking for (3+) starts.
            let start = pos;
            pos += 1;
            while pos < input.len() && pos - start < 128 && run_length(&input[pos..]) < 3 {
                pos += 1;
            }
            out.push((pos - start - 1) as u8);
            out.extend_from_slice(&input[start..pos]);
        }

        Ok(out)
    }
}

fn overrun(expected: usize) -> TiffError {
    TiffError::corrupt(
        "packbits",
        format!("decoded stream exceeds the declared {expected} bytes"),
    )
}

/// Length of the repeated-byte run at the head of `data`.
fn run_length(data: &[u8]) -> usize {
    let first = data[0];
    data.iter().take_while(|&&b| b == first).count()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let codec = PackBitsCodec;
        let params = CodecParams::sized(data.len());
        let encoded = codec.encode(data, &params).unwrap();
        assert_eq!(codec.decode(&encoded, &params).unwrap(), data);
    }

    #[test]
    fn test_decode_spec_example() {
        // The canonical worked example from the PackBits description.
        let encoded: Vec<u8> = vec![
            0xFE, 0xAA, // repeat 0xAA three times
            0x02, 0x80, 0x00, 0x2A, // three literals
            0xFD, 0xAA, // repeat 0xAA four times
            0x03, 0x80, 0x00, 0x2A, 0x22, // four literals
            0xF7, 0xAA, // repeat 0xAA ten times
        ];
        let expected: Vec<u8> = vec![
            0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];
        let codec = PackBitsCodec;
        let decoded = codec
            .decode(&encoded, &CodecParams::sized(expected.len()))
            .unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_noop_control_byte_skipped() {
        let codec = PackBitsCodec;
        let encoded = [0x80u8, 0x00, 0x41, 0x80];
        let decoded = codec.decode(&encoded, &CodecParams::sized(8)).unwrap();
        assert_eq!(decoded, vec![0x41]);
    }

    #[test]
    fn test_decode_rejects_overrun() {
        let codec = PackBitsCodec;
        // Repeat run of 4 against a 3-byte budget.
        let encoded = [0xFDu8, 0xAA];
        assert!(codec.decode(&encoded, &CodecParams::sized(3)).is_err());
        // Truncated literal run.
        let encoded = [0x03u8, 0x01, 0x02];
        assert!(codec.decode(&encoded, &CodecParams::sized(8)).is_err());
    }

    #[test]
    fn test_encode_long_run_splits_at_128() {
        // 130 identical bytes: a 128-run packet plus a 2-run packet.
        let data = vec![0x55u8; 130];
        let codec = PackBitsCodec;
        let encoded = codec.encode(&data, &CodecParams::sized(data.len())).unwrap();
        assert_eq!(encoded, vec![0x81, 0x55, 0xFF, 0x55]);
        roundtrip(&data);
    }

    #[test]
    fn test_roundtrip_mixed_content() {
        roundtrip(&[]);
        roundtrip(&[7]);
        roundtrip(&[1, 2, 3, 4, 5]);
        roundtrip(&[0, 0, 0, 0, 1, 2, 3, 9, 9, 9, 9, 9, 4]);
        let mut noisy: Vec<u8> = (0..=255u8).collect();
        noisy.extend(std::iter::repeat(0xCC).take(300));
        noisy.extend((0..=255u8).rev());
        roundtrip(&noisy);
    }

    #[test]
    fn test_two_byte_runs_encode_compactly() {
        // A pair is worth a replicate packet on its own.
        let data = [9u8, 9];
        let codec = PackBitsCodec;
        let encoded = codec.encode(&data, &CodecParams::sized(2)).unwrap();
        assert_eq!(encoded, vec![0xFF, 9]);
    }
}
