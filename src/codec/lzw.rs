//! TIFF-variant LZW (Compression = 5).
//!
//! Codes are 9 to 12 bits wide, packed most-significant-bit first. Code 256
//! clears the table, 257 ends the stream, and dynamic codes start at 258.
//! TIFF writers switch code width one code earlier than generic LZW: the
//! decoder widens when its table reaches 510, 1022, and 2046 entries, and
//! the table is cleared before a 13-bit code would be needed.

use crate::error::TiffError;

use super::{Codec, CodecParams, FillOrder};

const CLEAR_CODE: u16 = 256;
const EOI_CODE: u16 = 257;
const FIRST_DYNAMIC_CODE: u16 = 258;

/// Decoder table sizes at which the read width widens (one below the
/// encoder's 511/1023/2047 because the decoder's table lags one entry).
const WIDEN_AT_510: usize = 510;
const WIDEN_AT_1022: usize = 1022;
const WIDEN_AT_2046: usize = 2046;

/// Encoder resets here so no code ever needs 13 bits.
const ENCODER_RESET_AT: u16 = 4094;

pub struct LzwCodec;

impl Codec for LzwCodec {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut reader = BitReader::new(input, params.fill_order);
        let mut out = Vec::with_capacity(params.expected_len);

        // Entries 0..=255 are literal bytes; 256 and 257 are placeholders.
        let mut table: Vec<Vec<u8>> = Vec::with_capacity(4096);
        reset_table(&mut table);
        let mut width = 9;
        let mut previous: Option<u16> = None;

        while let Some(code) = reader.read(width) {
            if code == EOI_CODE {
                break;
            }
            if code == CLEAR_CODE {
                reset_table(&mut table);
                width = 9;
                previous = None;
                continue;
            }

            let entry: Vec<u8> = if (code as usize) < table.len() && code != CLEAR_CODE {
                table[code as usize].clone()
            } else if code as usize == table.len() {
                // The classic "code not yet in table" case: previous string
                // plus its own first byte.
                let prev = previous.ok_or_else(|| {
                    TiffError::corrupt("lzw", format!("dangling code {code} after clear"))
                })?;
                let mut s = table[prev as usize].clone();
                s.push(s[0]);
                s
            } else {
                return Err(TiffError::corrupt(
                    "lzw",
                    format!("code {code} beyond table of {}", table.len()),
                ));
            };

            if out.len() + entry.len() > params.expected_len {
                return Err(TiffError::corrupt(
                    "lzw",
                    format!("decoded stream exceeds the declared {} bytes", params.expected_len),
                ));
            }
            out.extend_from_slice(&entry);

            if let Some(prev) = previous {
                let mut s = table[prev as usize].clone();
                s.push(entry[0]);
                table.push(s);
                match table.len() {
                    WIDEN_AT_510 => width = 10,
                    WIDEN_AT_1022 => width = 11,
                    WIDEN_AT_2046 => width = 12,
                    4096 => {
                        return Err(TiffError::corrupt(
                            "lzw",
                            "table overflow without a clear code",
                        ))
                    }
                    _ => {}
                }
            }
            previous = Some(code);
        }

        Ok(out)
    }

    fn encode(&self, input: &[u8], _params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let mut writer = BitWriter::new();
        // (prefix code, next byte) -> code
        let mut table: std::collections::HashMap<(u16, u8), u16> =
            std::collections::HashMap::new();
        let mut next_code = FIRST_DYNAMIC_CODE;
        let mut width = 9;

        writer.write(CLEAR_CODE, width);

        let mut iter = input.iter();
        let Some(&first) = iter.next() else {
            writer.write(EOI_CODE, width);
            return Ok(writer.finish());
        };
        let mut current: u16 = first as u16;

        for &byte in iter {
            if let Some(&code) = table.get(&(current, byte)) {
                current = code;
                continue;
            }

            writer.write(current, width);
            table.insert((current, byte), next_code);
            next_code += 1;
            // Encoder widens one code later than the decoder; the decoder's
            // table lags one entry behind.
            match next_code {
                511 => width = 10,
                1023 => width = 11,
                2047 => width = 12,
                ENCODER_RESET_AT => {
                    writer.write(CLEAR_CODE, width);
                    table.clear();
                    next_code = FIRST_DYNAMIC_CODE;
                    width = 9;
                }
                _ => {}
            }
            current = byte as u16;
        }

        writer.write(current, width);
        writer.write(EOI_CODE, width);
        Ok(writer.finish())
    }
}

fn reset_table(table: &mut Vec<Vec<u8>>) {
    table.clear();
    for b in 0..=255u8 {
        table.push(vec![b]);
    }
    table.push(Vec::new()); // 256: clear
    table.push(Vec::new()); // 257: eoi
}

// =============================================================================
// Bit packing
// =============================================================================

/// MSB-first variable-width code reader.
struct BitReader<'a> {
    data: &'a [u8],
    fill_order: FillOrder,
    pos: usize,
    acc: u32,
    acc_bits: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8], fill_order: FillOrder) -> Self {
        BitReader {
            data,
            fill_order,
            pos: 0,
            acc: 0,
            acc_bits: 0,
        }
    }

    /// Next `width`-bit code, or `None` once the stream can no longer
    /// supply one (trailing pad bits included).
    fn read(&mut self, width: u8) -> Option<u16> {
        while self.acc_bits < width {
            if self.pos >= self.data.len() {
                return None;
            }
            let mut byte = self.data[self.pos];
            if self.fill_order == FillOrder::Lsb {
                byte = byte.reverse_bits();
            }
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u32;
            self.acc_bits += 8;
        }
        self.acc_bits -= width;
        let code = (self.acc >> self.acc_bits) as u16 & ((1u16 << width) - 1);
        Some(code)
    }
}

/// MSB-first variable-width code writer.
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    acc_bits: u8,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            out: Vec::new(),
            acc: 0,
            acc_bits: 0,
        }
    }

    fn write(&mut self, code: u16, width: u8) {
        self.acc = (self.acc << width) | code as u32;
        self.acc_bits += width;
        while self.acc_bits >= 8 {
            self.acc_bits -= 8;
            self.out.push((self.acc >> self.acc_bits) as u8);
        }
    }

    /// Pad the final partial byte with zero bits.
    fn finish(mut self) -> Vec<u8> {
        if self.acc_bits > 0 {
            self.out
                .push(((self.acc << (8 - self.acc_bits)) & 0xFF) as u8);
        }
        self.out
    }
}

// =============================================================================
// Tests
// =============================================================================
