//! CCITT Group 3 and Group 4 bilevel codecs (Compression = 3 and 4).
//!
//! Group 3 here is the one-dimensional T.4 Modified Huffman scheme: each
//! row is an alternating sequence of white and black run lengths drawn from
//! per-color Huffman tables. The encoder byte-aligns every row and writes
//! no EOL codes; the decoder also accepts the EOL-delimited layout some fax
//! producers emit.
//!
//! Group 4 is the T.6 two-dimensional scheme: each row is coded against the
//! previous (reference) row using pass, horizontal, and vertical modes, with
//! an all-white imaginary reference line above the first row.
//!
//! Decoded pixels are one bit each, MSB-first within a byte, and a 0 bit is
//! a white pixel.

use crate::error::TiffError;

use super::{Codec, CodecParams, FillOrder};

// =============================================================================
// T.4 run-length code tables
// =============================================================================

// (code length in bits, code value). Indexed by run length 0..=63.
#[rustfmt::skip]
const WHITE_TERMINATING: [(u8, u16); 64] = [
    (8, 0x35), (6, 0x07), (4, 0x07), (4, 0x08), (4, 0x0B), (4, 0x0C), (4, 0x0E), (4, 0x0F),
    (5, 0x13), (5, 0x14), (5, 0x07), (5, 0x08), (6, 0x08), (6, 0x03), (6, 0x34), (6, 0x35),
    (6, 0x2A), (6, 0x2B), (7, 0x27), (7, 0x0C), (7, 0x08), (7, 0x17), (7, 0x03), (7, 0x04),
    (7, 0x28), (7, 0x2B), (7, 0x13), (7, 0x24), (7, 0x18), (8, 0x02), (8, 0x03), (8, 0x1A),
    (8, 0x1B), (8, 0x12), (8, 0x13), (8, 0x14), (8, 0x15), (8, 0x16), (8, 0x17), (8, 0x28),
    (8, 0x29), (8, 0x2A), (8, 0x2B), (8, 0x2C), (8, 0x2D), (8, 0x04), (8, 0x05), (8, 0x0A),
    (8, 0x0B), (8, 0x52), (8, 0x53), (8, 0x54), (8, 0x55), (8, 0x24), (8, 0x25), (8, 0x58),
    (8, 0x59), (8, 0x5A), (8, 0x5B), (8, 0x4A), (8, 0x4B), (8, 0x32), (8, 0x33), (8, 0x34),
];

#[rustfmt::skip]
const BLACK_TERMINATING: [(u8, u16); 64] = [
    (10, 0x37), (3, 0x02),  (2, 0x03),  (2, 0x02),  (3, 0x03),  (4, 0x03),  (4, 0x02),  (5, 0x03),
    (6, 0x05),  (6, 0x04),  (7, 0x04),  (7, 0x05),  (7, 0x07),  (8, 0x04),  (8, 0x07),  (9, 0x18),
    (10, 0x17), (10, 0x18), (10, 0x08), (11, 0x67), (11, 0x68), (11, 0x6C), (11, 0x37), (11, 0x28),
    (11, 0x17), (11, 0x18), (12, 0xCA), (12, 0xCB), (12, 0xCC), (12, 0xCD), (12, 0x68), (12, 0x69),
    (12, 0x6A), (12, 0x6B), (12, 0xD2), (12, 0xD3), (12, 0xD4), (12, 0xD5), (12, 0xD6), (12, 0xD7),
    (12, 0x6C), (12, 0x6D), (12, 0xDA), (12, 0xDB), (12, 0x54), (12, 0x55), (12, 0x56), (12, 0x57),
    (12, 0x64), (12, 0x65), (12, 0x52), (12, 0x53), (12, 0x24), (12, 0x37), (12, 0x38), (12, 0x27),
    (12, 0x28), (12, 0x58), (12, 0x59), (12, 0x2B), (12, 0x2C), (12, 0x5A), (12, 0x66), (12, 0x67),
];

// Makeup codes for runs 64, 128, .. 1728. Indexed by run / 64 - 1.
#[rustfmt::skip]
const WHITE_MAKEUP: [(u8, u16); 27] = [
    (5, 0x1B), (5, 0x12), (6, 0x17), (7, 0x37), (8, 0x36), (8, 0x37), (8, 0x64),
    (8, 0x65), (8, 0x68), (8, 0x67), (9, 0xCC), (9, 0xCD), (9, 0xD2), (9, 0xD3),
    (9, 0xD4), (9, 0xD5), (9, 0xD6), (9, 0xD7), (9, 0xD8), (9, 0xD9), (9, 0xDA),
    (9, 0xDB), (9, 0x98), (9, 0x99), (9, 0x9A), (6, 0x18), (9, 0x9B),
];

#[rustfmt::skip]
const BLACK_MAKEUP: [(u8, u16); 27] = [
    (10, 0x0F), (12, 0xC8), (12, 0xC9), (12, 0x5B), (12, 0x33), (12, 0x34), (12, 0x35),
    (13, 0x6C), (13, 0x6D), (13, 0x4A), (13, 0x4B), (13, 0x4C), (13, 0x4D), (13, 0x72),
    (13, 0x73), (13, 0x74), (13, 0x75), (13, 0x76), (13, 0x77), (13, 0x52), (13, 0x53),
    (13, 0x54), (13, 0x55), (13, 0x5A), (13, 0x5B), (13, 0x64), (13, 0x65),
];

// Extended makeup codes for runs 1792, 1856, .. 2560, shared by both colors.
// Indexed by (run - 1792) / 64.
#[rustfmt::skip]
const EXTENDED_MAKEUP: [(u8, u16); 13] = [
    (11, 0x08), (11, 0x0C), (11, 0x0D), (12, 0x12), (12, 0x13), (12, 0x14), (12, 0x15),
    (12, 0x16), (12, 0x17), (12, 0x1C), (12, 0x1D), (12, 0x1E), (12, 0x1F),
];

/// Match an accumulated (length, bits) pair against the run tables for one
/// color. The tables are prefix-free, so the first hit is the code.
fn lookup_run(white: bool, len: u8, bits: u16) -> Option<usize> {
    let terminating = if white {
        &WHITE_TERMINATING
    } else {
        &BLACK_TERMINATING
    };
    if let Some(run) = terminating.iter().position(|&c| c == (len, bits)) {
        return Some(run);
    }
    let makeup = if white { &WHITE_MAKEUP } else { &BLACK_MAKEUP };
    if let Some(i) = makeup.iter().position(|&c| c == (len, bits)) {
        return Some((i + 1) * 64);
    }
    EXTENDED_MAKEUP
        .iter()
        .position(|&c| c == (len, bits))
        .map(|i| 1792 + i * 64)
}

// =============================================================================
// Bit cursor / sink
// =============================================================================

/// MSB-first bit reader over a compressed chunk. FillOrder = 2 streams are
/// normalized by reversing each byte up front.
struct BitCursor {
    data: Vec<u8>,
    bit: usize,
}

impl BitCursor {
    fn new(input: &[u8], fill_order: FillOrder) -> Self {
        let data = match fill_order {
            FillOrder::Msb => input.to_vec(),
            FillOrder::Lsb => input.iter().map(|b| b.reverse_bits()).collect(),
        };
        BitCursor { data, bit: 0 }
    }

    fn next_bit(&mut self) -> Option<u16> {
        let byte = *self.data.get(self.bit / 8)?;
        let b = (byte >> (7 - self.bit % 8)) & 1;
        self.bit += 1;
        Some(b as u16)
    }

    fn align_to_byte(&mut self) {
        self.bit = (self.bit + 7) & !7;
    }
}

/// MSB-first bit writer.
struct BitSink {
    out: Vec<u8>,
    acc: u32,
    acc_bits: u8,
}

impl BitSink {
    fn new() -> Self {
        BitSink {
            out: Vec::new(),
            acc: 0,
            acc_bits: 0,
        }
    }

    fn push(&mut self, bits: u16, len: u8) {
        self.acc = (self.acc << len) | bits as u32;
        self.acc_bits += len;
        while self.acc_bits >= 8 {
            self.acc_bits -= 8;
            self.out.push((self.acc >> self.acc_bits) as u8);
        }
    }

    /// Zero-pad to the next byte boundary.
    fn align_to_byte(&mut self) {
        if self.acc_bits > 0 {
            let pad = 8 - self.acc_bits;
            self.push(0, pad);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.out
    }
}

// =============================================================================
// Run token reading
// =============================================================================

#[derive(Debug, PartialEq)]
enum Token {
    /// A complete run length (makeup codes already folded in)
    Run(usize),
    /// An EOL code, possibly preceded by fill bits
    Eol,
    /// Clean end of the compressed stream
    End,
}

/// Read one Huffman code for the given color.
///
/// EOL is eleven or more zeros followed by a one; fill bits before an EOL
/// are absorbed. Trailing pad bits at the end of the stream read as `End`.
fn read_code(cursor: &mut BitCursor, white: bool) -> Result<Token, TiffError> {
    let mut bits: u16 = 0;
    let mut len: u8 = 0;
    loop {
        let Some(b) = cursor.next_bit() else {
            if bits == 0 {
                return Ok(Token::End);
            }
            return Err(TiffError::corrupt("ccitt", "stream ends inside a code"));
        };
        bits = (bits << 1) | b;
        len = len.saturating_add(1);
        if bits == 0 {
            // Zeros can only continue toward an EOL; no cap, fill bits are
            // legal in EOL-delimited streams.
            continue;
        }
        if let Some(run) = lookup_run(white, len, bits) {
            return Ok(Token::Run(run));
        }
        if bits == 1 && len >= 12 {
            return Ok(Token::Eol);
        }
        if len >= 14 {
            return Err(TiffError::corrupt(
                "ccitt",
                format!("no {} run code matches {bits:0len$b}", color_name(white), len = len as usize),
            ));
        }
    }
}

/// Read one full run: zero or more makeup codes then a terminating code.
fn read_run(cursor: &mut BitCursor, white: bool) -> Result<Token, TiffError> {
    let mut total = 0usize;
    loop {
        match read_code(cursor, white)? {
            Token::Run(r) if r >= 64 => total += r,
            Token::Run(r) => return Ok(Token::Run(total + r)),
            other => {
                if total != 0 {
                    return Err(TiffError::corrupt(
                        "ccitt",
                        "makeup code without a terminating code",
                    ));
                }
                return Ok(other);
            }
        }
    }
}

/// Emit one run as makeup + terminating codes.
fn write_run(sink: &mut BitSink, mut run: usize, white: bool) {
    while run >= 2624 {
        let (len, bits) = EXTENDED_MAKEUP[12]; // 2560
        sink.push(bits, len);
        run -= 2560;
    }
    if run >= 64 {
        let makeup = run / 64 * 64;
        let (len, bits) = if makeup >= 1792 {
            EXTENDED_MAKEUP[(makeup - 1792) / 64]
        } else if white {
            WHITE_MAKEUP[makeup / 64 - 1]
        } else {
            BLACK_MAKEUP[makeup / 64 - 1]
        };
        sink.push(bits, len);
        run -= makeup;
    }
    let (len, bits) = if white {
        WHITE_TERMINATING[run]
    } else {
        BLACK_TERMINATING[run]
    };
    sink.push(bits, len);
}

fn color_name(white: bool) -> &'static str {
    if white {
        "white"
    } else {
        "black"
    }
}

// =============================================================================
// Row <-> transition helpers
// =============================================================================

/// Positions where the pixel color changes, scanning left to right with an
/// implied white start. Strictly increasing, all < width.
fn transitions_of_row(row: &[u8], width: usize) -> Vec<usize> {
    let mut changes = Vec::new();
    let mut color_black = false;
    for x in 0..width {
        let bit = (row[x / 8] >> (7 - x % 8)) & 1 == 1;
        if bit != color_black {
            changes.push(x);
            color_black = bit;
        }
    }
    changes
}

/// Render a transition list into packed row bytes (black = 1 bits).
fn row_from_transitions(changes: &[usize], width: usize, row: &mut [u8]) {
    let mut i = 0;
    while i < changes.len() {
        let from = changes[i].min(width);
        let to = changes.get(i + 1).copied().unwrap_or(width).min(width);
        for x in from..to {
            row[x / 8] |= 0x80 >> (x % 8);
        }
        i += 2;
    }
}

/// First reference-line changing element right of `a0` with the color the
/// current run would change to, and the one after it. Positions past the
/// last change read as `width`.
fn find_b(changes: &[usize], a0: isize, color_white: bool, width: usize) -> (usize, usize) {
    let parity = usize::from(!color_white);
    let mut i = parity;
    while i < changes.len() {
        if changes[i] as isize > a0 {
            let b1 = changes[i];
            let b2 = changes.get(i + 1).copied().unwrap_or(width);
            return (b1, b2);
        }
        i += 2;
    }
    (width, width)
}

/// First element of `changes` strictly right of `a0`, else `width`.
fn next_change(changes: &[usize], a0: isize, width: usize) -> usize {
    changes
        .iter()
        .copied()
        .find(|&c| c as isize > a0)
        .unwrap_or(width)
}

fn rows_geometry(params: &CodecParams) -> Result<(usize, usize), TiffError> {
    let width = params.pixel_width;
    let stride = params.row_stride;
    if width == 0 || stride == 0 || stride < (width + 7) / 8 {
        return Err(TiffError::corrupt(
            "ccitt",
            format!("unusable row geometry: width {width}, stride {stride}"),
        ));
    }
    Ok((width, stride))
}

// =============================================================================
// Group 3 (T.4 one-dimensional Modified Huffman)
// =============================================================================

pub struct Group3;

impl Codec for Group3 {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let (width, stride) = rows_geometry(params)?;
        let mut cursor = BitCursor::new(input, params.fill_order);
        let mut out = Vec::with_capacity(params.expected_len);

        // EOL-delimited streams lead with an EOL; byte-aligned ones never
        // contain it. Sniff once and stay in that layout.
        let mut probe = BitCursor {
            data: cursor.data.clone(),
            bit: 0,
        };
        let eol_delimited = matches!(read_code(&mut probe, true)?, Token::Eol);

        'rows: while out.len() + stride <= params.expected_len {
            let mut row = vec![0u8; stride];
            let mut total = 0usize;
            let mut white = true;

            while total < width {
                match read_run(&mut cursor, white)? {
                    Token::Run(run) => {
                        if total + run > width {
                            return Err(TiffError::corrupt(
                                "ccitt",
                                format!("row overruns width {width}"),
                            ));
                        }
                        if !white {
                            for x in total..total + run {
                                row[x / 8] |= 0x80 >> (x % 8);
                            }
                        }
                        total += run;
                        white = !white;
                    }
                    Token::Eol => {
                        if total != 0 {
                            return Err(TiffError::corrupt("ccitt", "EOL inside a row"));
                        }
                        continue; // row separator (or RTC tail)
                    }
                    Token::End => {
                        if total != 0 {
                            return Err(TiffError::corrupt(
                                "ccitt",
                                "stream ends mid-row",
                            ));
                        }
                        break 'rows; // short final strip
                    }
                }
            }

            out.extend_from_slice(&row);
            if !eol_delimited {
                cursor.align_to_byte();
            }
        }

        Ok(out)
    }

    fn encode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let (width, stride) = rows_geometry(params)?;
        if input.len() % stride != 0 {
            return Err(TiffError::corrupt(
                "ccitt",
                format!("input of {} bytes is not whole rows of {stride}", input.len()),
            ));
        }

        let mut sink = BitSink::new();
        for row in input.chunks_exact(stride) {
            let changes = transitions_of_row(row, width);
            let mut white = true;
            let mut pos = 0usize;
            // A row that opens black still begins with a (zero) white run.
            for &change in changes.iter().chain(std::iter::once(&width)) {
                write_run(&mut sink, change - pos, white);
                pos = change;
                white = !white;
            }
            sink.align_to_byte();
        }
        Ok(sink.finish())
    }
}

// =============================================================================
// Group 4 (T.6 two-dimensional)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Pass,
    Horizontal,
    Vertical(i8),
}

/// Read one T.6 mode code; `None` marks EOFB or the end of the stream.
fn read_mode(cursor: &mut BitCursor) -> Result<Option<Mode>, TiffError> {
    let mut bits: u16 = 0;
    let mut len = 0u8;
    loop {
        let Some(b) = cursor.next_bit() else {
            if bits == 0 {
                return Ok(None);
            }
            return Err(TiffError::corrupt("ccitt", "stream ends inside a mode code"));
        };
        bits = (bits << 1) | b;
        len += 1;
        let mode = match (len, bits) {
            (1, 0b1) => Some(Mode::Vertical(0)),
            (3, 0b011) => Some(Mode::Vertical(1)),
            (3, 0b010) => Some(Mode::Vertical(-1)),
            (3, 0b001) => Some(Mode::Horizontal),
            (4, 0b0001) => Some(Mode::Pass),
            (6, 0b000011) => Some(Mode::Vertical(2)),
            (6, 0b000010) => Some(Mode::Vertical(-2)),
            (7, 0b0000011) => Some(Mode::Vertical(3)),
            (7, 0b0000010) => Some(Mode::Vertical(-3)),
            _ => None,
        };
        if let Some(mode) = mode {
            return Ok(Some(mode));
        }
        if bits == 0 {
            if len >= 7 {
                // A zero run this long can only be EOL/EOFB; swallow it.
                while let Some(b) = cursor.next_bit() {
                    if b == 1 {
                        break;
                    }
                }
                return Ok(None);
            }
            continue;
        }
        if len >= 7 {
            return Err(TiffError::corrupt(
                "ccitt",
                format!("no mode code matches {bits:0len$b}", len = len as usize),
            ));
        }
    }
}

fn write_mode(sink: &mut BitSink, mode: Mode) {
    match mode {
        Mode::Vertical(0) => sink.push(0b1, 1),
        Mode::Vertical(1) => sink.push(0b011, 3),
        Mode::Vertical(-1) => sink.push(0b010, 3),
        Mode::Vertical(2) => sink.push(0b000011, 6),
        Mode::Vertical(-2) => sink.push(0b000010, 6),
        Mode::Vertical(3) => sink.push(0b0000011, 7),
        Mode::Vertical(-3) => sink.push(0b0000010, 7),
        Mode::Horizontal => sink.push(0b001, 3),
        Mode::Pass => sink.push(0b0001, 4),
        Mode::Vertical(_) => unreachable!("vertical offsets are clamped to 3"),
    }
}

pub struct Group4;

impl Codec for Group4 {
    fn decode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let (width, stride) = rows_geometry(params)?;
        let mut cursor = BitCursor::new(input, params.fill_order);
        let mut out = Vec::with_capacity(params.expected_len);
        let mut reference: Vec<usize> = Vec::new(); // imaginary all-white line

        while out.len() + stride <= params.expected_len {
            let Some(changes) = decode_t6_row(&mut cursor, &reference, width)? else {
                break; // EOFB or clean stream end
            };
            let mut row = vec![0u8; stride];
            row_from_transitions(&changes, width, &mut row);
            out.extend_from_slice(&row);
            reference = changes;
        }

        Ok(out)
    }

    fn encode(&self, input: &[u8], params: &CodecParams) -> Result<Vec<u8>, TiffError> {
        let (width, stride) = rows_geometry(params)?;
        if input.len() % stride != 0 {
            return Err(TiffError::corrupt(
                "ccitt",
                format!("input of {} bytes is not whole rows of {stride}", input.len()),
            ));
        }

        let mut sink = BitSink::new();
        let mut reference: Vec<usize> = Vec::new();
        for row in input.chunks_exact(stride) {
            let changes = transitions_of_row(row, width);
            encode_t6_row(&mut sink, &reference, &changes, width);
            reference = changes;
        }
        // EOFB: two EOL codes.
        sink.push(0x001, 12);
        sink.push(0x001, 12);
        Ok(sink.finish())
    }
}

/// Decode one coding line against the reference line's changing elements.
///
/// Returns the new line's transitions, or `None` at EOFB / stream end.
fn decode_t6_row(
    cursor: &mut BitCursor,
    reference: &[usize],
    width: usize,
) -> Result<Option<Vec<usize>>, TiffError> {
    let mut changes: Vec<usize> = Vec::new();
    let mut a0: isize = -1;
    let mut white = true;

    while a0 < width as isize {
        let Some(mode) = read_mode(cursor)? else {
            if a0 == -1 {
                return Ok(None);
            }
            return Err(TiffError::corrupt("ccitt", "stream ends mid-row"));
        };

        match mode {
            Mode::Pass => {
                let (_, b2) = find_b(reference, a0, white, width);
                a0 = b2 as isize;
            }
            Mode::Vertical(delta) => {
                let (b1, _) = find_b(reference, a0, white, width);
                let a1 = b1 as isize + delta as isize;
                if a1 <= a0 && a0 != -1 || a1 < 0 || a1 > width as isize {
                    return Err(TiffError::corrupt(
                        "ccitt",
                        format!("vertical mode lands at {a1} from {a0}"),
                    ));
                }
                changes.push(a1 as usize);
                a0 = a1;
                white = !white;
            }
            Mode::Horizontal => {
                let start = a0.max(0) as usize;
                let r1 = expect_run(cursor, white)?;
                let r2 = expect_run(cursor, !white)?;
                let a1 = start + r1;
                let a2 = a1 + r2;
                if a2 > width || (a2 as isize) <= a0 {
                    return Err(TiffError::corrupt(
                        "ccitt",
                        format!("horizontal runs {r1}+{r2} land at {a2} from {a0}"),
                    ));
                }
                changes.push(a1);
                changes.push(a2);
                a0 = a2 as isize;
            }
        }
    }

    changes.retain(|&c| c < width);
    Ok(Some(changes))
}

fn expect_run(cursor: &mut BitCursor, white: bool) -> Result<usize, TiffError> {
    match read_run(cursor, white)? {
        Token::Run(r) => Ok(r),
        _ => Err(TiffError::corrupt(
            "ccitt",
            "horizontal mode missing its run codes",
        )),
    }
}

/// Encode one coding line against the reference line.
fn encode_t6_row(sink: &mut BitSink, reference: &[usize], changes: &[usize], width: usize) {
    let mut a0: isize = -1;
    let mut white = true;

    while a0 < width as isize {
        let a1 = next_change(changes, a0, width);
        let (b1, b2) = find_b(reference, a0, white, width);

        if b2 < a1 {
            write_mode(sink, Mode::Pass);
            a0 = b2 as isize;
        } else if (a1 as isize - b1 as isize).unsigned_abs() <= 3 {
            write_mode(sink, Mode::Vertical((a1 as isize - b1 as isize) as i8));
            a0 = a1 as isize;
            white = !white;
        } else {
            let a2 = next_change(changes, a1 as isize, width);
            let start = a0.max(0) as usize;
            write_mode(sink, Mode::Horizontal);
            write_run(sink, a1 - start, white);
            write_run(sink, a2 - a1, !white);
            a0 = a2 as isize;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: usize, rows: usize) -> CodecParams {
        let stride = (width + 7) / 8;
        CodecParams {
            expected_len: stride * rows,
            pixel_width: width,
            row_stride: stride,
            fill_order: FillOrder::Msb,
        }
    }

    /// Bit row builder: '1' = black, '.' or '0' = white.
    fn bitmap(rows: &[&str]) -> (Vec<u8>, CodecParams) {
        let width = rows[0].len();
        let stride = (width + 7) / 8;
        let mut out = vec![0u8; stride * rows.len()];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '1' {
                    out[y * stride + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        (out, params(width, rows.len()))
    }

    fn roundtrip<C: Codec>(codec: &C, rows: &[&str]) {
        let (data, p) = bitmap(rows);
        let encoded = codec.encode(&data, &p).unwrap();
        assert_eq!(codec.decode(&encoded, &p).unwrap(), data);
    }

    // -------------------------------------------------------------------------
    // Table sanity
    // -------------------------------------------------------------------------

    #[test]
    fn test_tables_are_prefix_consistent() {
        // Every code decodes back to the run it encodes, both colors.
        for run in 0..64usize {
            for white in [true, false] {
                let (len, bits) = if white {
                    WHITE_TERMINATING[run]
                } else {
                    BLACK_TERMINATING[run]
                };
                assert_eq!(lookup_run(white, len, bits), Some(run), "run {run}");
            }
        }
        for i in 0..27usize {
            assert_eq!(
                lookup_run(true, WHITE_MAKEUP[i].0, WHITE_MAKEUP[i].1),
                Some((i + 1) * 64)
            );
            assert_eq!(
                lookup_run(false, BLACK_MAKEUP[i].0, BLACK_MAKEUP[i].1),
                Some((i + 1) * 64)
            );
        }
        for i in 0..13usize {
            let (len, bits) = EXTENDED_MAKEUP[i];
            assert_eq!(lookup_run(true, len, bits), Some(1792 + i * 64));
            assert_eq!(lookup_run(false, len, bits), Some(1792 + i * 64));
        }
    }

    #[test]
    fn test_run_io_roundtrip() {
        for run in [0usize, 1, 7, 63, 64, 100, 1728, 1791, 1792, 2560, 2623, 2624, 6000] {
            for white in [true, false] {
                let mut sink = BitSink::new();
                write_run(&mut sink, run, white);
                sink.push(1, 1); // stop bit so padding is not read as End
                let mut cursor = BitCursor::new(&sink.finish(), FillOrder::Msb);
                assert_eq!(
                    read_run(&mut cursor, white).unwrap(),
                    Token::Run(run),
                    "run {run} white {white}"
                );
            }
        }
    }

    // -------------------------------------------------------------------------
    // Group 3
    // -------------------------------------------------------------------------

    #[test]
    fn test_g3_known_bytes_all_white_row() {
        // White run of 8 is 10011 (5 bits), zero padded to 0x98.
        let (data, p) = bitmap(&["........"]);
        let encoded = Group3.encode(&data, &p).unwrap();
        assert_eq!(encoded, vec![0x98]);
        assert_eq!(Group3.decode(&encoded, &p).unwrap(), data);
    }

    #[test]
    fn test_g3_known_bytes_all_black_row() {
        // Zero white run (00110101) then black 8 (000101), padded: 0x35 0x14.
        let (data, p) = bitmap(&["11111111"]);
        let encoded = Group3.encode(&data, &p).unwrap();
        assert_eq!(encoded, vec![0x35, 0x14]);
        assert_eq!(Group3.decode(&encoded, &p).unwrap(), data);
    }

    #[test]
    fn test_g3_roundtrip_patterns() {
        roundtrip(&Group3, &["1..1..1..1", ".11.11.11.", "1111111111", ".........."]);
        roundtrip(&Group3, &["1"]); // 1x1 black
        // Width that is not a byte multiple, alternating rows.
        roundtrip(&Group3, &["111...111...1", "...111...111.", "1111111111111"]);
    }

    #[test]
    fn test_g3_long_runs_use_makeup_codes() {
        let wide: String = std::iter::repeat('.')
            .take(1800)
            .chain(std::iter::repeat('1').take(2700))
            .collect();
        roundtrip(&Group3, &[&wide]);
    }

    #[test]
    fn test_g3_decodes_eol_delimited_stream() {
        // EOL, white 5, black 3, EOL, black 0-white... second row inverted.
        let mut sink = BitSink::new();
        sink.push(0x001, 12); // EOL
        write_run(&mut sink, 5, true);
        write_run(&mut sink, 3, false);
        sink.push(0x001, 12);
        write_run(&mut sink, 0, true);
        write_run(&mut sink, 3, false);
        write_run(&mut sink, 5, true);
        let encoded = sink.finish();

        let (expected, p) = bitmap(&[".....111", "111....."]);
        assert_eq!(Group3.decode(&encoded, &p).unwrap(), expected);
    }

    #[test]
    fn test_g3_short_final_strip() {
        // Two rows of data against a three-row budget: decoder stops clean.
        let (data, _) = bitmap(&["..11..11", "11..11.."]);
        let p2 = params(8, 2);
        let encoded = Group3.encode(&data, &p2).unwrap();
        let p3 = params(8, 3);
        assert_eq!(Group3.decode(&encoded, &p3).unwrap(), data);
    }

    #[test]
    fn test_g3_row_overrun_is_corrupt() {
        // A single run of 9 against width 8.
        let mut sink = BitSink::new();
        write_run(&mut sink, 9, true);
        let encoded = sink.finish();
        assert!(Group3.decode(&encoded, &params(8, 1)).is_err());
    }

    #[test]
    fn test_g3_lsb_fill_order() {
        let (data, p) = bitmap(&["1.1.1.1."]);
        let encoded = Group3.encode(&data, &p).unwrap();
        let reversed: Vec<u8> = encoded.iter().map(|b| b.reverse_bits()).collect();
        let lsb = CodecParams {
            fill_order: FillOrder::Lsb,
            ..p
        };
        assert_eq!(Group3.decode(&reversed, &lsb).unwrap(), data);
    }

    // -------------------------------------------------------------------------
    // Group 4
    // -------------------------------------------------------------------------

    #[test]
    fn test_g4_all_white_uses_vertical_mode() {
        // Each all-white row codes as a single V0 bit.
        let (data, p) = bitmap(&["........", "........"]);
        let encoded = Group4.encode(&data, &p).unwrap();
        // 1, 1, then EOFB (two 12-bit EOLs), padded: 26 bits -> 4 bytes.
        assert_eq!(encoded, vec![0xC0, 0x04, 0x00, 0x40]);
        assert_eq!(Group4.decode(&encoded, &p).unwrap(), data);
    }

    #[test]
    fn test_g4_roundtrip_patterns() {
        roundtrip(&Group4, &["........", "........"]);
        roundtrip(&Group4, &["11111111", "11111111"]);
        roundtrip(&Group4, &["1.......", ".1......", "..1.....", "...1...."]);
        // Pass mode: black region in the reference row vanishes below.
        roundtrip(&Group4, &["..1111..", "........"]);
        // Horizontal mode: black region appears far from any reference edge.
        roundtrip(&Group4, &["1...............", ".......1111....."]);
        // Rows starting black.
        roundtrip(&Group4, &["111.....", "1111111.", "........"]);
    }

    #[test]
    fn test_g4_roundtrip_non_byte_width() {
        roundtrip(&Group4, &["1.1.1.1.1.1", "..111....11", "11111111111"]);
    }

    #[test]
    fn test_g4_roundtrip_large_checkerboard() {
        let a: String = std::iter::repeat("1.").take(40).collect();
        let b: String = std::iter::repeat(".1").take(40).collect();
        let rows: Vec<&str> = (0..30).map(|i| if i % 2 == 0 { a.as_str() } else { b.as_str() }).collect();
        roundtrip(&Group4, &rows);
    }

    #[test]
    fn test_g4_short_final_strip() {
        let (data, p2) = bitmap(&["..11..11", "11..11.."]);
        let encoded = Group4.encode(&data, &p2).unwrap();
        let p3 = params(8, 3);
        assert_eq!(Group4.decode(&encoded, &p3).unwrap(), data);
    }

    #[test]
    fn test_g4_truncated_stream_is_corrupt() {
        let (data, p) = bitmap(&["1...1...1...1...", "..11..11..11..11"]);
        let encoded = Group4.encode(&data, &p).unwrap();
        let result = Group4.decode(&encoded[..1], &p);
        // One byte cannot hold both rows; either mid-row corruption or a
        // short decode, never the full bitmap.
        match result {
            Ok(decoded) => assert!(decoded.len() < data.len()),
            Err(TiffError::CorruptStream { .. }) => {}
            Err(e) => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_geometry_required() {
        // Row-structured codecs cannot run without width and stride.
        assert!(Group3.decode(&[0x98], &CodecParams::sized(1)).is_err());
        assert!(Group4.decode(&[0xC0], &CodecParams::sized(1)).is_err());
    }
}
