use std::cmp::Ordering;

use log::debug;

use super::{
    bitstream::BitStream,
    error::{QRError, QRResult},
    metadata::Version,
};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
}

impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ordered by how many characters a mode accepts
impl Ord for Mode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (a, b) if a == b => Ordering::Equal,
            (Self::Numeric, _) | (_, Self::Byte) => Ordering::Less,
            (_, Self::Numeric) | (Self::Byte, _) => Ordering::Greater,
            _ => unreachable!(),
        }
    }
}

pub const MODE_BITS: usize = 4;

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];

    /// Narrowest mode able to represent every character of `message`.
    pub fn fitting(message: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|m| message.chars().all(|ch| m.contains(ch)))
            .unwrap_or(Self::Byte)
    }

    pub fn contains(self, ch: char) -> bool {
        match self {
            Self::Numeric => ch.is_ascii_digit(),
            Self::Alphanumeric => {
                matches!(ch, '0'..='9' | 'A'..='Z' | ' ' | '$' | '%' | '*' | '+' | '-' | '.' | '/' | ':')
            }
            Self::Byte => true,
        }
    }

    #[inline]
    fn numeric_digit(char: u8) -> u16 {
        debug_assert!(char.is_ascii_digit(), "Invalid numeric data: {char}");
        (char - b'0') as u16
    }

    #[inline]
    fn alphanumeric_digit(char: u8) -> u16 {
        match char {
            b'0'..=b'9' => (char - b'0') as u16,
            b'A'..=b'Z' => (char - b'A' + 10) as u16,
            b' ' => 36,
            b'$' => 37,
            b'%' => 38,
            b'*' => 39,
            b'+' => 40,
            b'-' => 41,
            b'.' => 42,
            b'/' => 43,
            b':' => 44,
            _ => unreachable!("Invalid alphanumeric {char}"),
        }
    }

    pub fn encode_chunk(self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 10 + Self::numeric_digit(*b))
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0_u16, |n, b| n * 45 + Self::alphanumeric_digit(*b))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
        }
    }

    // Payload bits for `len` characters
    pub fn encoded_len(self, len: usize) -> usize {
        match self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
        }
    }
}


// Segment
//------------------------------------------------------------------------------

/// A run of message bytes encoded under a single mode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Segment<'a> {
    pub mode: Mode,
    pub len_bits: usize,
    pub data: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, ver: Version, message: &'a str) -> QRResult<Self> {
        if let Some(ch) = message.chars().find(|&ch| !mode.contains(ch)) {
            return Err(QRError::InvalidCharacter { ch, mode });
        }
        Ok(Self { mode, len_bits: ver.char_cnt_bits(mode), data: message.as_bytes() })
    }

    pub fn char_cnt(&self) -> usize {
        self.data.len()
    }

    // Header and payload, terminator excluded
    pub fn bit_len(&self) -> usize {
        MODE_BITS + self.len_bits + self.mode.encoded_len(self.data.len())
    }
}

// Encoder
//------------------------------------------------------------------------------

pub const STUFFING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

/// Encodes `message` into a byte aligned bit stream of header, character count,
/// payload, terminator and zero padding. `bit_capacity` is the data capacity of the
/// symbol and bounds the terminator.
pub fn encode(message: &str, mode: Mode, ver: Version, bit_capacity: usize) -> QRResult<BitStream> {
    if message.is_empty() {
        return Err(QRError::EmptyData);
    }

    let seg = Segment::new(mode, ver, message)?;
    let required = seg.bit_len();
    if required > bit_capacity || seg.char_cnt() >= 1 << seg.len_bits {
        return Err(QRError::CapacityExceeded { required, available: bit_capacity });
    }

    debug!("Encoding {} chars in {mode:?} mode: {required} of {bit_capacity} bits", seg.char_cnt());

    let mut bs = BitStream::new(bit_capacity);
    writer::push_segment(seg, &mut bs);
    writer::push_terminator(&mut bs);
    bs.pad_to_byte();
    Ok(bs)
}

/// Filler bytes taking the byte stream from `used` to `capacity` codewords.
pub fn stuffing_bytes(used: usize, capacity: usize) -> Vec<u8> {
    STUFFING_CODEWORDS.iter().copied().cycle().take(capacity.saturating_sub(used)).collect()
}

mod writer {
    use super::{BitStream, Mode, Segment, MODE_BITS};

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
        }
    }

    pub(super) fn push_header(seg: &Segment, out: &mut BitStream) {
        out.push_bits(seg.mode as u16, MODE_BITS);
        let char_cnt = seg.char_cnt();
        debug_assert!(
            char_cnt < (1 << seg.len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
            seg.len_bits
        );
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    pub(super) fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let len = Mode::Numeric.encoded_len(chunk.len());
            out.push_bits(Mode::Numeric.encode_chunk(chunk), len);
        }
    }

    pub(super) fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let len = Mode::Alphanumeric.encoded_len(chunk.len());
            out.push_bits(Mode::Alphanumeric.encode_chunk(chunk), len);
        }
    }

    pub(super) fn push_byte_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(1) {
            out.push_bits(Mode::Byte.encode_chunk(chunk), 8);
        }
    }

    // Truncated when fewer than 4 bits remain
    pub fn push_terminator(out: &mut BitStream) {
        let term_len = out.remaining().min(4);
        out.push_bits(0, term_len);
    }
}
