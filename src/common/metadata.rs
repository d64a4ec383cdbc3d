use std::ops::Deref;

use super::{
    codec::Mode,
    error::{QRError, QRResult},
    mask::MaskPattern,
};

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    pub const ALL: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

    // Row offset of the level inside a version's slice of the capacity table
    pub fn index(self) -> usize {
        self as usize
    }

    fn format_code(self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }

    fn from_format_code(code: u32) -> Self {
        match code & 0b11 {
            0b01 => Self::L,
            0b00 => Self::M,
            0b11 => Self::Q,
            0b10 => Self::H,
            _ => unreachable!(),
        }
    }
}

// Version
//------------------------------------------------------------------------------

/// Symbol size tier, 1 to 40. The symbol is `4 * version + 17` modules wide.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    pub const MIN: Self = Self(1);

    pub const MAX: Self = Self(40);

    pub fn new(version: u8) -> QRResult<Self> {
        match version {
            1..=40 => Ok(Self(version)),
            _ => Err(QRError::InvalidVersion(version)),
        }
    }

    pub const fn width(self) -> usize {
        self.0 as usize * 4 + 17
    }

    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        match (mode, self.0) {
            (Mode::Numeric, 1..=9) => 10,
            (Mode::Numeric, 10..=26) => 12,
            (Mode::Numeric, _) => 14,
            (Mode::Alphanumeric, 1..=9) => 9,
            (Mode::Alphanumeric, 10..=26) => 11,
            (Mode::Alphanumeric, _) => 13,
            (Mode::Byte, 1..=9) => 8,
            (Mode::Byte, _) => 16,
        }
    }

    // Centre coordinates shared by rows and columns. Consecutive centres are evenly
    // spaced (at most 28 apart) between 6 and width - 7, except version 32 whose
    // spacing doesn't follow the rounding rule.
    pub fn alignment_pattern(self) -> Vec<i16> {
        let v = self.0 as i16;
        if v == 1 {
            return vec![];
        }

        let count = v / 7 + 2;
        let step = if v == 32 { 26 } else { (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2 };
        let mut res = vec![6; count as usize];
        let mut pos = self.width() as i16 - 7;
        for p in res.iter_mut().skip(1).rev() {
            *p = pos;
            pos -= step;
        }
        res
    }

    // Free cells left over once all codewords are placed
    pub fn remainder_bits(self) -> usize {
        match self.0 {
            2..=6 => 7,
            14..=20 | 28..=34 => 3,
            21..=27 => 4,
            _ => 0,
        }
    }

    // Correction codewords set aside for misdecode protection in the smallest symbols
    pub fn misdecode_codewords(self, ecl: ECLevel) -> usize {
        match (self.0, ecl) {
            (1, ECLevel::L) => 3,
            (1, ECLevel::M) | (2, ECLevel::L) => 2,
            (1, _) | (3, ECLevel::L) => 1,
            _ => 0,
        }
    }

    pub fn info(self) -> Option<u32> {
        version_info(self)
    }
}

impl Deref for Version {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod version_tests {
    use test_case::test_case;

    use super::{ECLevel, Version};
    use crate::common::codec::Mode;

    #[test]
    fn test_invalid_version() {
        assert!(Version::new(0).is_err());
        assert!(Version::new(41).is_err());
        assert_eq!(Version::new(40).unwrap().width(), 177);
        assert_eq!(Version::MIN.width(), 21);
        assert_eq!(Version::new(40), Ok(Version::MAX));
    }

    #[test_case(1, vec![])]
    #[test_case(2, vec![6, 18])]
    #[test_case(7, vec![6, 22, 38])]
    #[test_case(15, vec![6, 26, 48, 70])]
    #[test_case(32, vec![6, 34, 60, 86, 112, 138])]
    #[test_case(36, vec![6, 24, 50, 76, 102, 128, 154])]
    #[test_case(40, vec![6, 30, 58, 86, 114, 142, 170])]
    fn test_alignment_pattern(version: u8, exp: Vec<i16>) {
        assert_eq!(Version::new(version).unwrap().alignment_pattern(), exp);
    }

    #[test_case(9, Mode::Numeric, 10)]
    #[test_case(10, Mode::Numeric, 12)]
    #[test_case(27, Mode::Numeric, 14)]
    #[test_case(26, Mode::Alphanumeric, 11)]
    #[test_case(27, Mode::Alphanumeric, 13)]
    #[test_case(9, Mode::Byte, 8)]
    #[test_case(10, Mode::Byte, 16)]
    fn test_char_cnt_bits(version: u8, mode: Mode, exp: usize) {
        assert_eq!(Version::new(version).unwrap().char_cnt_bits(mode), exp);
    }

    #[test_case(1, ECLevel::L, 3)]
    #[test_case(1, ECLevel::M, 2)]
    #[test_case(1, ECLevel::Q, 1)]
    #[test_case(2, ECLevel::L, 2)]
    #[test_case(2, ECLevel::M, 0)]
    #[test_case(3, ECLevel::L, 1)]
    #[test_case(4, ECLevel::L, 0)]
    fn test_misdecode_codewords(version: u8, ecl: ECLevel, exp: usize) {
        assert_eq!(Version::new(version).unwrap().misdecode_codewords(ecl), exp);
    }
}

// Format & version info
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BIT_LEN: usize = 15;

pub const VERSION_INFO_BIT_LEN: usize = 18;

const FORMAT_GENERATOR: u32 = 0b10100110111;

const FORMAT_MASK: u32 = 0b101010000010010;

const VERSION_GENERATOR: u32 = 0b1111100100101;

// Reduces `value` modulo `generator`, one leading bit at a time
fn bch_remainder(mut value: u32, generator: u32) -> u32 {
    let gen_len = 32 - generator.leading_zeros();
    while 32 - value.leading_zeros() >= gen_len {
        let shift = (32 - value.leading_zeros()) - gen_len;
        value ^= generator << shift;
    }
    value
}

pub fn format_info(ecl: ECLevel, mask: MaskPattern) -> u32 {
    let data = (ecl.format_code() << 3) | *mask as u32;
    let rem = bch_remainder(data << 10, FORMAT_GENERATOR);
    ((data << 10) | rem) ^ FORMAT_MASK
}

pub fn version_info(ver: Version) -> Option<u32> {
    if *ver < 7 {
        return None;
    }
    let data = (*ver as u32) << 12;
    Some(data | bch_remainder(data, VERSION_GENERATOR))
}

/// Format string of every mask for one error correction level.
///
/// Entry `i` holds bit `14 - i` of the format string (most significant first); bit `m`
/// of the entry is that bit's value when mask `m` is active.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FormatInfo([u8; FORMAT_INFO_BIT_LEN]);

impl FormatInfo {
    pub fn new(ecl: ECLevel) -> Self {
        let mut bits = [0u8; FORMAT_INFO_BIT_LEN];
        for m in 0..8 {
            let info = format_info(ecl, MaskPattern::new(m));
            for (i, b) in bits.iter_mut().enumerate() {
                if info & (1 << (FORMAT_INFO_BIT_LEN - 1 - i)) != 0 {
                    *b |= 1 << m;
                }
            }
        }
        Self(bits)
    }

    pub fn masks(&self, i: usize) -> u8 {
        self.0[i]
    }

    pub fn get(&self, i: usize, mask: MaskPattern) -> bool {
        (self.0[i] >> *mask) & 1 == 1
    }
}

// Nearest valid info string within `err_capacity` bit flips
fn rectify_info(info: u32, valid_numbers: impl Iterator<Item = u32>, err_capacity: u32) -> Option<u32> {
    let res = valid_numbers.min_by_key(|&n| (info ^ n).count_ones())?;
    if (info ^ res).count_ones() <= err_capacity {
        Some(res)
    } else {
        None
    }
}

pub fn decode_format_info(info: u32) -> QRResult<(ECLevel, MaskPattern)> {
    let valid = ECLevel::ALL
        .iter()
        .flat_map(|&ecl| (0..8).map(move |m| format_info(ecl, MaskPattern::new(m))));
    let info = rectify_info(info, valid, 3).ok_or(QRError::InvalidFormatInfo)?;
    let data = (info ^ FORMAT_MASK) >> 10;
    Ok((ECLevel::from_format_code(data >> 3), MaskPattern::new((data & 0b111) as u8)))
}

pub fn decode_version_info(info: u32) -> QRResult<Version> {
    let valid = (7..=40).filter_map(|v| version_info(Version(v)));
    let info = rectify_info(info, valid, 3).ok_or(QRError::InvalidVersionInfo)?;
    Version::new((info >> 12) as u8)
}
