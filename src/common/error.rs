use thiserror::Error;

use super::{codec::Mode, metadata::ECLevel};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum QRError {
    // QR builder
    #[error("Empty data")]
    EmptyData,
    #[error("Invalid character {ch:?} for {mode:?} mode")]
    InvalidCharacter { ch: char, mode: Mode },
    #[error("Capacity exceeded: {required} bits required, {available} bits available")]
    CapacityExceeded { required: usize, available: usize },
    #[error("Block {block} of group {group} has no data codewords")]
    EmptyBlock { group: usize, block: usize },
    #[error("Codeword underflow: {codewords} codewords left unplaced cells in a capacity of {capacity} modules")]
    CodewordUnderflow { codewords: usize, capacity: usize },
    #[error("Codeword overflow: {codewords} codewords don't fit a capacity of {capacity} modules")]
    CodewordOverflow { codewords: usize, capacity: usize },
    #[error("Missing encoding property for version {version}, ec level {ec_level:?}")]
    MissingEncodingProperty { version: u8, ec_level: ECLevel },
    #[error("Invalid version {0}")]
    InvalidVersion(u8),
    #[error("Invalid masking pattern {0}")]
    InvalidMaskingPattern(u8),
    #[error("Invalid capacity table row at line {line}")]
    InvalidCapacityRow { line: usize },
    #[error("Invalid subdivision {subdivision} for dot size {dot_size}")]
    InvalidSubdivision { subdivision: usize, dot_size: usize },

    // Read back
    #[error("Too many errors to correct successfully")]
    TooManyError,
    #[error("Invalid format info detected")]
    InvalidFormatInfo,
    #[error("Invalid version info detected")]
    InvalidVersionInfo,
    #[error("Read back data doesn't match encoded data")]
    DataMismatch,
}

pub type QRResult<T> = Result<T, QRError>;
