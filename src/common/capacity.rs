use super::{
    error::{QRError, QRResult},
    metadata::{ECLevel, Version},
};

// Encoding property
//------------------------------------------------------------------------------

/// Block structure of one (version, ec level) pair.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct EncodingProperty {
    pub ecc_per_block: usize,
    pub blocks_in_group1: usize,
    pub data_per_block_group1: usize,
    pub blocks_in_group2: usize,
    pub data_per_block_group2: usize,
}

impl EncodingProperty {
    pub fn new(row: [usize; 5]) -> Self {
        let [ecc_per_block, blocks_in_group1, data_per_block_group1, blocks_in_group2, data_per_block_group2] =
            row;
        Self {
            ecc_per_block,
            blocks_in_group1,
            data_per_block_group1,
            blocks_in_group2,
            data_per_block_group2,
        }
    }

    /// (block count, data codewords per block) of each non-empty group, group 1 first.
    pub fn groups(&self) -> impl Iterator<Item = (usize, usize)> {
        [
            (self.blocks_in_group1, self.data_per_block_group1),
            (self.blocks_in_group2, self.data_per_block_group2),
        ]
        .into_iter()
        .filter(|&(blocks, _)| blocks > 0)
    }

    pub fn block_count(&self) -> usize {
        self.blocks_in_group1 + self.blocks_in_group2
    }

    pub fn data_codewords(&self) -> usize {
        self.groups().map(|(blocks, data)| blocks * data).sum()
    }

    pub fn ecc_codewords(&self) -> usize {
        self.block_count() * self.ecc_per_block
    }

    pub fn total_codewords(&self) -> usize {
        self.data_codewords() + self.ecc_codewords()
    }

    pub fn data_bit_capacity(&self) -> usize {
        self.data_codewords() << 3
    }
}

// Capacity table
//------------------------------------------------------------------------------

const STANDARD_TABLE: &str = include_str!("capacity.csv");

/// Rows indexed by `(version - 1) * 4 + ec level index`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapacityTable {
    rows: Vec<EncodingProperty>,
}

impl CapacityTable {
    /// Table with no rows, as before any data is loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The full 40 version table.
    pub fn standard() -> QRResult<Self> {
        Self::parse(STANDARD_TABLE)
    }

    /// Parses rows of five comma separated integers. Blank lines and `#` comments are
    /// skipped.
    pub fn parse(text: &str) -> QRResult<Self> {
        let mut rows = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let err = || QRError::InvalidCapacityRow { line: i + 1 };
            let fields = line
                .split(',')
                .map(|f| f.trim().parse::<usize>().map_err(|_| err()))
                .collect::<QRResult<Vec<_>>>()?;
            let row: [usize; 5] = fields.try_into().map_err(|_| err())?;
            rows.push(EncodingProperty::new(row));
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, ver: Version, ecl: ECLevel) -> QRResult<&EncodingProperty> {
        let idx = (*ver as usize - 1) * 4 + ecl.index();
        self.rows
            .get(idx)
            .ok_or(QRError::MissingEncodingProperty { version: *ver, ec_level: ecl })
    }
}
