use std::fmt::{Display, Formatter};

use super::{
    capacity::EncodingProperty,
    ec,
    error::{QRError, QRResult},
};

// Codeword
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum CodewordKind {
    Message,
    // Filler codeword whose bits double as canvas
    Stuff,
    Correction,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct BlockId {
    pub group: usize,
    pub block: usize,
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}B{}", self.group, self.block)
    }
}

/// Non-owning link from a module to its codeword. `index` counts data codewords first,
/// then correction codewords.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct CodewordRef {
    pub block: BlockId,
    pub index: usize,
}

/// One byte of the symbol's codeword stream. `positions` holds the core matrix
/// coordinates of its 8 modules, most significant bit first, once placed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Codeword {
    pub kind: CodewordKind,
    pub value: u8,
    pub positions: Vec<(i16, i16)>,
}

impl Codeword {
    pub fn new(kind: CodewordKind, value: u8) -> Self {
        Self { kind, value, positions: Vec::with_capacity(8) }
    }

    // Bit `i` counted from the most significant end
    pub fn bit(&self, i: usize) -> bool {
        debug_assert!(i < 8, "Bit index out of range: {i}");
        (self.value >> (7 - i)) & 1 == 1
    }

    pub fn from_bits(bits: impl Iterator<Item = bool>) -> u8 {
        bits.fold(0, |acc, b| (acc << 1) | b as u8)
    }
}

// Block
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CodewordBlock {
    pub id: BlockId,
    pub data: Vec<Codeword>,
    pub ecc: Vec<Codeword>,
}

impl CodewordBlock {
    pub fn new(id: BlockId, data: Vec<Codeword>, ecc_len: usize) -> QRResult<Self> {
        if data.is_empty() {
            return Err(QRError::EmptyBlock { group: id.group, block: id.block });
        }
        let ecc = vec![Codeword::new(CodewordKind::Correction, 0); ecc_len];
        let mut block = Self { id, data, ecc };
        block.regenerate_ecc();
        Ok(block)
    }

    pub fn len(&self) -> usize {
        self.data.len() + self.ecc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> &Codeword {
        match index.checked_sub(self.data.len()) {
            Some(i) => &self.ecc[i],
            None => &self.data[index],
        }
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Codeword {
        match index.checked_sub(self.data.len()) {
            Some(i) => &mut self.ecc[i],
            None => &mut self.data[index],
        }
    }

    pub fn data_values(&self) -> Vec<u8> {
        self.data.iter().map(|cw| cw.value).collect()
    }

    pub fn ecc_values(&self) -> Vec<u8> {
        self.ecc.iter().map(|cw| cw.value).collect()
    }

    /// Replaces every correction codeword with the remainder of the current data.
    pub fn regenerate_ecc(&mut self) {
        let values = ec::ecc(&self.data_values(), self.ecc.len());
        for (cw, v) in self.ecc.iter_mut().zip(values) {
            cw.value = v;
        }
    }
}

// Group
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CodewordGroup {
    pub blocks: Vec<CodewordBlock>,
}

impl CodewordGroup {
    pub fn data_per_block(&self) -> usize {
        self.blocks.first().map_or(0, |b| b.data.len())
    }
}

pub fn block(groups: &[CodewordGroup], id: BlockId) -> &CodewordBlock {
    &groups[id.group].blocks[id.block]
}

pub fn block_mut(groups: &mut [CodewordGroup], id: BlockId) -> &mut CodewordBlock {
    &mut groups[id.group].blocks[id.block]
}

pub fn codeword(groups: &[CodewordGroup], r: CodewordRef) -> &Codeword {
    block(groups, r.block).get(r.index)
}

pub fn codeword_mut(groups: &mut [CodewordGroup], r: CodewordRef) -> &mut Codeword {
    block_mut(groups, r.block).get_mut(r.index)
}

/// Splits the data byte stream into groups and blocks, filling group 1 blocks first.
/// The first `message_len` bytes become message codewords, the rest stuffing.
pub fn group_codewords(
    bytes: &[u8],
    message_len: usize,
    prop: &EncodingProperty,
) -> QRResult<Vec<CodewordGroup>> {
    debug_assert!(
        bytes.len() == prop.data_codewords(),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        bytes.len(),
        prop.data_codewords()
    );

    let mut offset = 0;
    let mut groups = Vec::with_capacity(2);
    for (g, (block_cnt, data_per_block)) in prop.groups().enumerate() {
        let mut blocks = Vec::with_capacity(block_cnt);
        for b in 0..block_cnt {
            let end = (offset + data_per_block).min(bytes.len());
            let data = (offset..end)
                .map(|i| {
                    let kind =
                        if i < message_len { CodewordKind::Message } else { CodewordKind::Stuff };
                    Codeword::new(kind, bytes[i])
                })
                .collect();
            offset = end;
            blocks.push(CodewordBlock::new(BlockId { group: g, block: b }, data, prop.ecc_per_block)?);
        }
        groups.push(CodewordGroup { blocks });
    }
    Ok(groups)
}

// Interleaving
//------------------------------------------------------------------------------

/// Canonical transmission order: data codewords round-robin across blocks, then
/// correction codewords round-robin.
pub fn interleave(groups: &[CodewordGroup]) -> Vec<CodewordRef> {
    let blocks = groups.iter().flat_map(|g| g.blocks.iter()).collect::<Vec<_>>();
    let max_data = blocks.iter().map(|b| b.data.len()).max().unwrap_or(0);
    let ecc_len = blocks.first().map_or(0, |b| b.ecc.len());

    let mut res = Vec::with_capacity(blocks.iter().map(|b| b.len()).sum());
    for i in 0..max_data {
        for b in blocks.iter().filter(|b| i < b.data.len()) {
            res.push(CodewordRef { block: b.id, index: i });
        }
    }
    for i in 0..ecc_len {
        for b in blocks.iter() {
            res.push(CodewordRef { block: b.id, index: b.data.len() + i });
        }
    }
    res
}

/// Inverse of [`interleave`] over raw bytes: returns every block as its data codewords
/// followed by its correction codewords, group 1 first.
pub fn deinterleave(stream: &[u8], prop: &EncodingProperty) -> Vec<Vec<u8>> {
    debug_assert!(
        stream.len() == prop.total_codewords(),
        "Stream len doesn't match total codewords: Stream len {}, Total codewords {}",
        stream.len(),
        prop.total_codewords()
    );

    let data_lens = prop
        .groups()
        .flat_map(|(cnt, data_per_block)| std::iter::repeat(data_per_block).take(cnt))
        .collect::<Vec<_>>();
    let max_data = data_lens.iter().copied().max().unwrap_or(0);
    let mut blocks = data_lens
        .iter()
        .map(|&d| Vec::with_capacity(d + prop.ecc_per_block))
        .collect::<Vec<Vec<u8>>>();

    let mut bytes = stream.iter().copied();
    for i in 0..max_data {
        for (blk, _) in blocks.iter_mut().zip(&data_lens).filter(|(_, d)| i < **d) {
            blk.extend(bytes.next());
        }
    }
    for _ in 0..prop.ecc_per_block {
        for blk in blocks.iter_mut() {
            blk.extend(bytes.next());
        }
    }
    blocks
}
