use super::encoder::ecc;

/// Data codewords followed by their error correction codewords.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    pub(super) data: Vec<u8>,
    // Data length
    dlen: usize,
}

impl Block {
    pub fn new(raw: &[u8], ecc_len: usize) -> Self {
        let mut data = raw.to_vec();
        data.extend(ecc(raw, ecc_len));
        Self { data, dlen: raw.len() }
    }

    pub fn with_encoded(encoded: &[u8], dlen: usize) -> Self {
        debug_assert!(dlen <= encoded.len(), "Data length exceeds block length");
        Self { data: encoded.to_vec(), dlen }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ec_len(&self) -> usize {
        self.data.len() - self.dlen
    }

    pub fn data_len(&self) -> usize {
        self.dlen
    }

    pub fn full(&self) -> &[u8] {
        &self.data
    }

    #[cfg(test)]
    pub fn full_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..]
    }
}
