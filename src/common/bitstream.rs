// Bit stream
//------------------------------------------------------------------------------

/// Bit writer filling each byte from its most significant bit, bounded by the data bit
/// capacity of a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    bit_len: usize,
    bit_capacity: usize,
}

impl BitStream {
    pub fn new(bit_capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(bit_capacity.div_ceil(8)), bit_len: 0, bit_capacity }
    }

    pub fn len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn capacity(&self) -> usize {
        self.bit_capacity
    }

    // Bits left before the capacity is reached
    pub fn remaining(&self) -> usize {
        self.bit_capacity - self.bit_len
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(self.bit_len < self.bit_capacity, "Bit stream is full: {}", self.bit_capacity);

        let shift = 7 - (self.bit_len % 8);
        if shift == 7 {
            self.bytes.push(0);
        }
        if let Some(last) = self.bytes.last_mut() {
            *last |= (bit as u8) << shift;
        }
        self.bit_len += 1;
    }

    /// Appends the low `size` bits of `bits`, most significant first.
    pub fn push_bits(&mut self, bits: u16, size: usize) {
        debug_assert!(size <= 16, "Bit count exceeds 16: {size}");
        debug_assert!(
            size == 16 || bits >> size == 0,
            "Value doesn't fit in {size} bits: {bits:#b}"
        );
        debug_assert!(
            size <= self.remaining(),
            "Insufficient capacity: Capacity {}, Required {}",
            self.bit_capacity,
            self.bit_len + size
        );

        (0..size).rev().for_each(|i| self.push((bits >> i) & 1 == 1));
    }

    // Zero fills up to the next byte boundary
    pub fn pad_to_byte(&mut self) {
        let partial = self.bit_len % 8;
        if partial > 0 {
            self.push_bits(0, 8 - partial);
        }
    }
}
