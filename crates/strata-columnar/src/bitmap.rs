#![forbid(unsafe_code)]

/// A compact bit vector used for validity bitmaps and boolean values.
///
/// Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 63 is the MSB of word 0
///
/// A `BitVec` is only ever appended to while an array is being built. Once it
/// is wrapped in an [`Array`](crate::Array) it is shared behind an `Arc` and
/// never mutated again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

impl BitVec {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        let words = (bits + 63) / 64;
        Self {
            words: Vec::with_capacity(words),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        if bits == 0 {
            return Self::new();
        }

        let word_len = (bits + 63) / 64;
        let mut words = vec![u64::MAX; word_len];
        let rem = bits % 64;
        if rem != 0 {
            let mask = (1u64 << rem) - 1;
            if let Some(last) = words.last_mut() {
                *last = mask;
            }
        }

        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }

        if value {
            let word = self.len / 64;
            self.words[word] |= 1u64 << bit;
            self.ones += 1;
        }

        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = self.words[index / 64];
        let bit = index % 64;
        ((word >> bit) & 1) == 1
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    /// Number of set bits in `[start, start + len)`.
    pub fn count_ones_in(&self, start: usize, len: usize) -> usize {
        if start == 0 && len == self.len {
            return self.ones;
        }
        (start..start + len).filter(|&i| self.get(i)).count()
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut out = BitVec::with_capacity_bits(iter.size_hint().0);
        for bit in iter {
            out.push(bit);
        }
        out
    }
}
