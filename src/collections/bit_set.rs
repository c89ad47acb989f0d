//! Dense, word-packed set of small integers.
//!
//! Used for the solver's settled flags: membership tests are a shift and a mask,
//! the population count is tracked incrementally so `len` is O(1), and cloning
//! copies one `u64` per 64 vertices.

/// A fixed-universe bit set over `[0, capacity)`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BitSet {
    words: Vec<u64>,
    /// Number of set bits.
    len: usize,
    bits: usize,
}

impl BitSet {
    /// Creates an empty set able to hold values in `[0, bits)`.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(64)],
            len: 0,
            bits,
        }
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the universe this set was created for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits
    }

    /// Clears every bit, keeping the allocation.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
        self.len = 0;
    }

    /// Sets `bit`. Returns `true` if it was not already set.
    ///
    /// # Panics
    /// Panics if `bit >= capacity()`.
    pub fn insert(&mut self, bit: usize) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for capacity {}", self.bits);
        let mask = 1u64 << (bit % 64);
        let word = &mut self.words[bit / 64];
        if *word & mask == 0 {
            *word |= mask;
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `bit` is set. Out-of-range bits are never set.
    #[inline]
    pub fn contains(&self, bit: usize) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|word| word & (1u64 << (bit % 64)) != 0)
    }

    /// Iterates over set bits in increasing order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            iter: self.words.iter().enumerate(),
            current_word: 0,
            word_idx: 0,
        }
    }
}

impl core::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Iterator over the set bits of a [`BitSet`].
pub struct Iter<'a> {
    iter: core::iter::Enumerate<core::slice::Iter<'a, u64>>,
    current_word: u64,
    word_idx: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let trailing = self.current_word.trailing_zeros();
                self.current_word &= self.current_word - 1; // clear lowest bit
                return Some(self.word_idx * 64 + trailing as usize);
            }

            let (idx, &word) = self.iter.next()?;
            self.word_idx = idx;
            self.current_word = word;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_set_basic() {
        let mut set = BitSet::with_capacity(200);
        assert!(set.is_empty());

        assert!(set.insert(1));
        assert!(set.insert(100));
        assert_eq!(set.len(), 2);
        assert!(set.contains(1));
        assert!(set.contains(100));
        assert!(!set.contains(2));
        assert!(!set.contains(10_000));

        assert!(!set.insert(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_bit_set_iter_and_clear() {
        let mut set = BitSet::with_capacity(129);
        for bit in [1, 5, 64, 128] {
            set.insert(bit);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 5, 64, 128]);

        let copy = set.clone();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.iter().next(), None);
        assert_eq!(copy.len(), 4);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_insert_out_of_range_panics() {
        let mut set = BitSet::with_capacity(3);
        set.insert(3);
    }
}
