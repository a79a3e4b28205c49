//! The append-only bitmap and its run/position iterators.

use std::ops::{BitAnd, BitOr, BitXor, Not};

use crate::bits::Bits;
use crate::word;

/// An append-only sequence of bits packed into 64-bit blocks.
///
/// Bits beyond `size` in the last block are kept at 0, so block-wise
/// equality, rank and the combinators need no special-casing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    blocks: Vec<u64>,
    size: u64,
}

impl Bitmap {
    /// Creates an empty bitmap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a homogeneous bitmap of `n` copies of `bit`.
    pub fn with_bits(bit: bool, n: u64) -> Self {
        let mut bm = Self::new();
        bm.append_bits(bit, n);
        bm
    }

    /// Creates the dense identifier bitmap for the half-open range
    /// `[begin, end)`: zeros up to `begin`, ones up to `end`.
    ///
    /// # Pre
    ///
    /// `begin <= end`
    pub fn from_range(begin: u64, end: u64) -> Self {
        debug_assert!(begin <= end);
        let mut bm = Self::new();
        bm.append_bits(false, begin);
        bm.append_bits(true, end - begin);
        bm
    }

    /// The number of bits in the bitmap.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The number of set bits.
    pub fn rank(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// The number of set bits at positions `0..=i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size`.
    pub fn rank_at(&self, i: u64) -> u64 {
        assert!(i < self.size, "bit index {i} out of bounds");
        let block = (i / word::WIDTH) as usize;
        self.blocks[..block]
            .iter()
            .map(|b| u64::from(b.count_ones()))
            .sum::<u64>()
            + word::rank_at(self.blocks[block], i % word::WIDTH)
    }

    /// The value of bit *i*.
    ///
    /// # Panics
    ///
    /// Panics if `i >= size`.
    pub fn get(&self, i: u64) -> bool {
        assert!(i < self.size, "bit index {i} out of bounds");
        word::test(self.blocks[(i / word::WIDTH) as usize], i % word::WIDTH)
    }

    /// Appends a single bit.
    pub fn append_bit(&mut self, bit: bool) {
        let used = self.size % word::WIDTH;
        if used == 0 {
            self.blocks.push(word::NONE);
        }
        if bit {
            if let Some(last) = self.blocks.last_mut() {
                *last = word::set_bit(*last, used, true);
            }
        }
        self.size += 1;
    }

    /// Appends `n` copies of `bit`.
    pub fn append_bits(&mut self, bit: bool, n: u64) {
        let mut n = n;
        let used = self.size % word::WIDTH;
        if n > 0 && used > 0 {
            let fill = n.min(word::WIDTH - used);
            if bit {
                if let Some(last) = self.blocks.last_mut() {
                    *last |= word::lsb_fill(fill) << used;
                }
            }
            self.size += fill;
            n -= fill;
        }
        let block = if bit { word::ALL } else { word::NONE };
        for _ in 0..n / word::WIDTH {
            self.blocks.push(block);
        }
        self.size += n - n % word::WIDTH;
        let rest = n % word::WIDTH;
        if rest > 0 {
            self.blocks
                .push(if bit { word::lsb_fill(rest) } else { word::NONE });
            self.size += rest;
        }
    }

    /// Appends the `n` least significant bits of `block`, LSB first.
    ///
    /// # Pre
    ///
    /// `1 <= n <= 64`
    pub fn append_block(&mut self, block: u64, n: u64) {
        debug_assert!(n >= 1 && n <= word::WIDTH);
        let masked = block & word::lsb_fill(n);
        let used = self.size % word::WIDTH;
        if used == 0 {
            self.blocks.push(masked);
        } else {
            if let Some(last) = self.blocks.last_mut() {
                *last |= masked << used;
            }
            if used + n > word::WIDTH {
                self.blocks.push(masked >> (word::WIDTH - used));
            }
        }
        self.size += n;
    }

    /// Iterates the bitmap as a sequence of [`Bits`] runs.
    ///
    /// Adjacent homogeneous blocks collapse into one run, so consumers can
    /// skip an all-zero stretch in a single step.
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            blocks: &self.blocks,
            size: self.size,
            pos: 0,
        }
    }

    /// Iterates the positions of set bits in ascending order.
    pub fn ones(&self) -> Ones<'_> {
        let mut ones = Ones {
            runs: self.runs(),
            base: 0,
            bits: None,
            local: None,
        };
        ones.advance_run();
        ones
    }

    /// Bitwise NAND: set wherever not both operands are set.
    pub fn nand(&self, other: &Bitmap) -> Bitmap {
        self.zip_blocks(other, |a, b| !(a & b))
    }

    /// Bitwise NOR: set wherever neither operand is set.
    pub fn nor(&self, other: &Bitmap) -> Bitmap {
        self.zip_blocks(other, |a, b| !(a | b))
    }

    fn zip_blocks(&self, other: &Bitmap, op: impl Fn(u64, u64) -> u64) -> Bitmap {
        assert_eq!(
            self.size, other.size,
            "bitmap combinators require equal sizes"
        );
        let blocks = self
            .blocks
            .iter()
            .zip(&other.blocks)
            .map(|(&a, &b)| op(a, b))
            .collect();
        let mut result = Bitmap {
            blocks,
            size: self.size,
        };
        result.mask_trailing();
        result
    }

    fn mask_trailing(&mut self) {
        let used = self.size % word::WIDTH;
        if used > 0 {
            if let Some(last) = self.blocks.last_mut() {
                *last &= word::lsb_fill(used);
            }
        }
    }
}

impl BitAnd for &Bitmap {
    type Output = Bitmap;

    fn bitand(self, rhs: &Bitmap) -> Bitmap {
        self.zip_blocks(rhs, |a, b| a & b)
    }
}

impl BitOr for &Bitmap {
    type Output = Bitmap;

    fn bitor(self, rhs: &Bitmap) -> Bitmap {
        self.zip_blocks(rhs, |a, b| a | b)
    }
}

impl BitXor for &Bitmap {
    type Output = Bitmap;

    fn bitxor(self, rhs: &Bitmap) -> Bitmap {
        self.zip_blocks(rhs, |a, b| a ^ b)
    }
}

impl Not for &Bitmap {
    type Output = Bitmap;

    fn not(self) -> Bitmap {
        let mut result = Bitmap {
            blocks: self.blocks.iter().map(|&b| !b).collect(),
            size: self.size,
        };
        result.mask_trailing();
        result
    }
}

impl Extend<bool> for Bitmap {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for bit in iter {
            self.append_bit(bit);
        }
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut bm = Bitmap::new();
        bm.extend(iter);
        bm
    }
}

/// Iterator over the bit runs of a [`Bitmap`].
///
/// Lazy, finite and non-restartable. Every run starts on a block
/// boundary; homogeneous full blocks coalesce, the trailing partial block
/// (if any) forms its own run.
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    blocks: &'a [u64],
    size: u64,
    pos: u64,
}

impl Iterator for Runs<'_> {
    type Item = Bits;

    fn next(&mut self) -> Option<Bits> {
        if self.pos >= self.size {
            return None;
        }
        let idx = (self.pos / word::WIDTH) as usize;
        let block = self.blocks[idx];
        let remaining = self.size - self.pos;
        let run = if remaining <= word::WIDTH {
            Bits::new(block, remaining)
        } else if word::all_or_none(block) {
            // Coalesce adjacent identical homogeneous blocks, stopping
            // short of the trailing partial block.
            let mut n = 1;
            while self.pos + (n + 1) * word::WIDTH <= self.size && self.blocks[idx + n as usize] == block
            {
                n += 1;
            }
            Bits::new(block, n * word::WIDTH)
        } else {
            Bits::new(block, word::WIDTH)
        };
        self.pos += run.size();
        Some(run)
    }
}

/// Iterator over the positions of set bits of a [`Bitmap`], ascending.
#[derive(Debug, Clone)]
pub struct Ones<'a> {
    runs: Runs<'a>,
    base: u64,
    bits: Option<Bits>,
    local: Option<u64>,
}

impl Ones<'_> {
    /// Skips runs without set bits, positioning on the first set bit of
    /// the next run that has one.
    fn advance_run(&mut self) {
        while let Some(bits) = self.runs.next() {
            if let Some(first) = bits.find_first() {
                self.bits = Some(bits);
                self.local = Some(first);
                return;
            }
            self.base += bits.size();
        }
        self.bits = None;
        self.local = None;
    }
}

impl Iterator for Ones<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let bits = self.bits?;
        let local = self.local?;
        let position = self.base + local;
        self.local = bits.find_next(local);
        if self.local.is_none() {
            self.base += bits.size();
            self.advance_run();
        }
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;

    use super::*;

    fn from_bools(bits: &[bool]) -> Bitmap {
        bits.iter().copied().collect()
    }

    #[test]
    fn empty_bitmap() {
        let bm = Bitmap::new();
        assert!(bm.is_empty());
        assert_eq!(bm.size(), 0);
        assert_eq!(bm.rank(), 0);
        assert_eq!(bm.runs().count(), 0);
        assert_eq!(bm.ones().next(), None);
    }

    #[test]
    fn append_bit_tracks_positions() {
        let bm = from_bools(&[true, false, false, true, true]);
        assert_eq!(bm.size(), 5);
        assert_eq!(bm.rank(), 3);
        assert!(bm.get(0) && bm.get(3) && bm.get(4));
        assert!(!bm.get(1) && !bm.get(2));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_past_the_end_panics() {
        Bitmap::with_bits(true, 3).get(3);
    }

    #[test]
    fn append_block_splits_across_block_boundary() {
        let mut bm = Bitmap::new();
        bm.append_bits(false, 60);
        bm.append_block(0b1111_0001, 8);
        assert_eq!(bm.size(), 68);
        assert!(bm.get(60));
        assert!(!bm.get(61) && !bm.get(62) && !bm.get(63));
        assert!(bm.get(64) && bm.get(65) && bm.get(66) && bm.get(67));
    }

    #[test]
    fn from_range_is_zeros_then_ones() {
        let bm = Bitmap::from_range(10, 14);
        assert_eq!(bm.size(), 14);
        assert_eq!(bm.rank(), 4);
        assert_eq!(bm.ones().collect::<Vec<_>>(), vec![10, 11, 12, 13]);
    }

    #[test]
    fn homogeneous_blocks_coalesce_into_one_run() {
        let mut bm = Bitmap::with_bits(false, 1000);
        bm.append_bit(true);
        let runs: Vec<_> = bm.runs().collect();
        // 15 all-zero blocks coalesce; the partial tail is its own run.
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].size(), 960);
        assert_eq!(runs[0].find_first(), None);
        assert_eq!(runs[1].size(), 41);
        assert_eq!(runs[1].find_first(), Some(40));
    }

    #[test]
    fn mixed_runs_cover_the_bitmap() {
        let mut bm = Bitmap::new();
        bm.append_bits(true, 64);
        bm.append_block(0b1010, 64);
        bm.append_bits(false, 128);
        bm.append_bits(true, 3);
        let runs: Vec<_> = bm.runs().collect();
        assert_eq!(
            runs.iter().map(Bits::size).collect::<Vec<_>>(),
            vec![64, 64, 128, 3]
        );
        assert_eq!(runs.iter().map(Bits::size).sum::<u64>(), bm.size());
    }

    #[test]
    fn combinators_and_complement() {
        let a = from_bools(&[true, true, false, false]);
        let b = from_bools(&[true, false, true, false]);
        assert_eq!((&a & &b).ones().collect::<Vec<_>>(), vec![0]);
        assert_eq!((&a | &b).ones().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!((&a ^ &b).ones().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(a.nand(&b).ones().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(a.nor(&b).ones().collect::<Vec<_>>(), vec![3]);
        assert_eq!((!&a).ones().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    #[should_panic(expected = "equal sizes")]
    fn combinators_reject_unequal_sizes() {
        let _ = &Bitmap::with_bits(true, 3) & &Bitmap::with_bits(true, 4);
    }

    proptest! {
        #[test]
        fn access_rank_and_ones_agree(bits in vec(any::<bool>(), 0..256)) {
            let bm = from_bools(&bits);
            prop_assert_eq!(bm.size(), bits.len() as u64);
            prop_assert_eq!(bm.rank(), bits.iter().filter(|&&b| b).count() as u64);
            let mut running = 0;
            for (i, &bit) in bits.iter().enumerate() {
                prop_assert_eq!(bm.get(i as u64), bit);
                running += u64::from(bit);
                prop_assert_eq!(bm.rank_at(i as u64), running);
            }
            let expected: Vec<u64> = bits
                .iter()
                .enumerate()
                .filter_map(|(i, &bit)| bit.then_some(i as u64))
                .collect();
            prop_assert_eq!(bm.ones().collect::<Vec<_>>(), expected);
        }

        #[test]
        fn bulk_append_matches_single_bit_append(
            stretches in vec((any::<bool>(), 1u64..200), 0..16)
        ) {
            let mut bulk = Bitmap::new();
            let mut single = Bitmap::new();
            for &(bit, n) in &stretches {
                bulk.append_bits(bit, n);
                for _ in 0..n {
                    single.append_bit(bit);
                }
            }
            prop_assert_eq!(&bulk, &single);

            // Runs partition the bitmap and reproduce every bit.
            let mut offset = 0;
            for run in bulk.runs() {
                for i in 0..run.size() {
                    prop_assert_eq!(run.bit(i), bulk.get(offset + i));
                }
                offset += run.size();
            }
            prop_assert_eq!(offset, bulk.size());
        }

        #[test]
        fn boolean_algebra_laws(
            (a_bits, b_bits) in (0usize..200)
                .prop_flat_map(|n| (vec(any::<bool>(), n), vec(any::<bool>(), n)))
        ) {
            let a = from_bools(&a_bits);
            let b = from_bools(&b_bits);
            prop_assert_eq!(&a & &b, &b & &a);
            prop_assert_eq!(&a | &b, &b | &a);
            prop_assert_eq!(&a ^ &b, &b ^ &a);
            prop_assert_eq!(!&(!&a), a.clone());
            prop_assert_eq!(a.nand(&b), !&(&a & &b));
            prop_assert_eq!(a.nor(&b), !&(&a | &b));
            // De Morgan.
            prop_assert_eq!(!&(&a & &b), &(!&a) | &(!&b));
            prop_assert_eq!(!&(&a | &b), &(!&a) & &(!&b));
        }
    }
}
