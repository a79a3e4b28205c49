//! Block-level helpers over `u64` words.
//!
//! Bit positions count from the LSB. Search helpers return `Option<u64>`
//! rather than a sentinel position.

/// The number of bits per block.
pub const WIDTH: u64 = u64::BITS as u64;

/// A block with all bits 0.
pub const NONE: u64 = 0;

/// A block with all bits 1.
pub const ALL: u64 = !NONE;

/// A block with only bit *i* set.
///
/// # Pre
///
/// `i < WIDTH`
pub fn mask(i: u64) -> u64 {
    debug_assert!(i < WIDTH);
    1 << i
}

/// A block with the *i* least significant bits set.
///
/// # Pre
///
/// `1 <= i <= WIDTH`
pub fn lsb_fill(i: u64) -> u64 {
    debug_assert!(i >= 1 && i <= WIDTH);
    ALL >> (WIDTH - i)
}

/// Extracts bit *i* of a block.
///
/// # Pre
///
/// `i < WIDTH`
pub fn test(x: u64, i: u64) -> bool {
    x & mask(i) != 0
}

/// Returns `x` with bit *i* set to `bit`.
///
/// # Pre
///
/// `i < WIDTH`
pub fn set_bit(x: u64, i: u64, bit: bool) -> u64 {
    if bit { x | mask(i) } else { x & !mask(i) }
}

/// Tests whether a block is homogeneous (all 0 or all 1).
pub fn all_or_none(x: u64) -> bool {
    (x.wrapping_add(1) & !1) <= 1
}

/// Position of the first 1-bit, if any.
pub fn first_one(x: u64) -> Option<u64> {
    if x == 0 {
        None
    } else {
        Some(u64::from(x.trailing_zeros()))
    }
}

/// Position of the first 1-bit strictly after position *i*, if any.
///
/// # Pre
///
/// `i < WIDTH`
pub fn next_one(x: u64, i: u64) -> Option<u64> {
    debug_assert!(i < WIDTH);
    if i == WIDTH - 1 {
        return None;
    }
    first_one(x & (ALL << (i + 1)))
}

/// The number of 1-bits up to and including position *i*.
///
/// # Pre
///
/// `i < WIDTH`
pub fn rank_at(x: u64, i: u64) -> u64 {
    u64::from((x & lsb_fill(i + 1)).count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks() {
        assert_eq!(mask(0), 1);
        assert_eq!(mask(63), 1 << 63);
        assert_eq!(lsb_fill(1), 1);
        assert_eq!(lsb_fill(8), 0xFF);
        assert_eq!(lsb_fill(WIDTH), ALL);
    }

    #[test]
    fn homogeneity() {
        assert!(all_or_none(NONE));
        assert!(all_or_none(ALL));
        assert!(!all_or_none(0b1010));
        assert!(!all_or_none(ALL - 1));
    }

    #[test]
    fn bit_search() {
        assert_eq!(first_one(NONE), None);
        assert_eq!(first_one(0b1000), Some(3));
        assert_eq!(next_one(0b1001, 0), Some(3));
        assert_eq!(next_one(0b1001, 3), None);
        assert_eq!(next_one(ALL, 62), Some(63));
        assert_eq!(next_one(ALL, 63), None);
    }

    #[test]
    fn set_and_rank() {
        let x = set_bit(set_bit(NONE, 3, true), 40, true);
        assert!(test(x, 3) && test(x, 40));
        assert_eq!(rank_at(x, 2), 0);
        assert_eq!(rank_at(x, 3), 1);
        assert_eq!(rank_at(x, 63), 2);
        assert_eq!(set_bit(x, 3, false), mask(40));
    }
}
