use std::fmt;

/// Longest code the alphabet can produce: a fully skewed tree over 128
/// leaves is 127 deep.
pub const MAX_CODE_BITS: usize = 128;

/// A code word of at most [`MAX_CODE_BITS`] bits, stored MSB-first in
/// 16 octets. Bits past `bit_count` are always zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitVec {
    bits: [u8; MAX_CODE_BITS / 8],
    bit_count: usize,
}

impl BitVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bit_count
    }

    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// The octets holding the code; the last one is zero-filled past the
    /// final bit.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits[..self.bit_count.div_ceil(8)]
    }

    /// Panics past [`MAX_CODE_BITS`]; tree depth never gets there.
    pub fn push_bit(&mut self, bit: bool) {
        assert!(
            self.bit_count < MAX_CODE_BITS,
            "code longer than {} bits",
            MAX_CODE_BITS
        );
        let byte_index = self.bit_count / 8;
        let bit_offset = self.bit_count % 8;

        if bit {
            self.bits[byte_index] |= 1 << (7 - bit_offset);
        }

        self.bit_count += 1;
    }

    /// Copy of `self` with one more bit appended.
    pub fn with_bit(mut self, bit: bool) -> Self {
        self.push_bit(bit);
        self
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.bit_count).then(|| self.bits[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.bit_count).filter_map(move |i| self.get(i))
    }

    pub fn is_prefix_of(&self, other: &BitVec) -> bool {
        self.bit_count <= other.bit_count && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec({})", self)
    }
}

impl<'a> FromIterator<&'a bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = &'a bool>>(iter: I) -> Self {
        let mut bv = BitVec::new();
        for &bit in iter {
            bv.push_bit(bit);
        }
        bv
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn packs_msb_first() {
        let bv: BitVec = [true, false, true, true, false, false, false, false, true]
            .iter()
            .collect();
        assert_eq!(bv.len(), 9);
        assert_eq!(bv.as_bytes(), &[0b1011_0000, 0b1000_0000]);
        assert_eq!(bv.to_string(), "101100001");
    }

    #[test]
    fn empty_has_no_bytes() {
        let bv = BitVec::new();
        assert!(bv.is_empty());
        assert!(bv.as_bytes().is_empty());
        assert_eq!(bv.get(0), None);
    }

    #[test]
    fn holds_full_capacity() {
        let mut bv = BitVec::new();
        for i in 0..MAX_CODE_BITS {
            bv.push_bit(i % 3 == 0);
        }
        assert_eq!(bv.as_bytes().len(), 16);
        assert_eq!(bv.get(126), Some(true));
        assert_eq!(bv.get(127), Some(false));
    }

    #[test]
    #[should_panic]
    fn overflow_panics() {
        let mut bv = BitVec::new();
        for _ in 0..=MAX_CODE_BITS {
            bv.push_bit(true);
        }
    }

    #[test]
    fn prefix_relation() {
        let a: BitVec = [true, false].iter().collect();
        let b: BitVec = [true, false, true].iter().collect();
        let c: BitVec = [true, true].iter().collect();
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(!a.is_prefix_of(&c));
        assert!(a.is_prefix_of(&a));
    }
}
