/// A structure for splitting a 16-bit instruction word
/// into the fields the instruction set is defined in terms of.
///
/// ```text
///  15   12 11    8 7     4 3     0
/// +-------+-------+-------+-------+
/// |  op   |   x   |   y   |   n   |
/// +-------+-------+-------+-------+
///                 |      nn       |
///         |          nnn          |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u8, u8);

impl BitSplitter {
    pub fn from_u16(value: u16) -> BitSplitter {
        BitSplitter((value >> 8) as u8, (value & 0x00FF) as u8)
    }

    pub fn new(left: u8, right: u8) -> BitSplitter {
        BitSplitter(left, right)
    }

    /// Left-shift the first byte 8 bits, then take bitwise or
    /// with the second byte, giving the big-endian word.
    pub fn as_u16(&self) -> u16 {
        ((self.0 as u16) << 8) | self.1 as u16
    }

    /// The four nibbles `(op, x, y, n)`, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.op(), self.x(), self.y(), self.n())
    }

    /// Bits 15-12, the instruction family.
    pub fn op(&self) -> u8 {
        self.0 >> 4
    }

    /// Bits 11-8.
    pub fn x(&self) -> u8 {
        self.0 & 0x0F
    }

    /// Bits 7-4.
    pub fn y(&self) -> u8 {
        self.1 >> 4
    }

    /// Bits 3-0.
    pub fn n(&self) -> u8 {
        self.1 & 0x0F
    }

    /// Bits 7-0, the byte immediate.
    pub fn nn(&self) -> u8 {
        self.1
    }

    /// Bits 11-0, the address immediate.
    pub fn nnn(&self) -> u16 {
        self.as_u16() & 0x0FFF
    }
}

impl From<u16> for BitSplitter {
    fn from(value: u16) -> Self {
        BitSplitter::from_u16(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_into_nibbles() {
        assert_eq!((0xA, 0xB, 0xC, 0xD), BitSplitter::from_u16(0xABCD).as_four_u8());
        assert_eq!((0x0, 0x0, 0xE, 0x0), BitSplitter::from_u16(0x00E0).as_four_u8());
    }

    #[test]
    fn immediates() {
        let word = BitSplitter::new(0x6A, 0x23);
        assert_eq!(word.nn(), 0x23);
        assert_eq!(word.nnn(), 0xA23);
        assert_eq!(word.as_u16(), 0x6A23);
    }

    proptest! {
        #[test]
        fn fields_recompose_to_the_word(word in any::<u16>()) {
            let split = BitSplitter::from(word);
            let (op, x, y, n) = split.as_four_u8();
            let recomposed = (op as u16) << 12 | (x as u16) << 8 | (y as u16) << 4 | n as u16;
            prop_assert_eq!(recomposed, word);
            prop_assert_eq!((op as u16) << 12 | split.nnn(), word);
            prop_assert!(split.nnn() <= 0xFFF);
        }
    }
}
