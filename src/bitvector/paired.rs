use crate::bit_vec::BitVec;
use crate::codec::{self, ByteEncode, ByteReader};
use crate::error::{Error, Result};
use crate::mask;
use crate::traits::{BitGet, BitModify, RankedBitvector};

/// A rank-supporting bitvector with a single level of blocks, but where neighbouring blocks
/// are paired up and share one counter at their midpoint instead of each carrying its own.
///
/// `l0_pair[p]` holds the cumulative popcount through the end of block `2p` (the midpoint of
/// pair `p`). A query landing in the first half of a pair subtracts the masked popcount of the
/// remainder of that half-pair from the midpoint counter; a query in the second half adds the
/// masked popcount of the portion of that half-pair seen so far. Either way only one block's
/// worth of words is ever touched, at the cost of one extra masked popcount for second-half
/// queries compared to [`crate::bitvector::Bitvector1L`].
///
/// `B` must be a multiple of 64.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PairedBitvector1L<const B: usize> {
    bits: BitVec,
    l0_pair: Vec<u64>,
}

impl<const B: usize> PairedBitvector1L<B> {
    const CHECK_BLOCK_SIZE: () = assert!(B > 0 && B % 64 == 0, "B must be a positive multiple of 64");
    const WORDS_PER_BLOCK: usize = B / 64;

    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_BLOCK_SIZE;
        Self::build(BitVec::from_bits(bits))
    }

    pub fn from_words(words: Vec<u64>, len: usize) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_BLOCK_SIZE;
        Ok(Self::build(BitVec::from_words(words, len)?))
    }

    fn build(mut bits: BitVec) -> Self {
        let n = bits.len();
        let wpb = Self::WORDS_PER_BLOCK;
        let num_complete_pairs = n / (2 * B);
        // Pad so that block `2 * num_complete_pairs` (the last pair we need a midpoint for)
        // is fully backed by real (zero) words, even if it extends past `n`.
        bits.pad_to_words((num_complete_pairs + 1) * 2 * wpb);

        let words = bits.words();
        let mut l0_pair = Vec::with_capacity(num_complete_pairs + 1);
        let mut within = 0u64;
        for p in 0..=num_complete_pairs {
            let start = 2 * p * wpb;
            let end = start + wpb;
            within += words[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum::<u64>();
            l0_pair.push(within);
        }

        Self { bits, l0_pair }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn symbol(&self, index: usize) -> bool {
        self.bits.get_bit(index)
    }

    pub fn rank(&self, index: usize) -> u64 {
        debug_assert!(
            index <= self.bits.len(),
            "index {index} out of bounds for len {}",
            self.bits.len()
        );
        let pair_bits = 2 * B;
        let p = index / pair_bits;
        let bit_id = index - p * pair_bits;
        let side = bit_id / B;
        let base = self.l0_pair[p];
        let block_idx = 2 * p + side;
        let start = block_idx * Self::WORDS_PER_BLOCK;
        let end = start + Self::WORDS_PER_BLOCK;
        let block_words = &self.bits.words()[start..end];
        if side == 0 {
            base - mask::popcount_words_suffix(block_words, bit_id)
        } else {
            base + mask::popcount_words_prefix(block_words, bit_id - B)
        }
    }

    /// Appends a single bit. Unlike [`crate::bitvector::Bitvector1L`]'s incremental bookkeeping,
    /// this rebuilds the midpoint table from scratch on every call; the paired scheme's
    /// midpoint-inclusive counters don't admit the same simple append-on-boundary update, so
    /// simplicity is chosen over amortised O(1) growth here.
    pub fn push_back(&mut self, bit: bool) {
        self.bits.push_back(bit);
        *self = Self::build(std::mem::replace(&mut self.bits, BitVec::new(0)));
    }
}

impl<const B: usize> RankedBitvector for PairedBitvector1L<B> {
    fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        Self::from_bits(bits)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn symbol(&self, index: usize) -> bool {
        self.symbol(index)
    }

    fn rank(&self, index: usize) -> u64 {
        self.rank(index)
    }

    fn push_back(&mut self, bit: bool) {
        self.push_back(bit)
    }
}

impl<const B: usize> ByteEncode for PairedBitvector1L<B> {
    /// Layout: `totalLength` (8 bytes), `l0_pair` (length-prefixed 8-byte integers, unbounded
    /// since there is no superblock to cap it), then the packed words.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_u64(&mut buf, self.bits.len() as u64);
        codec::write_u64_slice(&mut buf, &self.l0_pair);
        codec::write_u64_slice(&mut buf, self.bits.words());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let len = reader.read_u64()? as usize;
        let l0_pair = reader.read_u64_vec()?;
        let words = reader.read_u64_vec()?;
        let word_count = words.len();
        let mut bits = BitVec::from_words(words, len)
            .map_err(|e| Error::CorruptArchive(format!("bad word storage: {e}")))?;
        // `BitVec::from_words` truncates to `ceil(len / 64)` words; restore the trailing
        // zero-padded words the midpoint `rank` formula reads past the logical length.
        bits.pad_to_words(word_count);
        Ok(Self { bits, l0_pair })
    }
}

/// A rank-supporting bitvector combining the paired-block midpoint trick with a superblock
/// level, analogous to [`crate::bitvector::Bitvector2L`].
///
/// `S` must be a multiple of `2 * B` (a whole, even number of blocks per superblock), so that
/// superblock boundaries always align with pair boundaries.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PairedBitvector2L<const B: usize, const S: usize> {
    bits: BitVec,
    l0_pair: Vec<u32>,
    l1: Vec<u64>,
}

impl<const B: usize, const S: usize> PairedBitvector2L<B, S> {
    const CHECK_SIZES: () = assert!(
        B > 0 && B % 64 == 0 && S > 0 && S % (2 * B) == 0,
        "B must be a positive multiple of 64, and S a positive multiple of 2 * B"
    );
    const WORDS_PER_BLOCK: usize = B / 64;
    const PAIRS_PER_SUPERBLOCK: usize = S / (2 * B);

    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_SIZES;
        Self::build(BitVec::from_bits(bits))
    }

    pub fn from_words(words: Vec<u64>, len: usize) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_SIZES;
        Ok(Self::build(BitVec::from_words(words, len)?))
    }

    fn build(mut bits: BitVec) -> Self {
        let n = bits.len();
        let wpb = Self::WORDS_PER_BLOCK;
        let num_complete_pairs = n / (2 * B);
        bits.pad_to_words((num_complete_pairs + 1) * 2 * wpb);
        let words = bits.words();

        let num_complete_superblocks = n / S;
        let mut l1 = Vec::with_capacity(num_complete_superblocks + 1);
        l1.push(0u64);
        let mut cum = 0u64;
        for s in 0..num_complete_superblocks {
            let start = s * Self::PAIRS_PER_SUPERBLOCK * 2 * wpb;
            let end = start + Self::PAIRS_PER_SUPERBLOCK * 2 * wpb;
            cum += words[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum::<u64>();
            l1.push(cum);
        }

        let mut l0_pair = Vec::with_capacity(num_complete_pairs + 1);
        let mut within = 0u32;
        for p in 0..=num_complete_pairs {
            if p % Self::PAIRS_PER_SUPERBLOCK == 0 {
                within = 0;
            }
            let start = 2 * p * wpb;
            let end = start + wpb;
            within += words[start..end].iter().map(|w| w.count_ones()).sum::<u32>();
            l0_pair.push(within);
        }

        Self { bits, l0_pair, l1 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn symbol(&self, index: usize) -> bool {
        self.bits.get_bit(index)
    }

    pub fn rank(&self, index: usize) -> u64 {
        debug_assert!(
            index <= self.bits.len(),
            "index {index} out of bounds for len {}",
            self.bits.len()
        );
        let pair_bits = 2 * B;
        let p = index / pair_bits;
        let s = index / S;
        let bit_id = index - p * pair_bits;
        let side = bit_id / B;
        let base = self.l1[s] + self.l0_pair[p] as u64;
        let block_idx = 2 * p + side;
        let start = block_idx * Self::WORDS_PER_BLOCK;
        let end = start + Self::WORDS_PER_BLOCK;
        let block_words = &self.bits.words()[start..end];
        if side == 0 {
            base - mask::popcount_words_suffix(block_words, bit_id)
        } else {
            base + mask::popcount_words_prefix(block_words, bit_id - B)
        }
    }

    /// Appends a single bit, rebuilding both tables from scratch (see
    /// [`PairedBitvector1L::push_back`] for why).
    pub fn push_back(&mut self, bit: bool) {
        self.bits.push_back(bit);
        *self = Self::build(std::mem::replace(&mut self.bits, BitVec::new(0)));
    }
}

impl<const B: usize, const S: usize> RankedBitvector for PairedBitvector2L<B, S> {
    fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        Self::from_bits(bits)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn symbol(&self, index: usize) -> bool {
        self.symbol(index)
    }

    fn rank(&self, index: usize) -> u64 {
        self.rank(index)
    }

    fn push_back(&mut self, bit: bool) {
        self.push_back(bit)
    }
}

impl<const B: usize, const S: usize> ByteEncode for PairedBitvector2L<B, S> {
    /// Layout: `totalLength` (8 bytes), `l1` (length-prefixed 8-byte integers), `l0_pair`
    /// (length-prefixed 2-byte integers, valid as long as `S <= 65536`), then the packed words.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_u64(&mut buf, self.bits.len() as u64);
        codec::write_u64_slice(&mut buf, &self.l1);
        debug_assert!(
            self.l0_pair.iter().all(|&v| v <= u16::MAX as u32),
            "pair-local popcount overflowed u16; S is too large for this archive format"
        );
        let l0_pair: Vec<u16> = self.l0_pair.iter().map(|&v| v as u16).collect();
        codec::write_u16_slice(&mut buf, &l0_pair);
        codec::write_u64_slice(&mut buf, self.bits.words());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let len = reader.read_u64()? as usize;
        let l1 = reader.read_u64_vec()?;
        let l0_pair = reader.read_u16_vec()?.into_iter().map(u32::from).collect();
        let words = reader.read_u64_vec()?;
        let word_count = words.len();
        let mut bits = BitVec::from_words(words, len)
            .map_err(|e| Error::CorruptArchive(format!("bad word storage: {e}")))?;
        // `BitVec::from_words` truncates to `ceil(len / 64)` words; restore the trailing
        // zero-padded words the midpoint `rank` formula reads past the logical length.
        bits.pad_to_words(word_count);
        Ok(Self { bits, l0_pair, l1 })
    }
}

#[cfg(test)]
mod test {
    use super::{PairedBitvector1L, PairedBitvector2L};
    use crate::codec::ByteEncode;

    fn naive_rank(bits: &[bool], index: usize) -> u64 {
        bits[..index].iter().filter(|&&b| b).count() as u64
    }

    #[test]
    fn matches_plain_bitvector_on_every_index() {
        use crate::bitvector::Bitvector1L;
        let raw: Vec<bool> = (0..777).map(|i| (i * 48271u32) % 6 == 0).collect();
        let plain = Bitvector1L::<64>::from_bits(raw.iter().copied());
        let paired = PairedBitvector1L::<64>::from_bits(raw.iter().copied());
        for i in 0..=raw.len() {
            assert_eq!(plain.rank(i), paired.rank(i), "index {i}");
        }
        for i in 0..raw.len() {
            assert_eq!(plain.symbol(i), paired.symbol(i), "index {i}");
        }
    }

    #[test]
    fn rank_matches_naive_count_2l() {
        let raw: Vec<bool> = (0..2048).map(|i| (i * 2246822519u32) % 5 == 0).collect();
        let bv = PairedBitvector2L::<64, 512>::from_bits(raw.iter().copied());
        for i in (0..=raw.len()).step_by(17) {
            assert_eq!(naive_rank(&raw, i), bv.rank(i), "index {i}");
        }
    }

    #[test]
    fn push_back_matches_full_construction() {
        let raw: Vec<bool> = (0..400).map(|i| i % 7 == 3).collect();
        let built = PairedBitvector1L::<64>::from_bits(raw.iter().copied());
        let mut grown = PairedBitvector1L::<64>::from_bits(std::iter::empty());
        for &bit in &raw {
            grown.push_back(bit);
        }
        for i in 0..=raw.len() {
            assert_eq!(built.rank(i), grown.rank(i), "index {i}");
        }
    }

    #[test]
    fn superblock_boundary_scenario() {
        let raw: Vec<bool> = (0..512 * 3 + 50).map(|i| i % 13 == 0).collect();
        let bv = PairedBitvector2L::<64, 512>::from_bits(raw.iter().copied());
        for i in 0..=raw.len() {
            assert_eq!(naive_rank(&raw, i), bv.rank(i), "index {i}");
        }
    }

    #[test]
    fn byte_round_trip() {
        let raw: Vec<bool> = (0..900).map(|i| i % 4 == 0).collect();
        let bv = PairedBitvector2L::<64, 256>::from_bits(raw.iter().copied());
        let bytes = bv.to_bytes();
        let restored = PairedBitvector2L::<64, 256>::from_bytes(&bytes).unwrap();
        for i in 0..=raw.len() {
            assert_eq!(bv.rank(i), restored.rank(i), "index {i}");
        }
    }

    #[test]
    fn empty_bitvector() {
        let bv = PairedBitvector2L::<64, 256>::from_bits(std::iter::empty());
        assert!(bv.is_empty());
        assert_eq!(0, bv.rank(0));
    }
}
