use crate::bit_vec::BitVec;
use crate::codec::{self, ByteEncode, ByteReader};
use crate::error::{Error, Result};
use crate::mask;
use crate::traits::{BitGet, BitModify, RankedBitvector};

/// A rank-supporting bitvector with a single level of blocks, each `B` bits wide.
///
/// `rank(i)` looks up the cumulative popcount before the block containing `i` in a table with
/// one entry per block (`l0`), then masks the partial word straddling `i` within that block.
/// `B` must be a multiple of 64 (a whole number of words).
///
/// # Examples
///
/// ```
/// use succinct_rank::bitvector::Bitvector1L;
/// use succinct_rank::traits::RankedBitvector;
///
/// let bv = Bitvector1L::<128>::from_bits([true, false, true, false]);
/// assert_eq!(4, bv.len());
/// assert_eq!(1, bv.rank(1));
/// assert_eq!(2, bv.rank(4));
/// assert!(!bv.symbol(3));
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Bitvector1L<const B: usize> {
    bits: BitVec,
    /// `l0[k]` is the popcount of all bits strictly before block `k`. Has one entry per block
    /// plus one trailing entry for the (possibly partial) block currently being built.
    l0: Vec<u64>,
}

impl<const B: usize> Bitvector1L<B> {
    const CHECK_BLOCK_SIZE: () = assert!(B > 0 && B % 64 == 0, "B must be a positive multiple of 64");
    const WORDS_PER_BLOCK: usize = B / 64;

    /// Builds a [`Bitvector1L`] from an exactly-sized iterator of bits.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_BLOCK_SIZE;
        Self::build(BitVec::from_bits(bits))
    }

    /// Builds a [`Bitvector1L`] from packed 64-bit words plus a logical bit length. See
    /// [`BitVec::from_words`] for the exact contract.
    pub fn from_words(words: Vec<u64>, len: usize) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_BLOCK_SIZE;
        Ok(Self::build(BitVec::from_words(words, len)?))
    }

    fn build(bits: BitVec) -> Self {
        let num_complete_blocks = bits.len() / B;
        let mut l0 = Vec::with_capacity(num_complete_blocks + 1);
        l0.push(0u64);
        let words = bits.words();
        let mut cum = 0u64;
        for k in 0..num_complete_blocks {
            let start = k * Self::WORDS_PER_BLOCK;
            let end = start + Self::WORDS_PER_BLOCK;
            cum += words[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum::<u64>();
            l0.push(cum);
        }
        Self { bits, l0 }
    }

    /// The number of bits in this vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether this vector holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit at `index`.
    #[inline]
    pub fn symbol(&self, index: usize) -> bool {
        self.bits.get_bit(index)
    }

    /// The number of set bits in `[0, index)`.
    pub fn rank(&self, index: usize) -> u64 {
        debug_assert!(
            index <= self.bits.len(),
            "index {index} out of bounds for len {}",
            self.bits.len()
        );
        // `k` is clamped to the highest block we have a cached boundary for; if `index` falls
        // past it (a block still being grown by `push_back`), the remaining distance is just
        // masked directly, since it can never exceed one block's width.
        let max_k = self.l0.len() - 1;
        let k = (index / B).min(max_k);
        let base = self.l0[k];
        let offset = index - k * B;
        let start_word = k * Self::WORDS_PER_BLOCK;
        base + mask::popcount_words_prefix(&self.bits.words()[start_word..], offset)
    }

    /// Appends a single bit, growing the block table whenever a block completes.
    pub fn push_back(&mut self, bit: bool) {
        self.bits.push_back(bit);
        let new_len = self.bits.len();
        if new_len % B == 0 {
            let block_idx = new_len / B - 1;
            let start = block_idx * Self::WORDS_PER_BLOCK;
            let end = start + Self::WORDS_PER_BLOCK;
            let popcount: u64 = self.bits.words()[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum();
            let prev = *self.l0.last().unwrap();
            self.l0.push(prev + popcount);
        }
    }
}

impl<const B: usize> RankedBitvector for Bitvector1L<B> {
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

impl<const B: usize> ByteEncode for Bitvector1L<B> {
    /// Layout: `totalLength` (8 bytes), `l0` table (length-prefixed 8-byte integers, unbounded
    /// since there is no superblock to cap it), then the packed words (length-prefixed).
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_u64(&mut buf, self.bits.len() as u64);
        codec::write_u64_slice(&mut buf, &self.l0);
        codec::write_u64_slice(&mut buf, self.bits.words());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let len = reader.read_u64()? as usize;
        let l0 = reader.read_u64_vec()?;
        let words = reader.read_u64_vec()?;
        let bits = BitVec::from_words(words, len)
            .map_err(|e| Error::CorruptArchive(format!("bad word storage: {e}")))?;
        Ok(Self { bits, l0 })
    }
}
