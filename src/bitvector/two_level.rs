use crate::bit_vec::BitVec;
use crate::codec::{self, ByteEncode, ByteReader};
use crate::error::{Error, Result};
use crate::mask;
use crate::traits::{BitGet, BitModify, RankedBitvector};

/// A rank-supporting bitvector with two levels of blocks: `B`-bit blocks grouped into `S`-bit
/// superblocks.
///
/// `rank(i)` adds the cumulative popcount before the superblock containing `i` (`l1`, one u64
/// per superblock), the cumulative popcount before the block within that superblock (`l0`,
/// reset to zero at every superblock boundary), and a masked popcount of the partial word
/// straddling `i`. `S` must be a multiple of `B`, and `B` a multiple of 64.
///
/// # Examples
///
/// ```
/// use succinct_rank::bitvector::Bitvector2L;
/// use succinct_rank::traits::RankedBitvector;
///
/// let bv = Bitvector2L::<64, 256>::from_bits((0..1000).map(|i| i % 3 == 0));
/// assert_eq!(1000, bv.len());
/// assert_eq!(bv.rank(500), (0..500).filter(|i| i % 3 == 0).count() as u64);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Bitvector2L<const B: usize, const S: usize> {
    bits: BitVec,
    /// `l0[k]` is the popcount of blocks before block `k`, reset to zero at the start of each
    /// superblock. One entry per block plus a trailing entry for the block in progress.
    l0: Vec<u32>,
    /// `l1[s]` is the popcount of all bits before superblock `s`. One entry per superblock
    /// plus a trailing entry for the superblock in progress.
    l1: Vec<u64>,
}

impl<const B: usize, const S: usize> Bitvector2L<B, S> {
    const CHECK_SIZES: () = assert!(
        B > 0 && B % 64 == 0 && S > 0 && S % B == 0,
        "B must be a positive multiple of 64, and S a positive multiple of B"
    );
    const WORDS_PER_BLOCK: usize = B / 64;
    const BLOCKS_PER_SUPERBLOCK: usize = S / B;

    /// Builds a [`Bitvector2L`] from an exactly-sized iterator of bits.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
        I::IntoIter: ExactSizeIterator,
    {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_SIZES;
        Self::build(BitVec::from_bits(bits))
    }

    /// Builds a [`Bitvector2L`] from packed 64-bit words plus a logical bit length.
    pub fn from_words(words: Vec<u64>, len: usize) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CHECK_SIZES;
        Ok(Self::build(BitVec::from_words(words, len)?))
    }

    fn build(bits: BitVec) -> Self {
        let n = bits.len();
        let words = bits.words();

        let num_complete_superblocks = n / S;
        let mut l1 = Vec::with_capacity(num_complete_superblocks + 1);
        l1.push(0u64);
        let mut cum = 0u64;
        for s in 0..num_complete_superblocks {
            let start = s * Self::BLOCKS_PER_SUPERBLOCK * Self::WORDS_PER_BLOCK;
            let end = start + Self::BLOCKS_PER_SUPERBLOCK * Self::WORDS_PER_BLOCK;
            cum += words[start..end]
                .iter()
                .map(|w| w.count_ones() as u64)
                .sum::<u64>();
            l1.push(cum);
        }

        let num_complete_blocks = n / B;
        let mut l0 = Vec::with_capacity(num_complete_blocks + 1);
        l0.push(0u32);
        let mut within = 0u32;
        for k in 0..num_complete_blocks {
            if k % Self::BLOCKS_PER_SUPERBLOCK == 0 {
                within = 0;
            }
            let start = k * Self::WORDS_PER_BLOCK;
            let end = start + Self::WORDS_PER_BLOCK;
            within += words[start..end].iter().map(|w| w.count_ones()).sum::<u32>();
            l0.push(within);
        }

        Self { bits, l0, l1 }
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
        let max_s = self.l1.len() - 1;
        let s = (index / S).min(max_s);
        let max_k = self.l0.len() - 1;
        let k = (index / B).min(max_k);
        let base = self.l1[s] + self.l0[k] as u64;
        let offset = index - k * B;
        let start_word = k * Self::WORDS_PER_BLOCK;
        base + mask::popcount_words_prefix(&self.bits.words()[start_word..], offset)
    }

    /// Appends a single bit, growing the block and superblock tables whenever a boundary
    /// completes.
    pub fn push_back(&mut self, bit: bool) {
        self.bits.push_back(bit);
        let new_len = self.bits.len();
        if new_len % B == 0 {
            let block_idx = new_len / B - 1;
            let start = block_idx * Self::WORDS_PER_BLOCK;
            let end = start + Self::WORDS_PER_BLOCK;
            let popcount: u32 = self.bits.words()[start..end]
                .iter()
                .map(|w| w.count_ones())
                .sum();
            let within = if block_idx % Self::BLOCKS_PER_SUPERBLOCK == 0 {
                0
            } else {
                *self.l0.last().unwrap()
            };
            self.l0.push(within + popcount);
        }
        if new_len % S == 0 {
            let superblock_popcount = *self.l0.last().unwrap() as u64;
            let prev_total = *self.l1.last().unwrap();
            self.l1.push(prev_total + superblock_popcount);
        }
    }
}

impl<const B: usize, const S: usize> RankedBitvector for Bitvector2L<B, S> {
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

impl<const B: usize, const S: usize> ByteEncode for Bitvector2L<B, S> {
    /// Layout: `totalLength` (8 bytes), `l1` (length-prefixed 8-byte integers), `l0`
    /// (length-prefixed 2-byte integers, valid as long as `S <= 65536`), then the packed words.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::write_u64(&mut buf, self.bits.len() as u64);
        codec::write_u64_slice(&mut buf, &self.l1);
        debug_assert!(
            self.l0.iter().all(|&v| v <= u16::MAX as u32),
            "block-local popcount overflowed u16; S is too large for this archive format"
        );
        let l0: Vec<u16> = self.l0.iter().map(|&v| v as u16).collect();
        codec::write_u16_slice(&mut buf, &l0);
        codec::write_u64_slice(&mut buf, self.bits.words());
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let len = reader.read_u64()? as usize;
        let l1 = reader.read_u64_vec()?;
        let l0 = reader.read_u16_vec()?.into_iter().map(u32::from).collect();
        let words = reader.read_u64_vec()?;
        let bits = BitVec::from_words(words, len)
            .map_err(|e| Error::CorruptArchive(format!("bad word storage: {e}")))?;
        Ok(Self { bits, l0, l1 })
    }
}
