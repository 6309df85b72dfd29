//! Rank-supporting bitvectors: a raw bit sequence augmented with auxiliary counters so that
//! `rank(i)` (the number of set bits in `[0, i)`) runs in O(1) instead of O(i).
//!
//! Four variants are provided, trading memory overhead for lookup cost differently:
//!
//! - [`Bitvector1L`]: one counter per block, no superblock layer. Simplest, largest overhead.
//! - [`Bitvector2L`]: blocks grouped into superblocks, each level its own counter table.
//! - [`PairedBitvector1L`] / [`PairedBitvector2L`]: the same two layouts, but neighbouring
//!   blocks share one counter at their midpoint instead of each block carrying its own,
//!   roughly halving the block-level table at the cost of one extra masked popcount for
//!   queries that land in the second half of a pair.
//!
//! All four implement [`crate::traits::RankedBitvector`] and are used interchangeably as the
//! per-bit-plane storage underneath [`crate::wavelet::FlattenedString`].
mod one_level;
mod paired;
mod two_level;

pub use one_level::Bitvector1L;
pub use paired::{PairedBitvector1L, PairedBitvector2L};
pub use two_level::Bitvector2L;
