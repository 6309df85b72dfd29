//! Σ-ary symbol strings with per-symbol rank support, built as a pointerless wavelet matrix
//! (Claude, Navarro & Ordóñez, "The Wavelet Matrix", 2015): `D = ceil(log2(Σ))` bitvectors, one
//! per level, with no tree pointers between them.
//!
//! Construction stably partitions the sequence by bit `d` (MSB first) at every level, so that
//! descending by a symbol's bits never needs to touch anything but the current index. Queries
//! narrow a position through the same per-level bitvectors that construction built.
mod flattened;

pub use flattened::{FlattenedBitvectors2L, FlattenedString, PairedFlattenedBitvectors2L};
