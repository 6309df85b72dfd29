use thiserror::Error;

/// Errors surfaced by the fallible corners of the library: building a structure from
/// malformed input, and reading back a corrupt byte archive.
///
/// Out-of-range queries (`symbol`/`rank` past the end of the sequence) are programming
/// errors instead: they are checked with `debug_assert!` and left undefined in release
/// builds, matching the rest of this crate's bounds-checking style.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Construction input didn't match the shape the constructor expected, e.g. a packed
    /// word range whose bit length doesn't agree with the requested logical length.
    #[error("invalid construction input: {0}")]
    InvalidInput(String),

    /// A byte archive produced by [`crate::codec::ByteEncode::to_bytes`] failed to parse:
    /// truncated input, a length prefix that doesn't fit the remaining bytes, or similar.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),
}

pub type Result<T> = std::result::Result<T, Error>;
