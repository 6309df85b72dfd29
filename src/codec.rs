//! Byte (de)serialization shared by every rank-supporting structure in this crate.
//!
//! The wire format is a flat, length-prefixed concatenation of little-endian integers (see
//! each type's [`ByteEncode`] impl for its exact layout); there is no version tag or magic
//! number, matching the "no I/O or resource failures in the core" stance of the rest of the
//! library. A short or truncated buffer is reported as [`crate::error::Error::CorruptArchive`].
use crate::error::{Error, Result};

/// Symmetric save/load to a stream of opaque bytes.
pub trait ByteEncode: Sized {
    /// Serializes `self` to a freshly-allocated byte buffer.
    fn to_bytes(&self) -> Vec<u8>;

    /// Deserializes a value previously produced by [`ByteEncode::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

pub(crate) fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn write_u64_slice(buf: &mut Vec<u8>, values: &[u64]) {
    write_u64(buf, values.len() as u64);
    for &v in values {
        write_u64(buf, v);
    }
}

pub(crate) fn write_u16_slice(buf: &mut Vec<u8>, values: &[u16]) {
    write_u64(buf, values.len() as u64);
    for &v in values {
        write_u16(buf, v);
    }
}

/// Writes a length-prefixed, opaque byte blob, used to nest one type's archive inside
/// another's (e.g. a level bitvector's bytes inside a wavelet string's archive).
pub(crate) fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_u64(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// A cursor over an immutable byte slice used while decoding an archive.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let out_of_bounds = self
            .pos
            .checked_add(n)
            .map_or(true, |end| end > self.data.len());
        if out_of_bounds {
            return Err(Error::CorruptArchive(format!(
                "expected {n} more bytes at offset {} but only {} remain",
                self.pos,
                self.data.len() - self.pos
            )));
        }
        let end = self.pos + n;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(u64::from_le_bytes(bytes))
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let bytes: [u8; 2] = self.take(2)?.try_into().unwrap();
        Ok(u16::from_le_bytes(bytes))
    }

    pub(crate) fn read_u64_vec(&mut self) -> Result<Vec<u64>> {
        let len = self.read_u64()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(self.read_u64()?);
        }
        Ok(out)
    }

    pub(crate) fn read_u16_vec(&mut self) -> Result<Vec<u16>> {
        let len = self.read_u64()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(self.read_u16()?);
        }
        Ok(out)
    }

    pub(crate) fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u64()? as usize;
        self.take(len)
    }
}
