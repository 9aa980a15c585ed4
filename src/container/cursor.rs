//! Sequential reader over a container's header region.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Forward-only cursor over a bounded header region.
///
/// Every read checks that it stays inside the region, so a header whose
/// length prefixes point past `header_size` fails with
/// [`Error::OutOfBounds`] instead of reading neighbouring data.
pub struct HeaderCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(width)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::OutOfBounds {
                offset: self.pos,
                width,
                limit: self.data.len(),
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    /// Decode `byte_len` bytes of little-endian UTF-16. A trailing odd byte is dropped.
    pub fn read_utf16(&mut self, byte_len: usize) -> Result<String> {
        let bytes = self.take(byte_len)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}
