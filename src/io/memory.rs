use super::{ReadAt, copy_from_slice_at};
use crate::error::Result;
use async_trait::async_trait;

/// Reader over an owned in-memory buffer
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice_at(&self.data, offset, buf))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
