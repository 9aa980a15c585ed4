mod memory;
mod mmap;

pub use memory::MemoryReader;
pub use mmap::MappedFileReader;

use async_trait::async_trait;
use std::io::ErrorKind;

use crate::error::Result;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Fails with [`ErrorKind::UnexpectedEof`] if the window does not lie
    /// entirely inside the source.
    async fn read_range(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        if offset.checked_add(len).is_none_or(|end| end > self.size()) {
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "range {offset:#x}+{len:#x} is outside the source ({:#x} bytes)",
                    self.size()
                ),
            )
            .into());
        }

        let mut buf = vec![0u8; len as usize];
        let read = self.read_at(offset, &mut buf).await?;
        if read != buf.len() {
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("short read at {offset:#x}: {read} of {len} bytes"),
            )
            .into());
        }
        Ok(buf)
    }
}

/// Copy the overlap of `data[offset..]` and `buf`, returning the copied length.
fn copy_from_slice_at(data: &[u8], offset: u64, buf: &mut [u8]) -> usize {
    let Ok(start) = usize::try_from(offset) else {
        return 0;
    };
    if start >= data.len() {
        return 0;
    }
    let n = buf.len().min(data.len() - start);
    buf[..n].copy_from_slice(&data[start..start + n]);
    n
}
