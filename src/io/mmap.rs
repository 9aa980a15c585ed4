use super::{ReadAt, copy_from_slice_at};
use crate::error::Result;
use async_trait::async_trait;
use memmap2::Mmap;
use std::path::Path;

/// Read-only memory map of a local container file.
///
/// The file is mapped once and shared by every nested container read,
/// each of which only addresses it through its own base offset.
pub struct MappedFileReader {
    mmap: Option<Mmap>,
}

impl MappedFileReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // Zero-length files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None });
        }
        // SAFETY: the mapping is only ever read; concurrent truncation of the
        // input by another process is outside what this tool guards against.
        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(Self { mmap: Some(mmap) })
    }

    fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl ReadAt for MappedFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        Ok(copy_from_slice_at(self.bytes(), offset, buf))
    }

    fn size(&self) -> u64 {
        self.bytes().len() as u64
    }
}
