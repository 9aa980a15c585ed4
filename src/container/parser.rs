//! Low-level container parser.
//!
//! Reads the fixed prefix, the header region and the part table of one
//! container from any [`ReadAt`] source. All offsets handed to the parser
//! are relative to a container's base offset, so the same parser serves
//! a top-level container and every package nested inside a bundle.
//!
//! ## Layout
//!
//! 1. 4-byte magic and 2-byte header size
//! 2. Header fields, read sequentially up to `header_size`
//! 3. Part data, addressed by the part table
//! 4. Part table: `footer_length / 40` fixed-size records at `footer_offset`

use byteorder::{ByteOrder, LittleEndian};
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::cursor::HeaderCursor;
use super::structures::*;

/// Low-level parser for one shared data source.
pub struct ContainerParser<R: ReadAt> {
    reader: Arc<R>,
}

impl<R: ReadAt> ContainerParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Read the magic and header size of the container at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMagic`] if the tag is not a known container kind.
    pub async fn read_prefix(&self, base: u64) -> Result<(ContainerKind, u16)> {
        let prefix = self
            .reader
            .read_range(base, HEADER_PREFIX_SIZE as u64)
            .await?;
        let magic = LittleEndian::read_u32(&prefix[0..4]);
        let kind = ContainerKind::from_magic(magic).ok_or(Error::InvalidMagic {
            offset: base,
            found: magic,
        })?;
        Ok((kind, LittleEndian::read_u16(&prefix[4..6])))
    }

    /// Read and decode the full header of the container at `base`.
    pub async fn read_header(&self, base: u64) -> Result<ContainerHeader> {
        let (kind, header_size) = self.read_prefix(base).await?;
        let region = self.reader.read_range(base, header_size as u64).await?;
        decode_header(kind, &region)
    }

    /// Read and decode the part table addressed by `header`.
    pub async fn read_part_table(
        &self,
        base: u64,
        header: &ContainerHeader,
    ) -> Result<Vec<PartEntry>> {
        if header.footer_length % PART_RECORD_SIZE as u64 != 0 {
            return Err(Error::MalformedFooter {
                length: header.footer_length,
            });
        }
        let table = self
            .reader
            .read_range(
                absolute_offset(base, header.footer_offset)?,
                header.footer_length,
            )
            .await?;
        decode_part_table(&table)
    }

    /// Read a stored byte range, inflating it when it is compressed.
    ///
    /// `name` is only used to label inflate failures.
    pub async fn read_data(
        &self,
        offset: u64,
        len: u64,
        compression: Compression,
        name: &str,
    ) -> Result<Vec<u8>> {
        let stored = self.reader.read_range(offset, len).await?;
        match compression {
            Compression::Stored => Ok(stored),
            Compression::Deflate => inflate(&stored, name),
        }
    }

    /// Read the bytes of `part` of the container at `base`.
    pub async fn read_part(&self, base: u64, part: &PartEntry) -> Result<Vec<u8>> {
        let data = self
            .read_data(
                absolute_offset(base, part.pos)?,
                part.len,
                part.compression(),
                &part.path,
            )
            .await?;
        if part.compression() == Compression::Deflate && data.len() as u64 != part.len_orig {
            log::warn!(
                "{}: inflated to {} bytes, part table declares {}",
                part.path,
                data.len(),
                part.len_orig
            );
        }
        Ok(data)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Resolve an offset relative to the container at `base`.
///
/// Offsets come straight from the input, so a sum past `u64::MAX` is
/// reported like any other window outside the source.
pub fn absolute_offset(base: u64, offset: u64) -> Result<u64> {
    base.checked_add(offset).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("offset {offset:#x} from container at {base:#x} overflows"),
        )
        .into()
    })
}

/// Decode the header fields from a header region of exactly `header_size` bytes.
///
/// Decoding starts after the 6-byte prefix and stops quietly once the
/// region is used up; fields not reached keep their zero value. A field
/// that straddles the end of the region is an [`Error::OutOfBounds`].
pub fn decode_header(kind: ContainerKind, region: &[u8]) -> Result<ContainerHeader> {
    let mut header = ContainerHeader::new(kind, region.len() as u16);
    let mut cursor = HeaderCursor::new(region, HEADER_PREFIX_SIZE);

    macro_rules! field {
        ($read:expr) => {{
            if cursor.is_exhausted() {
                log::debug!("header region ends at {:#x}", cursor.position());
                return Ok(header);
            }
            $read?
        }};
    }

    header.file_version = field!(cursor.read_u64());
    header.footer_offset = field!(cursor.read_u64());
    header.footer_length = field!(cursor.read_u64());
    header.file_count = field!(cursor.read_u64());

    header.signature.offset = field!(cursor.read_u64());
    header.signature.zipped = field!(cursor.read_u16());
    header.signature.orig_len = field!(cursor.read_u32());
    header.signature.len = field!(cursor.read_u32());

    header.code_integrity.offset = field!(cursor.read_u64());
    header.code_integrity.zipped = field!(cursor.read_u16());
    header.code_integrity.orig_len = field!(cursor.read_u32());
    header.code_integrity.len = field!(cursor.read_u32());

    header.block_map_file_id = Some(field!(cursor.read_u64()));

    let key_bytes = field!(cursor.read_u32());
    let _key_count = field!(cursor.read_u16());
    for _ in 0..key_bytes / 16 {
        let raw = field!(cursor.read_bytes(16));
        let mut id = [0u8; 16];
        id.copy_from_slice(&raw);
        header.keys.push(KeyId(id));
    }

    let _name_chars = field!(cursor.read_u16());
    let name_bytes = field!(cursor.read_u16());
    header.package_name = field!(cursor.read_utf16(name_bytes as usize));

    let algo_bytes = field!(cursor.read_u16());
    header.crypto_algorithm = field!(cursor.read_utf16(algo_bytes as usize));

    header.diffusion_enabled = field!(cursor.read_u16());

    let method_bytes = field!(cursor.read_u16());
    header.block_map_hash_method = field!(cursor.read_utf16(method_bytes as usize));

    let hash_len = field!(cursor.read_u16());
    header.block_map_hash = field!(cursor.read_bytes(hash_len as usize));

    if !cursor.is_exhausted() {
        log::debug!(
            "{} trailing header bytes after block map hash",
            region.len() - cursor.position()
        );
    }

    Ok(header)
}

/// Decode a part table into entries with placeholder paths, in table order.
///
/// # Errors
///
/// Returns [`Error::MalformedFooter`] if the table length is not a multiple
/// of [`PART_RECORD_SIZE`].
pub fn decode_part_table(table: &[u8]) -> Result<Vec<PartEntry>> {
    if table.len() % PART_RECORD_SIZE != 0 {
        return Err(Error::MalformedFooter {
            length: table.len() as u64,
        });
    }

    let parts = table
        .chunks_exact(PART_RECORD_SIZE)
        .enumerate()
        .map(|(index, record)| PartEntry {
            id: LittleEndian::read_u32(&record[8..12]),
            flags: LittleEndian::read_u16(&record[4..6]),
            zipped: LittleEndian::read_u16(&record[6..8]),
            pos: LittleEndian::read_u64(&record[16..24]),
            len_orig: LittleEndian::read_u64(&record[24..32]),
            len: LittleEndian::read_u64(&record[32..40]),
            path: PartEntry::placeholder_path(index),
            is_package: false,
        })
        .collect();

    Ok(parts)
}

/// Inflate a raw DEFLATE stream.
pub fn inflate(data: &[u8], name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|source| Error::Inflate {
            path: name.to_string(),
            source,
        })?;
    Ok(out)
}
