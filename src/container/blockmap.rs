//! Block map resolution: part ids to logical file paths.
//!
//! The block map is itself a part of the container. Each direct child of
//! its root element that carries both an `Id` (hexadecimal) and a `Name`
//! attribute names the part with that id. Children without both
//! attributes describe other metadata and are skipped.

use crate::error::{Error, Result};

use super::structures::PartEntry;
use super::xml::{non_empty_attribute, walk_elements};

const DOCUMENT: &str = "block map";

/// One `Id`/`Name` pair from the block map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMapFile {
    pub id: u32,
    /// Name with `\` separators normalized to `/`
    pub name: String,
}

/// Extract the `Id`/`Name` pairs from a block map document, in document order.
///
/// # Errors
///
/// Returns [`Error::XmlParse`] if the document is not well formed or an
/// `Id` attribute is not a hexadecimal number.
pub fn parse_block_map(xml: &[u8]) -> Result<Vec<BlockMapFile>> {
    let mut files = Vec::new();
    walk_elements(xml, DOCUMENT, |ancestors, element| {
        if ancestors.len() != 1 {
            return Ok(());
        }
        let id = non_empty_attribute(element, "Id", DOCUMENT)?;
        let name = non_empty_attribute(element, "Name", DOCUMENT)?;
        if let (Some(id), Some(name)) = (id, name) {
            let id = u32::from_str_radix(id.trim(), 16)
                .map_err(|_| Error::xml(DOCUMENT, format!("invalid Id attribute {id:?}")))?;
            files.push(BlockMapFile {
                id,
                name: name.replace('\\', "/"),
            });
        }
        Ok(())
    })?;
    Ok(files)
}

/// Rename every part whose id appears in `files`. Returns the number of renames.
pub fn apply_block_map(files: &[BlockMapFile], parts: &mut [PartEntry]) -> usize {
    let mut renamed = 0;
    for file in files {
        if let Some(part) = parts.iter_mut().find(|p| p.id == file.id) {
            part.path.clone_from(&file.name);
            renamed += 1;
        }
    }
    renamed
}

/// Pick the part table index of the block map.
///
/// The part whose id equals the header's `block_map_file_id` wins. When no
/// part carries that id, or the header does not declare one, the last
/// entry is assumed, which is where writers place it. Disagreements are
/// logged.
pub fn locate_block_map(parts: &[PartEntry], block_map_file_id: Option<u64>) -> Option<usize> {
    let last = parts.len().checked_sub(1)?;
    let Some(block_map_file_id) = block_map_file_id else {
        log::debug!("header declares no block map id; using the last part");
        return Some(last);
    };
    match parts
        .iter()
        .position(|p| u64::from(p.id) == block_map_file_id)
    {
        Some(index) => {
            if index != last {
                log::warn!(
                    "block map id {block_map_file_id:#x} is part {index}, not the last of {} parts",
                    parts.len()
                );
            }
            Some(index)
        }
        None => {
            log::warn!(
                "no part has block map id {block_map_file_id:#x}; assuming the last part is the block map"
            );
            Some(last)
        }
    }
}

/// Parse the block map document and apply it to `parts`.
pub fn resolve_block_map(xml: &[u8], parts: &mut [PartEntry]) -> Result<usize> {
    let files = parse_block_map(xml)?;
    Ok(apply_block_map(&files, parts))
}
