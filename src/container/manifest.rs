//! Bundle manifest resolution: part offsets to nested package file names.

use crate::error::{Error, Result};

use super::structures::{BUNDLE_MANIFEST_PATH, PartEntry};
use super::xml::{non_empty_attribute, walk_elements};

const DOCUMENT: &str = "bundle manifest";

/// One child of the manifest's `<Packages>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePackage {
    /// Offset of the package, relative to the bundle's base offset
    pub offset: u64,
    pub file_name: String,
}

/// Extract the `Offset`/`FileName` pairs listed under `<Packages>`.
///
/// # Errors
///
/// Returns [`Error::XmlParse`] if the document is not well formed or an
/// `Offset` attribute is not a decimal number.
pub fn parse_bundle_manifest(xml: &[u8]) -> Result<Vec<BundlePackage>> {
    let mut packages = Vec::new();
    walk_elements(xml, DOCUMENT, |ancestors, element| {
        if ancestors.len() != 2 || ancestors[1] != b"Packages" {
            return Ok(());
        }
        let offset = non_empty_attribute(element, "Offset", DOCUMENT)?;
        let file_name = non_empty_attribute(element, "FileName", DOCUMENT)?;
        if let (Some(offset), Some(file_name)) = (offset, file_name) {
            let offset = offset
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::xml(DOCUMENT, format!("invalid Offset attribute {offset:?}")))?;
            packages.push(BundlePackage { offset, file_name });
        }
        Ok(())
    })?;
    Ok(packages)
}

/// Mark the parts stored at each package offset as nested packages.
/// Returns the number of parts marked.
pub fn apply_bundle_manifest(packages: &[BundlePackage], parts: &mut [PartEntry]) -> usize {
    let mut marked = 0;
    for package in packages {
        if let Some(part) = parts.iter_mut().find(|p| p.pos == package.offset) {
            part.path.clone_from(&package.file_name);
            part.is_package = true;
            marked += 1;
        } else {
            log::warn!(
                "bundle manifest lists {} at offset {}, but no part is stored there",
                package.file_name,
                package.offset
            );
        }
    }
    marked
}

/// Index of the bundle manifest part, once block map names are applied.
pub fn locate_bundle_manifest(parts: &[PartEntry]) -> Option<usize> {
    parts.iter().position(|p| p.path == BUNDLE_MANIFEST_PATH)
}
