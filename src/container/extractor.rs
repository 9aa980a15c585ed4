use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::blockmap::{locate_block_map, resolve_block_map};
use super::manifest::{apply_bundle_manifest, locate_bundle_manifest, parse_bundle_manifest};
use super::parser::{ContainerParser, absolute_offset};
use super::structures::*;

/// Extraction settings
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Replace files that already exist in the output directory
    pub overwrite: bool,
    pub encryption: EncryptionPolicy,
}

/// A decoded container with its part names resolved
#[derive(Debug, Clone)]
pub struct Container {
    pub base: u64,
    pub header: ContainerHeader,
    pub parts: Vec<PartEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: PathBuf,
    pub size: u64,
    pub encrypted: bool,
}

/// A nested container whose extraction was abandoned
#[derive(Debug)]
pub struct ContainerFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of one extraction run
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub files: Vec<ExtractedFile>,
    /// Outputs left alone because they already existed
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<ContainerFailure>,
}

/// Container extractor
pub struct ContainerExtractor<R: ReadAt> {
    parser: ContainerParser<R>,
    options: ExtractOptions,
}

impl<R: ReadAt> ContainerExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_options(reader, ExtractOptions::default())
    }

    pub fn with_options(reader: Arc<R>, options: ExtractOptions) -> Self {
        Self {
            parser: ContainerParser::new(reader),
            options,
        }
    }

    /// Decode the container at `base` and resolve its part names
    pub async fn open(&self, base: u64) -> Result<Container> {
        let header = self.parser.read_header(base).await?;
        let parts = self.resolve_parts(base, &header).await?;
        Ok(Container {
            base,
            header,
            parts,
        })
    }

    /// Read the part table and apply the block map and, for bundles, the
    /// bundle manifest.
    async fn resolve_parts(&self, base: u64, header: &ContainerHeader) -> Result<Vec<PartEntry>> {
        let mut parts = self.parser.read_part_table(base, header).await?;
        log::debug!(
            "container at {base:#x}: {} parts, {} declared",
            parts.len(),
            header.file_count
        );

        if let Some(index) = locate_block_map(&parts, header.block_map_file_id) {
            parts[index].path = BLOCK_MAP_PATH.to_string();
            let xml = self.parser.read_part(base, &parts[index]).await?;
            let renamed = resolve_block_map(&xml, &mut parts)?;
            log::debug!("block map named {renamed} parts");
        }

        if header.kind.is_bundle() {
            match locate_bundle_manifest(&parts) {
                Some(index) => {
                    let xml = self.parser.read_part(base, &parts[index]).await?;
                    let packages = parse_bundle_manifest(&xml)?;
                    let marked = apply_bundle_manifest(&packages, &mut parts);
                    log::debug!("bundle manifest marked {marked} packages");
                }
                None => log::warn!("bundle at {base:#x} has no {BUNDLE_MANIFEST_PATH}"),
            }
        }

        Ok(parts)
    }

    /// Extract the container at offset 0 and everything nested in it into `output_dir`.
    ///
    /// Errors in the top-level container are returned. Errors in a nested
    /// package are recorded in the report and extraction moves on to the
    /// next part.
    pub async fn extract(&self, output_dir: &Path) -> Result<ExtractionReport> {
        let mut report = ExtractionReport::default();
        self.extract_container(0, output_dir, &mut report).await?;
        Ok(report)
    }

    async fn extract_container(
        &self,
        base: u64,
        dir: &Path,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let header = self.parser.read_header(base).await?;

        let side_files = [
            (&header.signature, SIGNATURE_PATH),
            (&header.code_integrity, CODE_INTEGRITY_PATH),
        ];
        for (descriptor, name) in side_files {
            if !descriptor.is_present() {
                continue;
            }
            let data = self
                .parser
                .read_data(
                    absolute_offset(base, descriptor.offset)?,
                    descriptor.len as u64,
                    descriptor.compression(),
                    name,
                )
                .await?;
            self.write_output(dir, name, &data, false, report).await?;
        }

        let parts = self.resolve_parts(base, &header).await?;

        for part in &parts {
            if part.is_package {
                let child_dir = dir.join(safe_relative_path(&part.path).with_extension(""));
                if let Err(error) = self.extract_package(base, part, &child_dir, report).await {
                    log::error!("{}: {error}", child_dir.display());
                    report.failures.push(ContainerFailure {
                        path: child_dir,
                        error,
                    });
                }
            } else {
                let data = self.parser.read_part(base, part).await?;
                let encrypted = self.options.encryption.is_encrypted(part.flags);
                self.write_output(dir, &part.path, &data, encrypted, report)
                    .await?;
            }
        }

        Ok(())
    }

    async fn extract_package(
        &self,
        base: u64,
        part: &PartEntry,
        dir: &Path,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        // A package at offset 0 would be the bundle itself.
        if part.pos == 0 {
            return Err(Error::RecursiveContainer { offset: base });
        }
        let nested = absolute_offset(base, part.pos)?;
        Box::pin(self.extract_container(nested, dir, report)).await
    }

    async fn write_output(
        &self,
        dir: &Path,
        name: &str,
        data: &[u8],
        encrypted: bool,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let output_path = dir.join(safe_relative_path(name));

        if !self.options.overwrite && fs::try_exists(&output_path).await? {
            log::warn!("Skipping: {} (use -o to overwrite)", output_path.display());
            report.skipped.push(output_path);
            return Ok(());
        }

        if encrypted {
            log::info!("  extracting: {} [encrypted]", output_path.display());
        } else {
            log::info!("  extracting: {}", output_path.display());
        }

        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&output_path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        report.files.push(ExtractedFile {
            path: output_path,
            size: data.len() as u64,
            encrypted,
        });
        Ok(())
    }
}

/// Turn a part path into a relative path that stays under the output directory.
///
/// Both separators are accepted; empty, `.` and `..` segments and drive
/// prefixes are dropped.
pub fn safe_relative_path(name: &str) -> PathBuf {
    let path: PathBuf = name
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | "..") && !segment.ends_with(':'))
        .collect();
    if path.as_os_str().is_empty() {
        PathBuf::from("unnamed")
    } else {
        path
    }
}
