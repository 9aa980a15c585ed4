//! # unpeax
//!
//! Extracts the parts of EAppX / EMsiX packages and bundles, the
//! container format used for protected app packages.
//!
//! This library decodes a container's header and part table, names each
//! part through the embedded block map (and, for bundles, the bundle
//! manifest), inflates compressed parts and recurses into the packages a
//! bundle carries. Encrypted parts are extracted as stored.
//!
//! ## Features
//!
//! - Package (`EXPH`, `EXSH`) and bundle (`EXBH`) containers
//! - Raw DEFLATE compressed parts
//! - Nested packages read in place from one memory map
//! - A failing nested package does not stop its siblings
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use unpeax::{ContainerExtractor, MappedFileReader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(MappedFileReader::open(Path::new("App.eappxbundle"))?);
//!     let extractor = ContainerExtractor::new(reader);
//!
//!     let report = extractor.extract(Path::new("App")).await?;
//!     for file in &report.files {
//!         println!("{}", file.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod container;
pub mod error;
pub mod io;

pub use cli::Cli;
pub use container::{
    ContainerExtractor, ContainerHeader, ContainerKind, EncryptionPolicy, ExtractOptions,
    ExtractionReport, PartEntry,
};
pub use error::{Error, Result};
pub use io::{MappedFileReader, MemoryReader, ReadAt};
