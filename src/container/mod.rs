//! EAppX / EMsiX container parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: the header, part table records and format constants
//! - [`cursor`]: bounds-checked sequential reads over the header region
//! - [`parser`]: magic, header and part table decoding, part reads and inflate
//! - [`blockmap`]: names parts from the embedded block map
//! - [`manifest`]: marks nested packages from a bundle's manifest
//! - [`extractor`]: writes a container's parts and recurses into nested packages
//!
//! ## Format Overview
//!
//! A container starts with a 4-byte magic (`EXPH`/`EXSH` for a package,
//! `EXBH` for a bundle) and a 2-byte header size, followed by the header
//! fields. The part table is a run of 40-byte records located by the
//! header; the last part is normally the block map, an XML document that
//! gives each part id its file name. A bundle additionally stores a
//! manifest whose `<Packages>` entries point at parts that are complete
//! containers of their own, addressed relative to the bundle.
//!
//! ## Limitations
//!
//! - Encrypted parts are written as stored; nothing is decrypted
//! - Signatures and block map hashes are not verified

pub mod blockmap;
pub mod cursor;
pub mod extractor;
pub mod manifest;
pub mod parser;
pub mod structures;
mod xml;

pub use extractor::{
    Container, ContainerExtractor, ContainerFailure, ExtractOptions, ExtractedFile,
    ExtractionReport,
};
pub use parser::ContainerParser;
pub use structures::*;
