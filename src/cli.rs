use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

use crate::container::{EncryptionPolicy, ExtractOptions};

#[derive(Parser, Debug)]
#[command(name = "unpeax")]
#[command(version)]
#[command(about = "Extract EAppX/EMsiX packages and bundles (without decrypting)", long_about = None)]
#[command(after_help = "Examples:\n  \
  unpeax App.eappxbundle            extract into ./App\n  \
  unpeax -d out App.emsix           extract into ./out\n  \
  unpeax -v -l App.eappx            show the header and part table")]
pub struct Cli {
    /// Container file path
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// List parts (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely, with the decoded header
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files into exdir (default: FILE without its extension)
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Never overwrite existing files (the default)
    #[arg(short = 'n', conflicts_with = "overwrite")]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Which `flags` value marks a part as encrypted.
    ///
    /// `key-slot` (default) treats any flags other than 0xFFFF as a key slot
    /// index. `zero` marks only parts with flags 0, as the reference
    /// extractor does.
    #[arg(long, value_enum, default_value_t = EncryptionPolicy::KeySlot)]
    pub encrypted_flag: EncryptionPolicy,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn output_dir(&self) -> PathBuf {
        self.extract_dir
            .clone()
            .unwrap_or_else(|| self.file.with_extension(""))
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            overwrite: self.overwrite && !self.never_overwrite,
            encryption: self.encrypted_flag,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (0, true) => LevelFilter::Debug,
            (0, false) => LevelFilter::Info,
            (1, _) => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    }
}
