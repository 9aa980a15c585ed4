//! Main entry point for the unpeax CLI application.
//!
//! Maps the input container once and either lists its parts or extracts
//! everything, nested bundle packages included.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;

use unpeax::container::Container;
use unpeax::{Cli, ContainerExtractor, MappedFileReader};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();

    let reader = MappedFileReader::open(&cli.file)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;
    let extractor = ContainerExtractor::with_options(Arc::new(reader), cli.extract_options());

    // List mode: display the resolved part table and exit
    if cli.list || cli.verbose {
        let container = extractor
            .open(0)
            .await
            .with_context(|| format!("{}: not a readable container", cli.file.display()))?;
        list_parts(&container, cli.verbose);
        return Ok(());
    }

    let output_dir = cli.output_dir();
    let report = extractor
        .extract(&output_dir)
        .await
        .with_context(|| format!("failed to extract {}", cli.file.display()))?;

    log::info!(
        "{} files extracted to {}, {} skipped",
        report.files.len(),
        output_dir.display(),
        report.skipped.len()
    );

    if !report.failures.is_empty() {
        for failure in &report.failures {
            log::error!("{}: {}", failure.path.display(), failure.error);
        }
        bail!("{} nested package(s) could not be extracted", report.failures.len());
    }

    Ok(())
}

/// List the parts of a container.
///
/// - Simple format (`-l`): resolved part paths, one per line
/// - Verbose format (`-v`): the decoded header, then a table of every part
fn list_parts(container: &Container, verbose: bool) {
    if !verbose {
        for part in &container.parts {
            println!("{}", part.path);
        }
        return;
    }

    println!("{}", container.header);
    println!(
        "{:>8}  {:>6}  {:>3}  {:>10}  {:>10}  {:>10}  Name",
        "Id", "Flags", "Zip", "Offset", "Length", "Size"
    );
    println!("{}", "-".repeat(70));

    let mut total_stored = 0u64;
    let mut total_size = 0u64;
    for part in &container.parts {
        let marker = if part.is_package { "  [package]" } else { "" };
        println!(
            "{:>8x}  {:>#6x}  {:>3}  {:>#10x}  {:>10}  {:>10}  {}{}",
            part.id, part.flags, part.zipped, part.pos, part.len, part.len_orig, part.path, marker
        );
        total_stored += part.len;
        total_size += part.len_orig;
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>44}  {:>10}  {} parts",
        total_stored,
        total_size,
        container.parts.len()
    );
}
