//! List command implementation: show the entries of a produced archive.

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::report::format_bytes;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Archive to inspect
    pub archive: PathBuf,
}

/// Run the list command
pub async fn run(args: ListArgs) -> anyhow::Result<()> {
    let file = File::open(&args.archive)
        .with_context(|| format!("failed to open {}", args.archive.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", args.archive.display()))?;

    println!("{}: {} entries", args.archive.display(), archive.len());
    let mut total = 0u64;
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        total += entry.size();
        println!("  {:>10}  {}", format_bytes(entry.size()), entry.name());
    }
    println!("Total uncompressed size: {}", format_bytes(total));

    Ok(())
}
