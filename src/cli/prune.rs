//! Prune command implementation: one-shot deletion of old archives.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use clap::Args;

use crate::config::Config;
use crate::retention::prune_archives;

/// Arguments for the prune command
#[derive(Args)]
pub struct PruneArgs {
    /// Directory containing archives
    pub dir: PathBuf,

    /// Delete archives older than this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_age: Option<u64>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the prune command
pub async fn run(args: PruneArgs) -> anyhow::Result<()> {
    let config =
        Config::load_or_default(args.config.as_deref()).context("failed to load configuration")?;

    let max_age = args
        .max_age
        .or(config.retention.max_age_seconds)
        .context("no retention age configured; pass --max-age or set [retention] in the config")?;

    let stats = prune_archives(
        &args.dir,
        Duration::from_secs(max_age),
        SystemTime::now(),
    )?;

    println!(
        "Examined {} archive(s), deleted {}",
        stats.examined, stats.deleted
    );
    if !stats.errors.is_empty() {
        println!("Errors: {}", stats.errors.len());
        super::report_file_errors(&stats.errors);
    }

    Ok(())
}
