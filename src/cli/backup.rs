//! Backup command implementation.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::config::Config;
use crate::engine::{BackupEngine, BackupJob, BackupOutcome};
use crate::report::{format_bytes, report_path_for, BackupReport};
use crate::rules::{RuleSet, RuleSpec};

/// Arguments for the backup command
#[derive(Args)]
pub struct BackupArgs {
    /// Directory tree to back up
    pub root: PathBuf,

    /// Path of the zip archive to produce
    pub destination: PathBuf,

    #[command(flatten)]
    pub selection: super::SelectionArgs,

    /// Deflate level (0-9)
    #[arg(long, value_name = "LEVEL")]
    pub compression_level: Option<i32>,

    /// Write a JSON run report next to the archive
    #[arg(long)]
    pub report: bool,
}

/// Run the backup command. `cli_rules` is the interleaved rule list from the
/// command line; when empty, the configuration rules apply.
pub async fn run(args: BackupArgs, cli_rules: Vec<RuleSpec>) -> anyhow::Result<()> {
    let config = Config::load_or_default(args.selection.config.as_deref())
        .context("failed to load configuration")?;

    let specs = if cli_rules.is_empty() {
        config.rules.clone()
    } else {
        cli_rules
    };
    let rules = RuleSet::compile(&specs)?;
    let level = args.compression_level.unwrap_or(config.compression_level);

    let job = BackupJob::new(&args.root, &args.destination, rules).with_compression_level(level);
    let report_job = job.clone();

    let engine = BackupEngine::new();
    let token = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || engine.run(&job))
        .await
        .context("backup task panicked")?;

    match outcome {
        BackupOutcome::Completed(result) => {
            println!("Backup completed successfully!");
            println!("==============================");
            println!("Archive:        {}", args.destination.display());
            println!("Files included: {}", result.files_included);
            println!("Bytes written:  {}", format_bytes(result.bytes_written));
            println!("Duration:       {} ms", result.duration_millis);

            if !result.errors.is_empty() {
                println!("Skipped files:  {}", result.errors.len());
                super::report_file_errors(&result.errors);
            }

            if args.report {
                let report = BackupReport::from_run(&report_job, &result)?;
                let path = report_path_for(&args.destination);
                report.write_json(&path)?;
                println!("Report:         {}", path.display());
            }

            Ok(())
        }
        BackupOutcome::Failed {
            error,
            phase,
            partial,
        } => {
            super::report_file_errors(&partial.errors);
            eprintln!(
                "Backup failed during {:?} after {} ms",
                phase, partial.duration_millis
            );
            Err(error.into())
        }
    }
}
