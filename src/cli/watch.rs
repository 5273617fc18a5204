//! Watch command implementation: periodic backups into timestamped archives,
//! with optional pruning of archives past the retention age after each run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;

use crate::config::Config;
use crate::engine::{BackupEngine, BackupJob, BackupOutcome};
use crate::error::Error;
use crate::report::format_bytes;
use crate::retention::prune_archives;
use crate::rules::{RuleSet, RuleSpec};

/// Arguments for the watch command
#[derive(Args)]
pub struct WatchArgs {
    /// Directory tree to back up
    pub root: PathBuf,

    /// Directory receiving timestamped archives
    pub output: PathBuf,

    #[command(flatten)]
    pub selection: super::SelectionArgs,

    /// Seconds between backups
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Delete archives older than this many seconds after each run
    #[arg(long, value_name = "SECS")]
    pub max_age: Option<u64>,

    /// Deflate level (0-9)
    #[arg(long, value_name = "LEVEL")]
    pub compression_level: Option<i32>,
}

/// Run the watch command until interrupted
pub async fn run(args: WatchArgs, cli_rules: Vec<RuleSpec>) -> anyhow::Result<()> {
    let config = Config::load_or_default(args.selection.config.as_deref())
        .context("failed to load configuration")?;

    let specs = if cli_rules.is_empty() {
        config.rules.clone()
    } else {
        cli_rules
    };
    let rules = RuleSet::compile(&specs)?;
    let level = args.compression_level.unwrap_or(config.compression_level);
    let interval = Duration::from_secs(args.interval.unwrap_or(config.watch.interval_seconds));
    let max_age = args
        .max_age
        .or(config.retention.max_age_seconds)
        .map(Duration::from_secs);

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let prefix = args
        .root
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("backup")
        .to_string();

    let engine = Arc::new(BackupEngine::new());
    let token = engine.cancel_token();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    println!(
        "Watching {} -> {} every {} s (Ctrl-C to stop)",
        args.root.display(),
        args.output.display(),
        interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                token.cancel();
            }
        }
        if token.is_cancelled() {
            println!("Stopping watch.");
            break;
        }

        let destination = args.output.join(archive_file_name(&prefix, Utc::now()));
        let job =
            BackupJob::new(&args.root, &destination, rules.clone()).with_compression_level(level);
        let engine_run = Arc::clone(&engine);
        let outcome = tokio::task::spawn_blocking(move || engine_run.run(&job))
            .await
            .context("backup task panicked")?;

        match outcome {
            BackupOutcome::Completed(result) => {
                println!(
                    "{}: {} files, {}",
                    destination.display(),
                    result.files_included,
                    format_bytes(result.bytes_written)
                );
                super::report_file_errors(&result.errors);
            }
            BackupOutcome::Failed {
                error: Error::Cancelled,
                ..
            } => {
                println!("Stopping watch.");
                break;
            }
            BackupOutcome::Failed { error, phase, .. } => {
                eprintln!("Backup failed during {:?}: {}", phase, error);
            }
        }

        if let Some(max_age) = max_age {
            match prune_archives(&args.output, max_age, SystemTime::now()) {
                Ok(stats) if stats.deleted > 0 => {
                    println!("Pruned {} old archive(s)", stats.deleted);
                }
                Ok(_) => {}
                Err(error) => eprintln!("Prune failed: {}", error),
            }
        }
    }

    Ok(())
}

fn archive_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.zip", prefix, now.format("%Y-%m-%d-%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn archive_names_are_timestamped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 9, 11).unwrap();
        assert_eq!(
            archive_file_name("world", now),
            "world_2024-03-05-07-09-11.zip"
        );
    }
}
