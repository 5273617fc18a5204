//! Scan command implementation: evaluate the rule set without writing
//! anything, so patterns can be checked before a real backup.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::config::Config;
use crate::engine::FileError;
use crate::error::Error;
use crate::report::format_bytes;
use crate::rules::{RuleSet, RuleSpec};
use crate::selector::{Selection, Selector};

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Directory tree to evaluate
    pub root: PathBuf,

    #[command(flatten)]
    pub selection: super::SelectionArgs,
}

/// Run the scan command
pub async fn run(args: ScanArgs, cli_rules: Vec<RuleSpec>) -> anyhow::Result<()> {
    let config = Config::load_or_default(args.selection.config.as_deref())
        .context("failed to load configuration")?;

    let specs = if cli_rules.is_empty() {
        config.rules.clone()
    } else {
        cli_rules
    };
    let rules = RuleSet::compile(&specs)?;

    if !args.root.is_dir() {
        return Err(Error::RootNotFound {
            path: args.root.display().to_string(),
        }
        .into());
    }

    let selector = Selector::new(&args.root, rules);
    let mut files = 0u64;
    let mut bytes = 0u64;
    let mut errors: Vec<FileError> = Vec::new();

    for selection in selector.files() {
        match selection {
            Selection::Included(entry) => {
                println!("  {:>10}  {}", format_bytes(entry.size), entry.name);
                files += 1;
                bytes += entry.size;
            }
            Selection::Unreadable { path, error } => {
                errors.push(FileError { path, error });
            }
        }
    }

    println!("Would include {} files ({})", files, format_bytes(bytes));
    if !errors.is_empty() {
        println!("Unreadable entries: {}", errors.len());
        super::report_file_errors(&errors);
    }

    Ok(())
}
