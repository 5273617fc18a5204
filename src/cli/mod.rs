//! Command-line interface for arkive.
//!
//! One module per subcommand, clap derive throughout. Library output goes
//! through `tracing`; everything a user is meant to read goes to stdout, and
//! per-file errors go to stderr.

use clap::{ArgMatches, Args, Parser, Subcommand};

use crate::engine::FileError;
use crate::rules::{RuleAction, RuleSpec};

pub mod backup;
pub mod list;
pub mod prune;
pub mod scan;
pub mod watch;

/// arkive - regex-driven directory backups into portable zip archives
#[derive(Parser)]
#[command(name = "arkive")]
#[command(about = "Regex-driven directory backups into portable zip archives")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Back up a directory tree into a zip archive
    Backup(backup::BackupArgs),
    /// Dry run: list the files the rule set would include
    Scan(scan::ScanArgs),
    /// List the entries of an existing archive
    List(list::ListArgs),
    /// Back up periodically into timestamped archives
    Watch(watch::WatchArgs),
    /// Delete archives older than a threshold
    Prune(prune::PruneArgs),
}

/// Rule and configuration flags shared by backup, scan and watch
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Include paths matching this pattern (repeatable, order matters)
    #[arg(long, value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Exclude paths matching this pattern (repeatable, order matters)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,
}

/// Reconstruct the interleaved `--include`/`--exclude` declaration order for
/// the active subcommand. Clap collects repeated flags into separate lists,
/// so the combined ordering has to come from the argument indices.
pub fn ordered_rule_specs(matches: &ArgMatches) -> Vec<RuleSpec> {
    let Some((_, sub)) = matches.subcommand() else {
        return Vec::new();
    };

    let mut indexed: Vec<(usize, RuleSpec)> = Vec::new();
    collect_rules(sub, "include", RuleAction::Include, &mut indexed);
    collect_rules(sub, "exclude", RuleAction::Exclude, &mut indexed);
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, spec)| spec).collect()
}

fn collect_rules(
    matches: &ArgMatches,
    id: &str,
    action: RuleAction,
    out: &mut Vec<(usize, RuleSpec)>,
) {
    let Ok(Some(values)) = matches.try_get_many::<String>(id) else {
        return;
    };
    let Some(indices) = matches.indices_of(id) else {
        return;
    };
    for (index, value) in indices.zip(values) {
        out.push((index, RuleSpec::new(value.clone(), action)));
    }
}

/// Print accumulated per-file errors to stderr
pub(crate) fn report_file_errors(errors: &[FileError]) {
    for error in errors {
        eprintln!("  {}: {}", error.path.display(), error.error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn specs_for(args: &[&str]) -> Vec<RuleSpec> {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        ordered_rule_specs(&matches)
    }

    #[test]
    fn rule_order_is_preserved_across_flag_kinds() {
        let specs = specs_for(&[
            "arkive", "backup", "root", "dest.zip", "--exclude", ".*", "--include", "a\\.txt",
        ]);
        assert_eq!(
            specs,
            vec![
                RuleSpec::new(".*", RuleAction::Exclude),
                RuleSpec::new("a\\.txt", RuleAction::Include),
            ]
        );
    }

    #[test]
    fn interleaved_flags_keep_their_positions() {
        let specs = specs_for(&[
            "arkive",
            "scan",
            "root",
            "--include",
            ".*",
            "--exclude",
            "logs(/.*)?",
            "--include",
            "logs/keep\\.log",
        ]);
        assert_eq!(
            specs,
            vec![
                RuleSpec::new(".*", RuleAction::Include),
                RuleSpec::new("logs(/.*)?", RuleAction::Exclude),
                RuleSpec::new("logs/keep\\.log", RuleAction::Include),
            ]
        );
    }

    #[test]
    fn no_rule_flags_yields_empty_list() {
        assert!(specs_for(&["arkive", "backup", "root", "dest.zip"]).is_empty());
    }

    #[test]
    fn subcommands_without_rule_flags_are_fine() {
        assert!(specs_for(&["arkive", "list", "some.zip"]).is_empty());
    }
}
