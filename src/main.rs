//! arkive - regex-driven directory backups
//!
//! Main binary entry point for the command-line interface.

use arkive::cli::{self, Cli, Commands};
use arkive::logging;
use clap::{CommandFactory, FromArgMatches};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Matches are kept around because the rule flags need their argument
    // indices to restore the order `--include`/`--exclude` were given in.
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    logging::init(cli.verbose);

    let rule_specs = cli::ordered_rule_specs(&matches);

    match cli.command {
        Commands::Backup(args) => cli::backup::run(args, rule_specs).await,
        Commands::Scan(args) => cli::scan::run(args, rule_specs).await,
        Commands::List(args) => cli::list::run(args).await,
        Commands::Watch(args) => cli::watch::run(args, rule_specs).await,
        Commands::Prune(args) => cli::prune::run(args).await,
    }
}
