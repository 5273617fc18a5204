//! Logging setup for the arkive binary.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `RUST_LOG` wins over the defaults when
/// set; `--verbose` forces debug output for this crate.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("arkive=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arkive=info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
