//! # arkive
//!
//! Regex-driven directory backups into portable zip archives.
//!
//! ## Features
//!
//! - **Path selection**: ordered include/exclude regex rules with
//!   last-match-wins semantics and whole-subtree pruning
//! - **Archive writing**: staged zip output that is either finalized whole or
//!   cleaned up, never left truncated
//! - **Orchestration**: per-file errors accumulate, root and destination
//!   errors abort; one writer per destination at a time
//! - **Retention**: age-based deletion of old archives
//! - **Watch mode**: periodic timestamped backups with pruning
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arkive::{BackupEngine, BackupJob, BackupRule, RuleAction, RuleSet};
//! use std::path::Path;
//!
//! # fn main() -> arkive::Result<()> {
//! let rules = RuleSet::new(vec![
//!     BackupRule::new(".*", RuleAction::Include)?,
//!     BackupRule::new(r"logs(/.*)?", RuleAction::Exclude)?,
//! ]);
//! let job = BackupJob::new(Path::new("./world"), Path::new("./world.zip"), rules);
//!
//! let outcome = BackupEngine::new().run(&job);
//! println!("{} files archived", outcome.result().files_included);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;
pub mod retention;
pub mod rules;
pub mod selector;

// Re-export commonly used types
pub use engine::{
    BackupEngine, BackupJob, BackupOutcome, BackupPhase, BackupResult, CancelToken, FileError,
};
pub use error::{Error, Result};
pub use rules::{BackupRule, RuleAction, RuleSet, RuleSpec};
pub use selector::{FileEntry, Selection, Selector};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
