//! Backup orchestration: one run from selection through archive finalization.
//!
//! The engine is the only place that decides whether a failure is fatal.
//! Root and destination problems abort the run; anything scoped to a single
//! file becomes a [`FileError`] in the result and the run keeps going. Runs
//! targeting the same destination are mutually exclusive via a process-wide
//! registry; distinct destinations proceed independently.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveWriter, EntryStatus, DEFAULT_COMPRESSION_LEVEL};
use crate::error::{Error, Result};
use crate::rules::RuleSet;
use crate::selector::{Selection, Selector};

/// Everything one backup run needs; immutable for the duration of the run
#[derive(Debug, Clone)]
pub struct BackupJob {
    pub root: PathBuf,
    pub destination: PathBuf,
    pub rules: RuleSet,
    pub compression_level: i32,
}

impl BackupJob {
    pub fn new(root: &Path, destination: &Path, rules: RuleSet) -> Self {
        Self {
            root: root.to_path_buf(),
            destination: destination.to_path_buf(),
            rules,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }
}

/// Failure scoped to a single filesystem entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupResult {
    pub files_included: u64,
    pub bytes_written: u64,
    pub duration_millis: u64,
    pub errors: Vec<FileError>,
}

/// Where in the run the engine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupPhase {
    Idle,
    Selecting,
    Writing,
    Completed,
    Failed,
}

/// Terminal state of a run: a finalized archive plus accumulated per-file
/// errors, or a single fatal cause plus whatever had been accumulated
#[derive(Debug)]
pub enum BackupOutcome {
    Completed(BackupResult),
    Failed {
        error: Error,
        phase: BackupPhase,
        partial: BackupResult,
    },
}

impl BackupOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn result(&self) -> &BackupResult {
        match self {
            Self::Completed(result) => result,
            Self::Failed { partial, .. } => partial,
        }
    }
}

/// Best-effort cancellation flag, checked between entries
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

static ACTIVE_DESTINATIONS: Lazy<Mutex<HashSet<PathBuf>>> =
    Lazy::new(|| Mutex::new(HashSet::new()));

/// Registry slot for one destination, released on drop
struct DestinationGuard {
    key: PathBuf,
}

impl DestinationGuard {
    fn acquire(destination: &Path) -> Result<Self> {
        let key = lock_key(destination);
        let mut active = ACTIVE_DESTINATIONS.lock().unwrap();
        if !active.insert(key.clone()) {
            return Err(Error::DestinationBusy {
                path: destination.display().to_string(),
            });
        }
        Ok(Self { key })
    }
}

impl Drop for DestinationGuard {
    fn drop(&mut self) {
        ACTIVE_DESTINATIONS.lock().unwrap().remove(&self.key);
    }
}

/// The destination file does not exist until the run finishes, so the lock
/// key canonicalizes the parent and re-joins the file name.
fn lock_key(destination: &Path) -> PathBuf {
    match (
        destination.parent().filter(|p| !p.as_os_str().is_empty()),
        destination.file_name(),
    ) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| destination.to_path_buf()),
        _ => destination.to_path_buf(),
    }
}

/// Runs backup jobs sequentially, one at a time per engine
#[derive(Debug, Default)]
pub struct BackupEngine {
    cancel: CancelToken,
}

impl BackupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token shared with signal handlers; cancelling it makes the current
    /// run abort before the next entry, cleaning up like a fatal error.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute one backup run to completion or fatal failure.
    pub fn run(&self, job: &BackupJob) -> BackupOutcome {
        let started = Instant::now();
        let mut result = BackupResult::default();

        info!(
            "starting backup: {} -> {}",
            job.root.display(),
            job.destination.display()
        );

        if !job.root.is_dir() {
            let error = Error::RootNotFound {
                path: job.root.display().to_string(),
            };
            return fail(error, BackupPhase::Selecting, result, started);
        }
        if let Err(error) = fs::read_dir(&job.root) {
            return fail(error.into(), BackupPhase::Selecting, result, started);
        }
        let _guard = match DestinationGuard::acquire(&job.destination) {
            Ok(guard) => guard,
            Err(error) => return fail(error, BackupPhase::Selecting, result, started),
        };

        let selector = Selector::new(&job.root, job.rules.clone());
        let mut writer = match ArchiveWriter::create(&job.destination, job.compression_level) {
            Ok(writer) => writer,
            Err(error) => return fail(error, BackupPhase::Writing, result, started),
        };

        // A destination inside the root would otherwise match the rules and
        // archive itself (the staging file grows while being read).
        let staging = writer
            .staging_path()
            .canonicalize()
            .unwrap_or_else(|_| writer.staging_path().to_path_buf());
        let destination = lock_key(&job.destination);

        for selection in selector.files() {
            if self.cancel.is_cancelled() {
                drop(writer);
                return fail(Error::Cancelled, BackupPhase::Writing, result, started);
            }

            match selection {
                Selection::Unreadable { path, error } => {
                    result.errors.push(FileError { path, error });
                }
                Selection::Included(entry) => {
                    if entry.path == staging || entry.path == destination {
                        debug!("not archiving the archive itself: {}", entry.path.display());
                        continue;
                    }
                    match writer.write_entry(&entry.name, &entry.path) {
                        Ok(EntryStatus::Written(bytes)) => {
                            result.files_included += 1;
                            result.bytes_written += bytes;
                        }
                        Ok(EntryStatus::Skipped(error)) => {
                            result.errors.push(FileError {
                                path: entry.path,
                                error,
                            });
                        }
                        Err(error) => {
                            drop(writer);
                            return fail(error, BackupPhase::Writing, result, started);
                        }
                    }
                }
            }
        }

        match writer.finish() {
            Ok(summary) => {
                result.duration_millis = started.elapsed().as_millis() as u64;
                info!(
                    "backup completed: {} files, {} bytes -> {}",
                    result.files_included,
                    result.bytes_written,
                    summary.path.display()
                );
                BackupOutcome::Completed(result)
            }
            Err(error) => fail(error, BackupPhase::Writing, result, started),
        }
    }
}

fn fail(
    error: Error,
    phase: BackupPhase,
    mut partial: BackupResult,
    started: Instant,
) -> BackupOutcome {
    partial.duration_millis = started.elapsed().as_millis() as u64;
    warn!("backup failed during {:?}: {}", phase, error);
    BackupOutcome::Failed {
        error,
        phase,
        partial,
    }
}
