//! Age-based deletion of old archives.
//!
//! Only regular `*.zip` files directly inside the given directory are
//! considered; anything else is left alone. A file that cannot be inspected
//! or deleted is recorded and the sweep continues.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::engine::FileError;
use crate::error::Result;

/// Counters for one pruning sweep
#[derive(Debug, Clone, Default)]
pub struct PruneStats {
    pub examined: usize,
    pub deleted: usize,
    pub errors: Vec<FileError>,
}

/// Delete archives in `dir` whose modification time is older than `max_age`
/// relative to `now`. A missing or unreadable directory is fatal.
pub fn prune_archives(dir: &Path, max_age: Duration, now: SystemTime) -> Result<PruneStats> {
    let mut stats = PruneStats::default();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                stats.errors.push(FileError {
                    path: dir.to_path_buf(),
                    error: error.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("zip") {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(error) => {
                stats.errors.push(FileError {
                    path,
                    error: error.to_string(),
                });
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        stats.examined += 1;

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(error) => {
                stats.errors.push(FileError {
                    path,
                    error: error.to_string(),
                });
                continue;
            }
        };

        // Files stamped in the future count as age zero.
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("deleted old archive {}", path.display());
                stats.deleted += 1;
            }
            Err(error) => {
                warn!("failed to delete old archive {}: {}", path.display(), error);
                stats.errors.push(FileError {
                    path,
                    error: error.to_string(),
                });
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn age_file(path: &Path, now: SystemTime, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(now - age).unwrap();
    }

    #[test]
    fn old_archives_are_deleted_fresh_ones_kept() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let old = temp.path().join("old.zip");
        let fresh = temp.path().join("fresh.zip");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        age_file(&old, now, 2 * HOUR);

        let stats = prune_archives(temp.path(), HOUR, now).unwrap();

        assert_eq!(stats.examined, 2);
        assert_eq!(stats.deleted, 1);
        assert!(stats.errors.is_empty());
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn non_zip_files_are_untouched() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let note = temp.path().join("notes.txt");
        fs::write(&note, b"keep me").unwrap();
        age_file(&note, now, 48 * HOUR);

        let stats = prune_archives(temp.path(), HOUR, now).unwrap();

        assert_eq!(stats.examined, 0);
        assert_eq!(stats.deleted, 0);
        assert!(note.exists());
    }

    #[test]
    fn directories_with_zip_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested.zip")).unwrap();

        let stats = prune_archives(temp.path(), HOUR, SystemTime::now()).unwrap();

        assert_eq!(stats.examined, 0);
        assert!(temp.path().join("nested.zip").exists());
    }

    #[test]
    fn exact_threshold_is_kept() {
        let temp = TempDir::new().unwrap();
        let now = SystemTime::now();
        let archive = temp.path().join("edge.zip");
        fs::write(&archive, b"edge").unwrap();
        age_file(&archive, now, HOUR);

        let stats = prune_archives(temp.path(), HOUR, now).unwrap();

        assert_eq!(stats.deleted, 0);
        assert!(archive.exists());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(prune_archives(&missing, HOUR, SystemTime::now()).is_err());
    }
}
