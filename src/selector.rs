//! Path selection: walks a root directory and yields the files the rule set
//! admits.
//!
//! Traversal is depth-first with sorted siblings, so the stream (and with it
//! the archive entry order) is deterministic for an unchanged tree. A
//! directory whose relative path matches an exclude rule is pruned before
//! descending; its children are never visited. Entries that cannot be read
//! surface as [`Selection::Unreadable`] and traversal continues, so a single
//! bad file never aborts a backup.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::rules::{entry_name, RuleSet};

/// A file admitted into the backup
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the backup root
    pub relative: PathBuf,
    /// `/`-separated relative name, the matching and archive-entry domain
    pub name: String,
    pub size: u64,
}

/// One element of the selection stream
#[derive(Debug)]
pub enum Selection {
    Included(FileEntry),
    Unreadable { path: PathBuf, error: String },
}

/// Walks a root directory, applying a rule set to every entry
#[derive(Debug, Clone)]
pub struct Selector {
    root: PathBuf,
    rules: RuleSet,
}

impl Selector {
    /// The root is canonicalized so yielded paths are absolute; a root that
    /// cannot be canonicalized is kept as given and surfaces as a traversal
    /// error instead.
    pub fn new(root: &Path, rules: RuleSet) -> Self {
        Self {
            root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazy stream over the selected files. Each call restarts traversal
    /// from the root.
    pub fn files(&self) -> impl Iterator<Item = Selection> {
        let prune_root = self.root.clone();
        let prune_rules = self.rules.clone();
        let select_root = self.root.clone();
        let select_rules = self.rules.clone();

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                // The root itself is never pruned; files are decided below.
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let rel = match entry.path().strip_prefix(&prune_root) {
                    Ok(rel) => rel,
                    Err(_) => return true,
                };
                let name = entry_name(rel);
                if prune_rules.prunes_directory(&name) {
                    debug!("pruning subtree at {}", entry.path().display());
                    false
                } else {
                    true
                }
            })
            .filter_map(move |walked| match walked {
                Err(error) => {
                    let path = error
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| select_root.clone());
                    Some(Selection::Unreadable {
                        path,
                        error: error.to_string(),
                    })
                }
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let relative = entry.path().strip_prefix(&select_root).ok()?.to_path_buf();
                    let name = entry_name(&relative);
                    if !select_rules.includes_file(&name) {
                        debug!("skipping file {}", entry.path().display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) => Some(Selection::Included(FileEntry {
                            path: entry.into_path(),
                            relative,
                            name,
                            size: metadata.len(),
                        })),
                        Err(error) => Some(Selection::Unreadable {
                            path: entry.into_path(),
                            error: error.to_string(),
                        }),
                    }
                }
            })
    }
}
