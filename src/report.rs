//! Run reports: machine-readable JSON summaries of completed backups.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::engine::{BackupJob, BackupResult, FileError};
use crate::error::Result;

/// Report for one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub root: PathBuf,
    pub destination: PathBuf,
    pub files_included: u64,
    pub bytes_written: u64,
    pub duration_millis: u64,
    /// Size of the archive on disk (compressed)
    pub archive_size: u64,
    pub archive_sha256: String,
    pub errors: Vec<FileError>,
}

impl BackupReport {
    /// Build a report for a finished job; reads the archive back to record
    /// its size and digest.
    pub fn from_run(job: &BackupJob, result: &BackupResult) -> Result<Self> {
        let archive_size = std::fs::metadata(&job.destination)?.len();
        let archive_sha256 = file_sha256(&job.destination)?;

        Ok(Self {
            id: Uuid::new_v4(),
            created: Utc::now(),
            root: job.root.clone(),
            destination: job.destination.clone(),
            files_included: result.files_included,
            bytes_written: result.bytes_written,
            duration_millis: result.duration_millis,
            archive_size,
            archive_sha256,
            errors: result.errors.clone(),
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Default report location: next to the archive, `<archive>.report.json`
pub fn report_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| std::ffi::OsString::from("archive"));
    name.push(".report.json");
    destination.with_file_name(name)
}

/// Streaming SHA-256 of a file
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
