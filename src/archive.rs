//! Archive writing: streams selected files into a zip container.
//!
//! The writer stages everything in a `<destination>.part` file and renames it
//! over the destination only after the central directory has been written and
//! synced. Whatever happens mid-run — fatal error, cancellation, panic
//! unwinding through drop — the destination either holds a complete, readable
//! archive or is untouched; the staging file never survives a failed run.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Deflate level used when the configured one is out of range
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 9;

/// Outcome of writing one entry
#[derive(Debug)]
pub enum EntryStatus {
    /// Entry written; carries the number of source bytes streamed
    Written(u64),
    /// Source could not be read; entry skipped, archive still valid
    Skipped(String),
}

/// Counters reported once an archive is finalized
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub entries: u64,
    pub bytes: u64,
    pub path: PathBuf,
}

/// Zip writer with staged finalization
#[derive(Debug)]
pub struct ArchiveWriter {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    part_path: PathBuf,
    destination: PathBuf,
    entries: u64,
    bytes: u64,
    finished: bool,
}

impl ArchiveWriter {
    /// Open a writer for `destination`. Fails when the destination's parent
    /// directory is missing or the staging file cannot be created there.
    pub fn create(destination: &Path, compression_level: i32) -> Result<Self> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::DestinationUnwritable {
                    path: destination.display().to_string(),
                    reason: format!("parent directory {} does not exist", parent.display()),
                });
            }
        }

        let level = if (0..=9).contains(&compression_level) {
            compression_level
        } else {
            warn!(
                "invalid compression level {}, defaulting to {}",
                compression_level, DEFAULT_COMPRESSION_LEVEL
            );
            DEFAULT_COMPRESSION_LEVEL
        };

        let part_path = part_path_for(destination);
        let file = File::create(&part_path).map_err(|error| Error::DestinationUnwritable {
            path: destination.display().to_string(),
            reason: error.to_string(),
        })?;

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)));

        debug!("staging archive at {}", part_path.display());

        Ok(Self {
            zip: Some(ZipWriter::new(file)),
            options,
            part_path,
            destination: destination.to_path_buf(),
            entries: 0,
            bytes: 0,
            finished: false,
        })
    }

    /// Path of the staging file entries are being written to
    pub fn staging_path(&self) -> &Path {
        &self.part_path
    }

    /// Stream one source file into the archive under `name`.
    ///
    /// A source that cannot be opened or read is reported as
    /// [`EntryStatus::Skipped`]; a partially written entry is aborted so the
    /// archive stays valid. Only archive-side failures are fatal.
    pub fn write_entry(&mut self, name: &str, source: &Path) -> Result<EntryStatus> {
        let mut reader = match File::open(source) {
            Ok(file) => file,
            Err(error) => {
                warn!("skipping unreadable file {}: {}", source.display(), error);
                return Ok(EntryStatus::Skipped(error.to_string()));
            }
        };

        let zip = self.zip.as_mut().expect("archive writer used after finalization");
        zip.start_file(name, self.options)?;

        match io::copy(&mut reader, zip) {
            Ok(written) => {
                self.entries += 1;
                self.bytes += written;
                debug!("compressed {} ({} bytes)", name, written);
                Ok(EntryStatus::Written(written))
            }
            Err(error) => {
                zip.abort_file()?;
                warn!("skipping {} after read failure: {}", source.display(), error);
                Ok(EntryStatus::Skipped(error.to_string()))
            }
        }
    }

    /// Finalize the archive and move it into place.
    pub fn finish(mut self) -> Result<ArchiveSummary> {
        let zip = self.zip.take().expect("archive writer used after finalization");
        let file = zip.finish()?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.part_path, &self.destination)?;
        self.finished = true;
        debug!("archive finalized at {}", self.destination.display());

        Ok(ArchiveSummary {
            entries: self.entries,
            bytes: self.bytes,
            path: self.destination.clone(),
        })
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Close the underlying file before unlinking the staging copy.
        drop(self.zip.take());
        if let Err(error) = fs::remove_file(&self.part_path) {
            if error.kind() != io::ErrorKind::NotFound {
                warn!(
                    "failed to remove partial archive {}: {}",
                    self.part_path.display(),
                    error
                );
            }
        }
    }
}

fn part_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("archive"));
    name.push(".part");
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_entry(archive_path: &Path, name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        content
    }

    #[test]
    fn entries_round_trip_byte_identical() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"alpha").unwrap();
        fs::write(temp.path().join("b.bin"), vec![0u8, 1, 2, 255]).unwrap();
        let destination = temp.path().join("out.zip");

        let mut writer = ArchiveWriter::create(&destination, 9).unwrap();
        writer
            .write_entry("a.txt", &temp.path().join("a.txt"))
            .unwrap();
        writer
            .write_entry("nested/b.bin", &temp.path().join("b.bin"))
            .unwrap();
        let summary = writer.finish().unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(summary.bytes, 9);
        assert!(destination.exists());
        assert!(!part_path_for(&destination).exists());

        assert_eq!(read_entry(&destination, "a.txt"), b"alpha");
        assert_eq!(read_entry(&destination, "nested/b.bin"), vec![0, 1, 2, 255]);
    }

    #[test]
    fn missing_source_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep.txt"), b"kept").unwrap();
        let destination = temp.path().join("out.zip");

        let mut writer = ArchiveWriter::create(&destination, 9).unwrap();
        let status = writer
            .write_entry("gone.txt", &temp.path().join("gone.txt"))
            .unwrap();
        assert!(matches!(status, EntryStatus::Skipped(_)));
        writer
            .write_entry("keep.txt", &temp.path().join("keep.txt"))
            .unwrap();
        let summary = writer.finish().unwrap();

        assert_eq!(summary.entries, 1);
        let archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn missing_parent_directory_is_fatal() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("missing").join("out.zip");

        let err = ArchiveWriter::create(&destination, 9).unwrap_err();
        assert!(matches!(err, Error::DestinationUnwritable { .. }));
        assert!(!destination.exists());
        assert!(!part_path_for(&destination).exists());
    }

    #[test]
    fn dropped_writer_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"alpha").unwrap();
        let destination = temp.path().join("out.zip");

        let mut writer = ArchiveWriter::create(&destination, 9).unwrap();
        writer
            .write_entry("a.txt", &temp.path().join("a.txt"))
            .unwrap();
        drop(writer);

        assert!(!destination.exists());
        assert!(!part_path_for(&destination).exists());
    }

    #[test]
    fn empty_archive_is_still_valid() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("out.zip");

        let summary = ArchiveWriter::create(&destination, 9)
            .unwrap()
            .finish()
            .unwrap();

        assert_eq!(summary.entries, 0);
        let archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn out_of_range_level_falls_back() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"alpha").unwrap();
        let destination = temp.path().join("out.zip");

        let mut writer = ArchiveWriter::create(&destination, 42).unwrap();
        writer
            .write_entry("a.txt", &temp.path().join("a.txt"))
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(read_entry(&destination, "a.txt"), b"alpha");
    }
}
