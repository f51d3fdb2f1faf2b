// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Safe Extractor
//!
//! Unpacks a deployment archive into a destination root. Every entry name
//! goes through [`PathSanitizer`] before anything is created, and every
//! directory on the way down is checked for symlinks that would lead out of
//! the root.
//!
//! An unsafe entry aborts the whole extraction. Entries already written stay
//! in place, but nothing is ever written outside the root.
//!
//! Extraction is blocking I/O. Async callers run it on the blocking pool.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::domain::archive::{ArchiveEntry, DEFAULT_DIR_MODE};
use crate::domain::path_sanitizer::{PathSanitizer, PathSanitizerError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid archive: {0}")]
    Archive(#[from] ZipError),

    #[error("unsafe archive entry '{entry}': {reason}")]
    UnsafePath {
        entry: String,
        #[source]
        reason: PathSanitizerError,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    fn io(path: &Path, source: io::Error) -> Self {
        ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_unsafe_path(&self) -> bool {
        matches!(self, ExtractError::UnsafePath { .. })
    }
}

#[derive(Default)]
pub struct SafeExtractor {
    sanitizer: PathSanitizer,
}

impl SafeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every entry of `archive_path` under `dest`
    ///
    /// Returns the entries in archive order.
    pub fn extract(&self, archive_path: &Path, dest: &Path) -> Result<Vec<ArchiveEntry>, ExtractError> {
        let file = File::open(archive_path).map_err(|e| ExtractError::io(archive_path, e))?;
        let mut archive = ZipArchive::new(file)?;

        fs::create_dir_all(dest).map_err(|e| ExtractError::io(dest, e))?;
        let root = dest.canonicalize().map_err(|e| ExtractError::io(dest, e))?;

        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut zip_file = archive.by_index(index)?;
            let name = zip_file.name().to_string();

            let relative = self
                .sanitizer
                .contained_path(&name)
                .map_err(|reason| unsafe_entry(&name, reason))?;
            let target = root.join(&relative);

            if zip_file.is_dir() {
                let entry = ArchiveEntry::directory(&name, zip_file.unix_mode());
                self.create_contained_dir(&root, &relative, &name)?;
                set_mode(&target, entry.mode)?;
                debug!(entry = %entry.path, mode = entry.mode, "Created directory");
                entries.push(entry);
                continue;
            }

            let entry = ArchiveEntry::file(&name, zip_file.unix_mode(), zip_file.size());
            if let Some(parent) = relative.parent() {
                self.create_contained_dir(&root, parent, &name)?;
            }

            // A pre-existing link at the target would redirect the write
            if let Ok(meta) = fs::symlink_metadata(&target) {
                if meta.file_type().is_symlink() {
                    self.sanitizer
                        .ensure_within(&target, &root)
                        .map_err(|reason| unsafe_entry(&name, reason))?;
                }
            }

            let mut out = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&target)
                .map_err(|e| ExtractError::io(&target, e))?;
            io::copy(&mut zip_file, &mut out).map_err(|e| ExtractError::io(&target, e))?;
            set_mode(&target, entry.mode)?;

            debug!(entry = %entry.path, bytes = entry.size, "Extracted file");
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Create `relative` under `root` one component at a time, refusing to
    /// pass through a symlink that resolves outside `root`
    fn create_contained_dir(&self, root: &Path, relative: &Path, entry: &str) -> Result<(), ExtractError> {
        let mut current = root.to_path_buf();
        for component in relative.components() {
            current.push(component);
            match fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    self.sanitizer
                        .ensure_within(&current, root)
                        .map_err(|reason| unsafe_entry(entry, reason))?;
                }
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(ExtractError::io(
                        &current,
                        io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
                    ));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    fs::create_dir(&current).map_err(|e| ExtractError::io(&current, e))?;
                    set_mode(&current, DEFAULT_DIR_MODE)?;
                }
                Err(e) => return Err(ExtractError::io(&current, e)),
            }
        }
        Ok(())
    }
}

fn unsafe_entry(entry: &str, reason: PathSanitizerError) -> ExtractError {
    warn!(entry = %entry, error = %reason, "Refusing unsafe archive entry");
    ExtractError::UnsafePath {
        entry: entry.to_string(),
        reason,
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ExtractError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| ExtractError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ExtractError> {
    Ok(())
}
