// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Archive Packer
//!
//! Builds the deployment archive on the sending side: walks a directory,
//! drops excluded names and writes everything else into an in-memory
//! deflate zip with unix permissions preserved.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::archive::{ArchiveEntry, ExclusionRules};
use crate::domain::agent_config::DEFAULT_ENTRY_SCRIPT;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("{} not found in {}", .entry_script, .dir.display())]
    MissingEntryPoint { entry_script: String, dir: PathBuf },

    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("failed to write archive: {0}")]
    Archive(#[from] ZipError),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A finished deployment archive
#[derive(Debug, Clone)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<ArchiveEntry>,
}

pub struct ArchivePacker {
    rules: ExclusionRules,
    entry_script: String,
}

impl ArchivePacker {
    pub fn new(rules: ExclusionRules) -> Self {
        Self {
            rules,
            entry_script: DEFAULT_ENTRY_SCRIPT.to_string(),
        }
    }

    pub fn pack(&self, source: &Path) -> Result<PackedArchive, PackError> {
        if !source.join(&self.entry_script).is_file() {
            return Err(PackError::MissingEntryPoint {
                entry_script: self.entry_script.clone(),
                dir: source.to_path_buf(),
            });
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut entries = Vec::new();

        let walker = WalkDir::new(source)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(source)
                    .map(|relative| !self.rules.is_excluded(relative))
                    .unwrap_or(false)
            });

        for dir_entry in walker {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let relative = path.strip_prefix(source).unwrap_or(path);
            let name = archive_name(relative)?;
            let file_type = dir_entry.file_type();

            if file_type.is_symlink() {
                warn!(path = %path.display(), "Skipping symlink");
                continue;
            }

            let metadata = dir_entry.metadata()?;
            let mode = unix_mode(&metadata);

            if file_type.is_dir() {
                let mut options = FileOptions::default();
                if let Some(mode) = mode {
                    options = options.unix_permissions(mode);
                }
                zip.add_directory(format!("{}/", name), options)?;
                entries.push(ArchiveEntry::directory(name, mode));
                continue;
            }

            let mut options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            if let Some(mode) = mode {
                options = options.unix_permissions(mode);
            }
            zip.start_file(name.as_str(), options)?;

            let mut file = File::open(path).map_err(|source| PackError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let size = io::copy(&mut file, &mut zip).map_err(|source| PackError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(entry = %name, bytes = size, "Packed file");
            entries.push(ArchiveEntry::file(name, mode, size));
        }

        let bytes = zip.finish()?.into_inner();

        Ok(PackedArchive { bytes, entries })
    }
}

impl Default for ArchivePacker {
    fn default() -> Self {
        Self::new(ExclusionRules::default())
    }
}

/// Zip names always use `/`, whatever the host separator is
fn archive_name(relative: &Path) -> Result<String, PackError> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| PackError::NonUtf8Path(relative.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use zip::ZipArchive;

    fn names(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_requires_entry_script() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README.md"), "hi").unwrap();

        let err = ArchivePacker::default().pack(tmp.path()).unwrap_err();
        assert!(matches!(err, PackError::MissingEntryPoint { .. }));
    }

    #[test]
    fn test_skips_excluded_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("DEPLOY.sh"), "#!/bin/bash\n").unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/app.txt"), "app").unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();
        fs::write(root.join("build.log"), "noise").unwrap();

        let packed = ArchivePacker::default().pack(root).unwrap();

        let mut listed = names(&packed.bytes);
        listed.sort();
        assert_eq!(listed, vec!["DEPLOY.sh", "src/", "src/app.txt"]);
        assert_eq!(packed.entries.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("DEPLOY.sh");
        fs::write(&script, "#!/bin/bash\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

        let packed = ArchivePacker::default().pack(tmp.path()).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(packed.bytes)).unwrap();
        let entry = archive.by_name("DEPLOY.sh").unwrap();
        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o750);
    }
}
