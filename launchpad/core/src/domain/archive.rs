// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Archive Contract
//!
//! The shape both sides agree on: a deflate zip whose entries carry a
//! relative `/`-separated path, a directory flag (trailing `/`) and unix
//! permission bits. The packer and the extractor in
//! `crate::infrastructure::archive` are the two ends of this contract.

use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mode applied to file entries that carry no unix permissions
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode applied to directory entries that carry no unix permissions
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Permission bits only; zip external attributes also carry the file type
pub const PERMISSION_MASK: u32 = 0o7777;

/// One entry of a deployment archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Relative, `/`-separated path (no trailing slash)
    pub path: String,
    pub is_dir: bool,
    pub mode: u32,
    pub size: u64,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>, mode: Option<u32>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            mode: mode.map_or(DEFAULT_FILE_MODE, |m| m & PERMISSION_MASK),
            size,
        }
    }

    pub fn directory(path: impl Into<String>, mode: Option<u32>) -> Self {
        let path: String = path.into();
        Self {
            path: path.trim_end_matches('/').to_string(),
            is_dir: true,
            mode: mode.map_or(DEFAULT_DIR_MODE, |m| m & PERMISSION_MASK),
            size: 0,
        }
    }
}

/// Names the packer leaves out of a deployment
///
/// Patterns are globs matched against every component of an entry's
/// relative path, so `node_modules` excludes the directory at any depth and
/// `*.log` excludes log files wherever they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    patterns: Vec<String>,
}

impl ExclusionRules {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        relative.components().any(|component| {
            let part = component.as_os_str().to_string_lossy();
            self.patterns
                .iter()
                .any(|pattern| glob_match(pattern, &part))
        })
    }
}

impl Default for ExclusionRules {
    /// Version control metadata, dependency caches, environment files, OS
    /// artifacts and logs
    fn default() -> Self {
        Self::new([".git", "node_modules", ".env", "*.log", ".DS_Store", "Thumbs.db"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_exclusions() {
        let rules = ExclusionRules::default();
        for excluded in [
            ".git",
            ".git/HEAD",
            "web/node_modules/left-pad/index.js",
            ".env",
            "config/.env",
            "server.log",
            "logs/app.log",
            ".DS_Store",
            "assets/Thumbs.db",
        ] {
            assert!(rules.is_excluded(Path::new(excluded)), "{excluded} should be excluded");
        }
    }

    #[test]
    fn test_default_keeps_lookalikes() {
        let rules = ExclusionRules::default();
        for kept in [
            "DEPLOY.sh",
            "src/app.txt",
            ".env.example",
            ".gitignore",
            "logger.rs",
            "catalog/index.html",
        ] {
            assert!(!rules.is_excluded(Path::new(kept)), "{kept} should be kept");
        }
    }

    #[test]
    fn test_mode_masking() {
        let entry = ArchiveEntry::file("DEPLOY.sh", Some(0o100755), 12);
        assert_eq!(entry.mode, 0o755);

        let dir = ArchiveEntry::directory("src/", Some(0o040750));
        assert_eq!(dir.path, "src");
        assert_eq!(dir.mode, 0o750);

        assert_eq!(ArchiveEntry::file("a", None, 0).mode, DEFAULT_FILE_MODE);
        assert_eq!(ArchiveEntry::directory("d/", None).mode, DEFAULT_DIR_MODE);
    }
}
