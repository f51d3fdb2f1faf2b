// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Enforces path containment for archive entries: every entry name must
//! resolve to a location strictly inside the extraction root. This is the
//! central safety rule of the agent, so it lives in the domain layer rather
//! than next to the zip reader.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Lexical and canonical containment checks for extraction targets

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Path sanitization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Absolute path not allowed: {0}")]
    AbsolutePath(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path outside extraction root: {0}")]
    OutsideBoundary(String),

    #[error("Path too long: {0}")]
    PathTooLong(String),
}

/// Path sanitizer domain service
///
/// Validates archive entry names before anything touches the filesystem.
///
/// # Security Guarantees
/// - Rejects names containing `..` components
/// - Rejects absolute names (`/etc/passwd`, `C:\x`, `\\server\share`)
/// - Rejects backslash separators, which zip writers on Windows emit and
///   which `Path` on unix would treat as part of a file name
/// - Rejects NUL bytes and names that collapse to the root itself
pub struct PathSanitizer {
    /// Maximum allowed entry name length (default: 4096)
    max_path_len: usize,
}

impl PathSanitizer {
    /// Create a new path sanitizer with default settings
    pub fn new() -> Self {
        Self { max_path_len: 4096 }
    }

    /// Create a path sanitizer with custom max length
    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    /// Turn an archive entry name into a normalized relative path
    ///
    /// The result never contains `..`, `.`, a root or a prefix component, so
    /// `root.join(result)` is always a strict descendant of `root`.
    ///
    /// # Examples
    /// ```
    /// use launchpad_core::domain::path_sanitizer::PathSanitizer;
    /// use std::path::PathBuf;
    ///
    /// let sanitizer = PathSanitizer::new();
    ///
    /// let safe = sanitizer.contained_path("src/./app.txt").unwrap();
    /// assert_eq!(safe, PathBuf::from("src/app.txt"));
    ///
    /// assert!(sanitizer.contained_path("../../etc/passwd").is_err());
    /// assert!(sanitizer.contained_path("/etc/passwd").is_err());
    /// ```
    pub fn contained_path(&self, name: &str) -> Result<PathBuf, PathSanitizerError> {
        self.validate(name)?;

        if name.starts_with('/') || name.starts_with('\\') {
            tracing::warn!(entry = %name, "Rejected absolute archive entry");
            return Err(PathSanitizerError::AbsolutePath(name.to_string()));
        }

        let mut normalized = PathBuf::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    tracing::warn!(
                        entry = %name,
                        "Path traversal attempt detected: contains '..' component"
                    );
                    return Err(PathSanitizerError::PathTraversal(name.to_string()));
                }
                Component::Prefix(_) | Component::RootDir => {
                    tracing::warn!(entry = %name, "Rejected absolute archive entry");
                    return Err(PathSanitizerError::AbsolutePath(name.to_string()));
                }
            }
        }

        // "." or "./" would resolve to the root, which is not strictly inside it
        if normalized.as_os_str().is_empty() {
            return Err(PathSanitizerError::InvalidPath(format!(
                "entry '{}' resolves to the extraction root",
                name
            )));
        }

        Ok(normalized)
    }

    /// Lightweight validation of a raw entry name
    pub fn validate(&self, name: &str) -> Result<(), PathSanitizerError> {
        if name.len() > self.max_path_len {
            return Err(PathSanitizerError::PathTooLong(name.to_string()));
        }

        if name.is_empty() {
            return Err(PathSanitizerError::InvalidPath(
                "entry name is empty".to_string(),
            ));
        }

        if name.contains('\0') {
            tracing::warn!(entry = %name, "Entry name contains null byte");
            return Err(PathSanitizerError::InvalidPath(
                "Path contains null byte".to_string(),
            ));
        }

        if name.contains('\\') {
            tracing::warn!(entry = %name, "Entry name uses backslash separators");
            return Err(PathSanitizerError::InvalidPath(format!(
                "backslash separator in '{}'",
                name
            )));
        }

        // Drive-letter names like "C:/x" parse as Normal on unix
        let bytes = name.as_bytes();
        if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
            return Err(PathSanitizerError::AbsolutePath(name.to_string()));
        }

        Ok(())
    }

    /// Check that an on-disk path, after resolving symlinks, still lies
    /// inside `canonical_root`
    ///
    /// `canonical_root` must already be canonicalized. `path` must exist.
    pub fn ensure_within(
        &self,
        path: &Path,
        canonical_root: &Path,
    ) -> Result<PathBuf, PathSanitizerError> {
        let resolved = path.canonicalize().map_err(|e| {
            PathSanitizerError::InvalidPath(format!("{}: {}", path.display(), e))
        })?;

        if !resolved.starts_with(canonical_root) {
            tracing::warn!(
                path = %path.display(),
                root = %canonical_root.display(),
                "Resolved path escapes extraction root"
            );
            return Err(PathSanitizerError::OutsideBoundary(
                path.display().to_string(),
            ));
        }

        Ok(resolved)
    }
}

impl Default for PathSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_relative_path() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.contained_path("src/app.txt");
        assert_eq!(result.unwrap(), PathBuf::from("src/app.txt"));
    }

    #[test]
    fn test_directory_entry_trailing_slash() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.contained_path("src/nested/");
        assert_eq!(result.unwrap(), PathBuf::from("src/nested"));
    }

    #[test]
    fn test_reject_parent_dir() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.contained_path("../../etc/passwd");
        assert!(matches!(result, Err(PathSanitizerError::PathTraversal(_))));
    }

    #[test]
    fn test_reject_parent_dir_in_middle() {
        let sanitizer = PathSanitizer::new();
        // Even if it would land back inside the root, any `..` is refused
        let result = sanitizer.contained_path("src/../../outside.txt");
        assert!(matches!(result, Err(PathSanitizerError::PathTraversal(_))));

        let result = sanitizer.contained_path("src/../inside.txt");
        assert!(matches!(result, Err(PathSanitizerError::PathTraversal(_))));
    }

    #[test]
    fn test_reject_absolute() {
        let sanitizer = PathSanitizer::new();
        assert!(matches!(
            sanitizer.contained_path("/etc/passwd"),
            Err(PathSanitizerError::AbsolutePath(_))
        ));
        assert!(matches!(
            sanitizer.contained_path("C:/Windows/system.ini"),
            Err(PathSanitizerError::AbsolutePath(_))
        ));
    }

    #[test]
    fn test_reject_backslashes() {
        let sanitizer = PathSanitizer::new();
        assert!(sanitizer.contained_path("..\\..\\etc\\passwd").is_err());
        assert!(sanitizer.contained_path("\\etc\\passwd").is_err());
    }

    #[test]
    fn test_normalize_current_dir() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.contained_path("./src/./file.txt");
        assert_eq!(result.unwrap(), PathBuf::from("src/file.txt"));
    }

    #[test]
    fn test_reject_root_itself() {
        let sanitizer = PathSanitizer::new();
        assert!(matches!(
            sanitizer.contained_path("./"),
            Err(PathSanitizerError::InvalidPath(_))
        ));
        assert!(sanitizer.contained_path("").is_err());
    }

    #[test]
    fn test_path_too_long() {
        let sanitizer = PathSanitizer::with_max_length(10);
        let result = sanitizer.contained_path("very/long/path/that/exceeds/limit");
        assert!(matches!(result, Err(PathSanitizerError::PathTooLong(_))));
    }

    #[test]
    fn test_validate_null_byte() {
        let sanitizer = PathSanitizer::new();
        assert!(sanitizer.validate("src/file.txt").is_ok());
        assert!(sanitizer.validate("path\0/with/null").is_err());
    }

    #[test]
    fn test_dotted_names_are_not_traversal() {
        let sanitizer = PathSanitizer::new();
        let result = sanitizer.contained_path("..hidden/file..txt");
        assert_eq!(result.unwrap(), PathBuf::from("..hidden/file..txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_within_rejects_symlink_escape() {
        let outside = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let link = root.path().join("escape");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let sanitizer = PathSanitizer::new();
        let canonical_root = root.path().canonicalize().unwrap();

        assert!(sanitizer.ensure_within(root.path(), &canonical_root).is_ok());
        assert!(matches!(
            sanitizer.ensure_within(&link, &canonical_root),
            Err(PathSanitizerError::OutsideBoundary(_))
        ));
    }
}
