// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Workspace Store
//!
//! Filesystem-backed allocation and removal of deployment workspaces under
//! a single upload root.
//!
//! **Limitations:**
//! - Directory creation is the only concurrency control. With timestamp
//!   naming, two uploads in the same second share a workspace and the later
//!   archive overwrites the earlier one.
//! - Workspaces left behind by a crash are not swept on restart.

use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::domain::workspace::{Workspace, WorkspaceNaming};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Directory {} is not writable: {source}", .path.display())]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LocalWorkspaceStore {
    /// Parent of every workspace (e.g. "./uploads")
    upload_dir: PathBuf,
    naming: WorkspaceNaming,
}

impl LocalWorkspaceStore {
    /// Create the store, making sure the upload root exists and is writable
    pub fn new(upload_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let upload_dir = upload_dir.into();

        std::fs::create_dir_all(&upload_dir).map_err(|source| StoreError::CreateDir {
            path: upload_dir.clone(),
            source,
        })?;

        let probe = upload_dir.join(".launchpad-write-test");
        std::fs::write(&probe, b"test")
            .and_then(|_| std::fs::remove_file(&probe))
            .map_err(|source| StoreError::NotWritable {
                path: upload_dir.clone(),
                source,
            })?;

        Ok(Self {
            upload_dir,
            naming: WorkspaceNaming::default(),
        })
    }

    pub fn with_naming(mut self, naming: WorkspaceNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Allocate a workspace named after the current local time
    ///
    /// An existing directory with the same name is reused.
    pub async fn create(&self) -> Result<Workspace, StoreError> {
        let name = self.naming.name_for(&Local::now());
        let workspace = Workspace::new(&self.upload_dir, name);

        tokio::fs::create_dir_all(workspace.root())
            .await
            .map_err(|source| StoreError::CreateDir {
                path: workspace.root().to_path_buf(),
                source,
            })?;

        debug!(workspace = %workspace.name(), "Created workspace directory");
        Ok(workspace)
    }

    /// Persist the uploaded archive, truncating any previous one
    pub async fn write_archive(&self, workspace: &Workspace, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = workspace.archive_path();
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Remove a workspace tree
    ///
    /// Returns `false` when there was nothing to remove.
    pub async fn remove(&self, root: &Path) -> Result<bool, StoreError> {
        match tokio::fs::remove_dir_all(root).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Remove {
                path: root.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_upload_dir() {
        let temp_dir = TempDir::new().unwrap();
        let upload_dir = temp_dir.path().join("nested/uploads");

        let store = LocalWorkspaceStore::new(&upload_dir).unwrap();

        assert!(upload_dir.is_dir());
        assert_eq!(store.upload_dir(), upload_dir.as_path());
        assert!(!upload_dir.join(".launchpad-write-test").exists());
    }

    #[tokio::test]
    async fn test_create_and_write_archive() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalWorkspaceStore::new(temp_dir.path()).unwrap();

        let workspace = store.create().await.unwrap();
        assert!(workspace.root().is_dir());
        assert!(workspace.name().as_str().starts_with("deploy-"));

        let path = store.write_archive(&workspace, b"first upload").await.unwrap();
        store.write_archive(&workspace, b"second").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalWorkspaceStore::new(temp_dir.path())
            .unwrap()
            .with_naming(WorkspaceNaming::TimestampWithSuffix);

        let workspace = store.create().await.unwrap();
        store.write_archive(&workspace, b"zip").await.unwrap();

        assert!(store.remove(workspace.root()).await.unwrap());
        assert!(!workspace.root().exists());
        assert!(!store.remove(workspace.root()).await.unwrap());
    }
}
