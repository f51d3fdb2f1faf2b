// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workspace Domain Model
//!
//! A workspace is the per-deployment directory under the agent's upload root.
//! It holds the raw archive (`deployment.zip`) and the `extracted/` tree the
//! entry script runs in. The request that created it owns it until it is
//! handed to the reaper.
//!
//! # Naming
//!
//! Workspaces are named `deploy-YYYYMMDD-HHMMSS` from the local clock. Two
//! uploads landing in the same second share a directory and the later one
//! wins. [`WorkspaceNaming::TimestampWithSuffix`] opts out of that by
//! appending a random suffix.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the uploaded archive inside a workspace
pub const ARCHIVE_FILE_NAME: &str = "deployment.zip";

/// Directory the archive is unpacked into
pub const EXTRACTED_DIR_NAME: &str = "extracted";

const NAME_PREFIX: &str = "deploy-";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceNaming {
    /// `deploy-20260101-120000`; same-second uploads collide (last writer wins)
    #[default]
    Timestamp,
    /// `deploy-20260101-120000-1a2b3c4d`
    TimestampWithSuffix,
}

impl WorkspaceNaming {
    pub fn name_for<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> WorkspaceName
    where
        Tz::Offset: fmt::Display,
    {
        let stamp = at.format(TIMESTAMP_FORMAT);
        match self {
            WorkspaceNaming::Timestamp => WorkspaceName(format!("{}{}", NAME_PREFIX, stamp)),
            WorkspaceNaming::TimestampWithSuffix => {
                let suffix = Uuid::new_v4().simple().to_string();
                WorkspaceName(format!("{}{}-{}", NAME_PREFIX, stamp, &suffix[..8]))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: WorkspaceName,
    root: PathBuf,
}

impl Workspace {
    pub fn new(upload_dir: &Path, name: WorkspaceName) -> Self {
        let root = upload_dir.join(name.as_str());
        Self { name, root }
    }

    pub fn name(&self) -> &WorkspaceName {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE_NAME)
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join(EXTRACTED_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 2).unwrap()
    }

    #[test]
    fn test_timestamp_naming_is_deterministic() {
        let name = WorkspaceNaming::Timestamp.name_for(&fixed_time());
        assert_eq!(name.as_str(), "deploy-20260307-090502");
        assert_eq!(name, WorkspaceNaming::Timestamp.name_for(&fixed_time()));
    }

    #[test]
    fn test_suffix_naming_differs_within_same_second() {
        let a = WorkspaceNaming::TimestampWithSuffix.name_for(&fixed_time());
        let b = WorkspaceNaming::TimestampWithSuffix.name_for(&fixed_time());
        assert!(a.as_str().starts_with("deploy-20260307-090502-"));
        assert_eq!(a.as_str().len(), "deploy-20260307-090502-".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_layout() {
        let name = WorkspaceNaming::Timestamp.name_for(&fixed_time());
        let ws = Workspace::new(Path::new("/srv/uploads"), name);
        assert_eq!(ws.root(), Path::new("/srv/uploads/deploy-20260307-090502"));
        assert_eq!(
            ws.archive_path(),
            PathBuf::from("/srv/uploads/deploy-20260307-090502/deployment.zip")
        );
        assert_eq!(
            ws.extracted_dir(),
            PathBuf::from("/srv/uploads/deploy-20260307-090502/extracted")
        );
    }
}
