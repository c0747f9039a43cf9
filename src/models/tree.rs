//! Remote repository tree DTOs.
//!
//! - `DirEntry`: one entry of a single-level directory listing (the walker's
//!   building block)
//! - `TreeNode`: recursive tree node; `children` is `Some` exactly for
//!   directories, populated only after the directory listed successfully
//! - `FileSummary`: per-file outcome of a summarization pass
//! - `RepoSummary`: aggregate returned by `summarize_repo`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Either the fetched content or a per-file skip record. A skipped entry keeps
/// its place in the output ordering.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileSummary {
    Loaded {
        path: String,
        content: String,
    },
    Skipped {
        path: String,
        skipped: bool,
        reason: String,
    },
}

impl FileSummary {
    pub fn loaded(path: String, content: String) -> Self {
        FileSummary::Loaded { path, content }
    }

    pub fn skipped(path: String, reason: String) -> Self {
        FileSummary::Skipped {
            path,
            skipped: true,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoSummary {
    pub repo_name: String,
    pub structure: Vec<TreeNode>,
    pub files: Vec<FileSummary>,
}
