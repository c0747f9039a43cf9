//! Local working-copy operation DTOs.
//!
//! - `WorkspaceStatus`: dirty flag plus untracked/changed path lists
//! - `CommitResult`: commit outcome the dispatcher checks before chaining a push
//! - `CloneResult`: how a working copy came to exist (fresh clone vs reuse)
//! - `PullOutcome`: what a fast-forward-only pull actually did

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceStatus {
    pub is_dirty: bool,
    pub untracked_files: Vec<String>,
    pub changed_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitResult {
    pub outcome: CommitOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkingCopyState {
    Cloned,
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloneResult {
    pub path: String,
    pub state: WorkingCopyState,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PullOutcome {
    UpToDate,
    FastForwarded,
}
