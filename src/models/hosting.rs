//! GitHub operation response DTOs.

use serde::Serialize;

/// Decoded file fetched through the contents API.
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Created,
    Updated,
}

/// Result of a create-or-update commit to a remote file.
#[derive(Debug, Clone, Serialize)]
pub struct FileWriteOutcome {
    pub path: String,
    pub action: WriteAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}
