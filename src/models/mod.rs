//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized into the result envelope's `data` payload.
//! - `envelope`: the uniform success/error envelope
//! - `tree`: DirEntry, TreeNode, FileSummary, RepoSummary
//! - `hosting`: FileContent, FileWriteOutcome
//! - `workspace`: WorkspaceStatus, CommitResult, CloneResult, PullOutcome

pub mod envelope;
pub mod hosting;
pub mod tree;
pub mod workspace;

pub use envelope::Envelope;
pub use hosting::*;
pub use tree::*;
pub use workspace::*;
