pub mod walker;

pub use walker::{build_tree, flatten_files, summarize_repo, RepoReader};
