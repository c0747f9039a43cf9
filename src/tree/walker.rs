use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{AppError, Result};
use crate::models::{DirEntry, EntryKind, FileSummary, RepoSummary, TreeNode};

/// Remote-read capability the walker is built over. The GitHub client is the
/// production implementation; tests supply an in-memory fake.
#[async_trait::async_trait]
pub trait RepoReader: Send + Sync {
    /// One directory level, non-recursive, in the remote's listing order.
    async fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<DirEntry>>;

    /// One file's content, decoded as UTF-8 text.
    async fn read_file(&self, repo: &str, path: &str) -> Result<String>;
}

/// Hosting services do not produce cyclic trees, but the walk still refuses to
/// recurse without bound.
const MAX_DEPTH: usize = 256;

/// Recursively enumerate the remote directory structure under `path`.
///
/// Files are kept iff `extension` is absent or their name ends with it;
/// directories are always traversed and kept even when the filter leaves them
/// with no children. Node order is the remote listing order. A failed listing
/// at any level fails the whole walk; there is no partial-tree result.
pub async fn build_tree(
    reader: &dyn RepoReader,
    repo: &str,
    path: &str,
    extension: Option<&str>,
) -> Result<Vec<TreeNode>> {
    build_level(reader, repo, path, extension, 0).await
}

fn build_level<'a>(
    reader: &'a dyn RepoReader,
    repo: &'a str,
    path: &'a str,
    extension: Option<&'a str>,
    depth: usize,
) -> BoxFuture<'a, Result<Vec<TreeNode>>> {
    async move {
        if depth >= MAX_DEPTH {
            return Err(AppError::DepthLimit(path.to_string()));
        }

        let entries = reader.list_dir(repo, path).await?;
        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry.kind {
                EntryKind::File => {
                    if matches_extension(&entry.name, extension) {
                        nodes.push(TreeNode {
                            name: entry.name,
                            path: entry.path,
                            kind: EntryKind::File,
                            children: None,
                        });
                    }
                }
                EntryKind::Directory => {
                    let children =
                        build_level(reader, repo, &entry.path, extension, depth + 1).await?;
                    nodes.push(TreeNode {
                        name: entry.name,
                        path: entry.path,
                        kind: EntryKind::Directory,
                        children: Some(children),
                    });
                }
            }
        }

        Ok(nodes)
    }
    .boxed()
}

fn matches_extension(name: &str, extension: Option<&str>) -> bool {
    match extension {
        Some(ext) if !ext.is_empty() => name.ends_with(ext),
        _ => true,
    }
}

/// Depth-first pre-order file paths. Directory nodes are descended into but
/// not emitted themselves.
pub fn flatten_files(tree: &[TreeNode]) -> Vec<String> {
    let mut paths = Vec::new();
    collect_files(tree, &mut paths);
    paths
}

fn collect_files(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        match node.kind {
            EntryKind::File => out.push(node.path.clone()),
            EntryKind::Directory => {
                if let Some(children) = &node.children {
                    collect_files(children, out);
                }
            }
        }
    }
}

/// Build the full tree, then fetch every file sequentially. A single file's
/// failure is recorded as a skipped entry and never aborts the aggregate; only
/// a failed tree build propagates, before any content is fetched.
pub async fn summarize_repo(reader: &dyn RepoReader, repo: &str) -> Result<RepoSummary> {
    let structure = build_tree(reader, repo, "", None).await?;
    let paths = flatten_files(&structure);
    tracing::debug!("Fetching {} files from {}", paths.len(), repo);

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match reader.read_file(repo, &path).await {
            Ok(content) => files.push(FileSummary::loaded(path, content)),
            Err(e) => files.push(FileSummary::skipped(path, e.to_string())),
        }
    }

    Ok(RepoSummary {
        repo_name: repo.to_string(),
        structure,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn file(name: &str, path: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
        }
    }

    fn dir(name: &str, path: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::Directory,
        }
    }

    /// In-memory listing fake: directory path -> entries, file path -> content.
    #[derive(Default)]
    struct FakeRepo {
        dirs: HashMap<String, Vec<DirEntry>>,
        files: HashMap<String, String>,
        broken_files: Vec<String>,
        broken_dirs: Vec<String>,
        reads: AtomicUsize,
    }

    impl FakeRepo {
        fn with_dir(mut self, path: &str, entries: Vec<DirEntry>) -> Self {
            self.dirs.insert(path.to_string(), entries);
            self
        }

        fn with_file(mut self, path: &str, content: &str) -> Self {
            self.files.insert(path.to_string(), content.to_string());
            self
        }

        fn with_broken_file(mut self, path: &str) -> Self {
            self.broken_files.push(path.to_string());
            self
        }

        fn with_broken_dir(mut self, path: &str) -> Self {
            self.broken_dirs.push(path.to_string());
            self
        }
    }

    #[async_trait::async_trait]
    impl RepoReader for FakeRepo {
        async fn list_dir(&self, _repo: &str, path: &str) -> Result<Vec<DirEntry>> {
            if self.broken_dirs.iter().any(|p| p == path) {
                return Err(AppError::Internal(format!("listing failed: {}", path)));
            }
            self.dirs
                .get(path)
                .cloned()
                .ok_or_else(|| AppError::PathNotFound(path.to_string()))
        }

        async fn read_file(&self, _repo: &str, path: &str) -> Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.broken_files.iter().any(|p| p == path) {
                return Err(AppError::Internal(format!("fetch failed: {}", path)));
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| AppError::PathNotFound(path.to_string()))
        }
    }

    #[tokio::test]
    async fn flat_tree_is_complete_and_ordered() {
        let repo = FakeRepo::default().with_dir(
            "",
            vec![file("b.rs", "b.rs"), file("a.rs", "a.rs"), file("c.md", "c.md")],
        );

        let tree = build_tree(&repo, "r", "", None).await.unwrap();
        assert_eq!(tree.len(), 3);
        // listing order, not sorted
        assert_eq!(flatten_files(&tree), vec!["b.rs", "a.rs", "c.md"]);
    }

    #[tokio::test]
    async fn extension_filter_keeps_empty_directories() {
        let repo = FakeRepo::default()
            .with_dir(
                "",
                vec![file("main.rs", "main.rs"), file("README.md", "README.md"), dir("docs", "docs")],
            )
            .with_dir("docs", vec![file("guide.md", "docs/guide.md")]);

        let tree = build_tree(&repo, "r", "", Some(".rs")).await.unwrap();
        let paths = flatten_files(&tree);
        assert_eq!(paths, vec!["main.rs"]);
        assert!(paths.iter().all(|p| p.ends_with(".rs")));

        // the filtered-out directory is still present, with empty children
        let docs = tree
            .iter()
            .find(|n| n.kind == EntryKind::Directory)
            .unwrap();
        assert_eq!(docs.name, "docs");
        assert!(docs.children.as_ref().is_some_and(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn deep_tree_flattens_to_single_path() {
        let repo = FakeRepo::default()
            .with_dir("", vec![dir("a", "a")])
            .with_dir("a", vec![dir("b", "a/b")])
            .with_dir("a/b", vec![dir("c", "a/b/c")])
            .with_dir("a/b/c", vec![file("leaf.txt", "a/b/c/leaf.txt")]);

        let tree = build_tree(&repo, "r", "", None).await.unwrap();
        let paths = flatten_files(&tree);
        assert_eq!(paths, vec!["a/b/c/leaf.txt"]);
        assert_eq!(paths[0].split('/').count(), 4);
    }

    #[tokio::test]
    async fn single_file_failure_does_not_abort_summary() {
        let repo = FakeRepo::default()
            .with_dir(
                "",
                vec![file("one", "one"), file("two", "two"), file("three", "three")],
            )
            .with_file("one", "1")
            .with_broken_file("two")
            .with_file("three", "3");

        let summary = summarize_repo(&repo, "r").await.unwrap();
        assert_eq!(summary.files.len(), 3);
        assert!(matches!(&summary.files[0], FileSummary::Loaded { path, content } if path == "one" && content == "1"));
        assert!(matches!(&summary.files[1], FileSummary::Skipped { path, skipped: true, .. } if path == "two"));
        assert!(matches!(&summary.files[2], FileSummary::Loaded { path, content } if path == "three" && content == "3"));
    }

    #[tokio::test]
    async fn failed_root_listing_fetches_nothing() {
        let repo = FakeRepo::default().with_broken_dir("");

        let result = summarize_repo(&repo, "r").await;
        assert!(result.is_err());
        assert_eq!(repo.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_nested_listing_fails_whole_walk() {
        let repo = FakeRepo::default()
            .with_dir("", vec![file("top.txt", "top.txt"), dir("sub", "sub")])
            .with_broken_dir("sub");

        assert!(build_tree(&repo, "r", "", None).await.is_err());
    }

    #[tokio::test]
    async fn cyclic_listing_hits_depth_cap() {
        // a directory that lists itself
        let repo = FakeRepo::default().with_dir("loop", vec![dir("loop", "loop")]);

        let err = build_tree(&repo, "r", "loop", None).await.unwrap_err();
        assert!(matches!(err, AppError::DepthLimit(_)));
    }
}
