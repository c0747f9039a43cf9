use git2::{BranchType, DiffFormat, DiffOptions, IndexAddOption, Repository, StatusOptions};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{
    CloneResult, CommitOutcome, CommitResult, PullOutcome, WorkingCopyState, WorkspaceStatus,
};

/// Local working copies live under one configured root. Every operation opens
/// the repository afresh; no handle is held between calls.
#[derive(Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Internal(format!(
                "cannot create workspace root {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Paths from the caller are resolved against the root unless absolute.
    fn resolve(&self, local_path: &str) -> PathBuf {
        let path = Path::new(local_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn open(&self, local_path: &str) -> Result<Repository> {
        let path = self.resolve(local_path);
        Repository::open(&path)
            .map_err(|_| AppError::WorkspaceNotFound(path.display().to_string()))
    }

    pub fn init(&self, local_path: &str) -> Result<String> {
        let path = self.resolve(local_path);
        Repository::init(&path)?;
        Ok(path.display().to_string())
    }

    /// Clone into `local_path`, replacing any existing directory there.
    pub fn clone_repo(&self, remote_url: &str, local_path: &str) -> Result<CloneResult> {
        let path = self.resolve(local_path);
        if path.exists() {
            std::fs::remove_dir_all(&path).map_err(|e| {
                AppError::Internal(format!("cannot remove {}: {}", path.display(), e))
            })?;
        }
        tracing::info!("Cloning {} into {}", remote_url, path.display());
        Repository::clone(remote_url, &path)?;
        Ok(CloneResult {
            path: path.display().to_string(),
            state: WorkingCopyState::Cloned,
        })
    }

    /// Reuse an existing working copy, reporting whether it is clean or dirty;
    /// clone afresh when nothing is there yet.
    pub fn use_existing_or_clone(&self, remote_url: &str, local_path: &str) -> Result<CloneResult> {
        let path = self.resolve(local_path);
        if !path.exists() {
            return self.clone_repo(remote_url, local_path);
        }

        let repo = Repository::open(&path)
            .map_err(|_| AppError::WorkspaceNotFound(path.display().to_string()))?;
        let state = if is_dirty(&repo)? {
            WorkingCopyState::Dirty
        } else {
            WorkingCopyState::Clean
        };
        Ok(CloneResult {
            path: path.display().to_string(),
            state,
        })
    }

    pub fn status(&self, local_path: &str) -> Result<WorkspaceStatus> {
        let repo = self.open(local_path)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = repo.statuses(Some(&mut opts))?;

        let mut untracked = Vec::new();
        let mut changed = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else { continue };
            let status = entry.status();
            if status.contains(git2::Status::WT_NEW) {
                untracked.push(path.to_string());
            } else if status.intersects(
                git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE
                    | git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE,
            ) {
                changed.push(path.to_string());
            }
        }

        Ok(WorkspaceStatus {
            is_dirty: !untracked.is_empty() || !changed.is_empty(),
            untracked_files: untracked,
            changed_files: changed,
        })
    }

    /// Stage everything and commit. Reports `nothing_to_commit` when the
    /// staged tree is identical to HEAD, so callers can gate follow-up pushes.
    pub fn commit_all(&self, local_path: &str, message: &str) -> Result<CommitResult> {
        let repo = self.open(local_path)?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_oid = index.write_tree()?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                None
            }
            Err(e) => return Err(e.into()),
        };

        let nothing_staged = match &parent {
            Some(parent) => parent.tree_id() == tree_oid,
            None => index.len() == 0,
        };
        if nothing_staged {
            return Ok(CommitResult {
                outcome: CommitOutcome::NothingToCommit,
                commit_id: None,
                message: message.to_string(),
            });
        }

        let tree = repo.find_tree(tree_oid)?;
        let signature = repo
            .signature()
            .or_else(|_| git2::Signature::now("git-bridge", "git-bridge@localhost"))?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        Ok(CommitResult {
            outcome: CommitOutcome::Committed,
            commit_id: Some(oid.to_string()),
            message: message.to_string(),
        })
    }

    /// Push the current branch to origin. Returns the branch name.
    pub fn push(&self, local_path: &str) -> Result<String> {
        let repo = self.open(local_path)?;
        let branch = current_branch(&repo)?;
        let mut remote = repo.find_remote("origin")?;
        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote.push(&[refspec.as_str()], None)?;
        Ok(branch)
    }

    /// Fetch from origin and fast-forward the current branch. A state that
    /// would require a real merge is reported as an error, not resolved.
    pub fn pull(&self, local_path: &str) -> Result<PullOutcome> {
        let repo = self.open(local_path)?;
        let branch = current_branch(&repo)?;
        let mut remote = repo.find_remote("origin")?;
        remote.fetch(&[branch.as_str()], None, None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            Ok(PullOutcome::UpToDate)
        } else if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{}", branch);
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(fetch_commit.id(), "fast-forward")?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;
            Ok(PullOutcome::FastForwarded)
        } else {
            Err(AppError::Internal(format!(
                "pull requires a merge on branch {}",
                branch
            )))
        }
    }

    /// Create a branch at the current HEAD commit without switching to it.
    pub fn create_branch(&self, local_path: &str, name: &str) -> Result<String> {
        let repo = self.open(local_path)?;
        let head_commit = repo.head()?.peel_to_commit()?;
        let branch = repo.branch(name, &head_commit, false)?;
        Ok(branch.name()?.unwrap_or(name).to_string())
    }

    pub fn checkout_branch(&self, local_path: &str, name: &str) -> Result<String> {
        let repo = self.open(local_path)?;
        let branch = repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| AppError::BranchNotFound(name.to_string()))?;
        let refname = branch
            .get()
            .name()
            .ok_or_else(|| AppError::Internal("branch reference is not valid UTF-8".to_string()))?
            .to_string();

        repo.set_head(&refname)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;
        Ok(name.to_string())
    }

    /// Unified diff of the working tree (index included) against HEAD.
    pub fn diff(&self, local_path: &str) -> Result<String> {
        let repo = self.open(local_path)?;
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };

        let mut opts = DiffOptions::new();
        opts.context_lines(3).include_untracked(true);
        let diff = repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            if matches!(origin, '+' | '-' | ' ') {
                text.push(origin);
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(text)
    }
}

fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.head()?;
    head.shorthand()
        .map(str::to_string)
        .ok_or_else(|| AppError::Internal("HEAD is detached".to_string()))
}

fn is_dirty(repo: &Repository) -> Result<bool> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true).recurse_untracked_dirs(true);
    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(!statuses.is_empty())
}
