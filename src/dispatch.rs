//! Action dispatch: maps a decoded `{action, params}` request to one hosting,
//! tree, or workspace operation and wraps the outcome in a result envelope.
//!
//! The request is a tagged enum rather than a string-keyed handler table, so a
//! missing required parameter is a decode error at the HTTP boundary instead
//! of a failed lookup inside a handler.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::hosting::GithubClient;
use crate::models::{CommitOutcome, Envelope};
use crate::tree;
use crate::workspace::Workspace;

/// Immutable per-process state handed to every dispatch.
#[derive(Clone)]
pub struct AppState {
    pub github: Arc<GithubClient>,
    pub workspace: Workspace,
}

fn default_true() -> bool {
    true
}

/// One variant per supported action, with its required parameters as typed
/// fields. Optional parameters default the way the webhook contract documents.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum ActionRequest {
    GetRepoUrl {
        repo_name: String,
    },
    CreateRepo {
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default = "default_true")]
        private: bool,
    },
    CreatePullRequest {
        repo_name: String,
        head: String,
        base: String,
        title: String,
        #[serde(default)]
        body: String,
    },
    ValidateRepoUrl {
        repo_url: String,
        #[serde(default)]
        token: Option<String>,
    },
    CommitFileToRepo {
        repo_name: String,
        file_path: String,
        content: String,
        commit_message: String,
    },
    GetFileContent {
        repo_name: String,
        file_path: String,
    },
    ListRepoFiles {
        repo_name: String,
        #[serde(default)]
        path: String,
        #[serde(default)]
        extension: String,
    },
    SummarizeRepo {
        repo_name: String,
    },
    SummarizeFile {
        repo_name: String,
        file_path: String,
    },
    ListRepos,
    DeleteRepo {
        repo_name: String,
    },
    InitRepo {
        local_path: String,
    },
    CloneRepo {
        repo_url: String,
        local_path: String,
    },
    UseExistingRepo {
        repo_url: String,
        local_path: String,
    },
    GitStatus {
        local_path: String,
    },
    CommitAll {
        local_path: String,
        message: String,
    },
    Push {
        local_path: String,
    },
    Pull {
        local_path: String,
    },
    CreateBranch {
        local_path: String,
        branch_name: String,
    },
    CheckoutBranch {
        local_path: String,
        branch_name: String,
    },
    Diff {
        local_path: String,
    },
    CommitAndPush {
        local_path: String,
        message: String,
    },
}

/// Every accepted action tag, used to tell "unknown action" apart from
/// "known action, bad params" when decoding.
pub const ACTIONS: &[&str] = &[
    "get_repo_url",
    "create_repo",
    "create_pull_request",
    "validate_repo_url",
    "commit_file_to_repo",
    "get_file_content",
    "list_repo_files",
    "summarize_repo",
    "summarize_file",
    "list_repos",
    "delete_repo",
    "init_repo",
    "clone_repo",
    "use_existing_repo",
    "git_status",
    "commit_all",
    "push",
    "pull",
    "create_branch",
    "checkout_branch",
    "diff",
    "commit_and_push",
];

impl ActionRequest {
    pub fn is_known(action: &str) -> bool {
        ACTIONS.contains(&action)
    }
}

pub async fn dispatch(state: &AppState, request: ActionRequest) -> Envelope {
    use ActionRequest::*;

    let github = state.github.as_ref();
    let workspace = &state.workspace;

    match request {
        GetRepoUrl { repo_name } => Envelope::from_result(
            github
                .get_repo_url(&repo_name)
                .await
                .map(|url| json!({ "url": url })),
        ),
        CreateRepo {
            name,
            description,
            private,
        } => Envelope::from_result(
            github
                .create_repo(&name, &description, private)
                .await
                .map(|url| json!({ "repo_url": url })),
        ),
        CreatePullRequest {
            repo_name,
            head,
            base,
            title,
            body,
        } => Envelope::from_result(
            github
                .create_pull_request(&repo_name, &head, &base, &title, &body)
                .await
                .map(|url| json!({ "pr_url": url })),
        ),
        ValidateRepoUrl { repo_url, token } => {
            let valid = github.validate_repo_url(&repo_url, token.as_deref()).await;
            Envelope::success(json!({ "valid": valid }))
        }
        CommitFileToRepo {
            repo_name,
            file_path,
            content,
            commit_message,
        } => Envelope::from_result(
            github
                .create_or_update_file(&repo_name, &file_path, &content, &commit_message)
                .await,
        ),
        GetFileContent {
            repo_name,
            file_path,
        } => Envelope::from_result(github.get_file_content(&repo_name, &file_path).await),
        ListRepoFiles {
            repo_name,
            path,
            extension,
        } => {
            let extension = (!extension.is_empty()).then_some(extension.as_str());
            Envelope::from_result(
                tree::build_tree(github, &repo_name, &path, extension)
                    .await
                    .map(|structure| json!({ "repo_name": repo_name, "structure": structure })),
            )
        }
        SummarizeRepo { repo_name } => {
            Envelope::from_result(tree::summarize_repo(github, &repo_name).await)
        }
        SummarizeFile {
            repo_name,
            file_path,
        } => {
            // No summarizer backend is wired up. Fetch first so a missing file
            // reports faithfully, then report the stub.
            match github.get_file_content(&repo_name, &file_path).await {
                Ok(_) => Envelope::error("summarize_file is not available"),
                Err(e) => Envelope::error(e),
            }
        }
        ListRepos => Envelope::from_result(
            github
                .list_repos()
                .await
                .map(|repos| json!({ "repos": repos })),
        ),
        DeleteRepo { repo_name } => Envelope::from_result(
            github
                .delete_repo(&repo_name)
                .await
                .map(|message| json!({ "message": message })),
        ),
        InitRepo { local_path } => {
            Envelope::from_result(workspace.init(&local_path).map(|path| json!({ "path": path })))
        }
        CloneRepo {
            repo_url,
            local_path,
        } => Envelope::from_result(workspace.clone_repo(&repo_url, &local_path)),
        UseExistingRepo {
            repo_url,
            local_path,
        } => Envelope::from_result(workspace.use_existing_or_clone(&repo_url, &local_path)),
        GitStatus { local_path } => Envelope::from_result(workspace.status(&local_path)),
        CommitAll {
            local_path,
            message,
        } => Envelope::from_result(workspace.commit_all(&local_path, &message)),
        Push { local_path } => Envelope::from_result(
            workspace
                .push(&local_path)
                .map(|branch| json!({ "pushed": true, "branch": branch })),
        ),
        Pull { local_path } => Envelope::from_result(
            workspace
                .pull(&local_path)
                .map(|outcome| json!({ "pulled": outcome })),
        ),
        CreateBranch {
            local_path,
            branch_name,
        } => Envelope::from_result(
            workspace
                .create_branch(&local_path, &branch_name)
                .map(|branch| json!({ "branch": branch })),
        ),
        CheckoutBranch {
            local_path,
            branch_name,
        } => Envelope::from_result(
            workspace
                .checkout_branch(&local_path, &branch_name)
                .map(|branch| json!({ "branch": branch })),
        ),
        Diff { local_path } => Envelope::from_result(
            workspace
                .diff(&local_path)
                .map(|diff| json!({ "diff": diff })),
        ),
        CommitAndPush {
            local_path,
            message,
        } => commit_and_push(workspace, &local_path, &message),
    }
}

/// Composite: push only after a commit that actually committed. Any other
/// commit outcome is returned unchanged and no push is attempted.
fn commit_and_push(workspace: &Workspace, local_path: &str, message: &str) -> Envelope {
    let commit = match workspace.commit_all(local_path, message) {
        Ok(commit) => commit,
        Err(e) => return Envelope::error(e),
    };
    if commit.outcome != CommitOutcome::Committed {
        return Envelope::success(commit);
    }

    match workspace.push(local_path) {
        Ok(branch) => Envelope::success(json!({
            "outcome": commit.outcome,
            "commit_id": commit.commit_id,
            "branch": branch,
            "pushed": true,
        })),
        Err(e) => Envelope::error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn decodes_actions_with_typed_params() {
        let request: ActionRequest = serde_json::from_value(json!({
            "action": "get_file_content",
            "params": { "repo_name": "octo/demo", "file_path": "src/main.rs" },
        }))
        .unwrap();
        assert!(matches!(request, ActionRequest::GetFileContent { .. }));

        let request: ActionRequest = serde_json::from_value(json!({
            "action": "list_repos",
        }))
        .unwrap();
        assert!(matches!(request, ActionRequest::ListRepos));
    }

    #[test]
    fn create_repo_defaults_to_private() {
        let request: ActionRequest = serde_json::from_value(json!({
            "action": "create_repo",
            "params": { "name": "demo" },
        }))
        .unwrap();
        let ActionRequest::CreateRepo {
            description,
            private,
            ..
        } = request
        else {
            panic!("wrong variant");
        };
        assert!(private);
        assert_eq!(description, "");
    }

    #[test]
    fn missing_required_param_is_a_decode_error() {
        let result: Result<ActionRequest, _> = serde_json::from_value(json!({
            "action": "get_file_content",
            "params": { "repo_name": "octo/demo" },
        }));
        assert!(result.unwrap_err().to_string().contains("file_path"));
    }

    #[test]
    fn known_action_list_matches_the_enum() {
        assert!(!ActionRequest::is_known("frobnicate"));

        // serde names every expected variant when rejecting an unknown tag;
        // keeps ACTIONS in sync with the enum
        let err = serde_json::from_value::<ActionRequest>(json!({ "action": "frobnicate" }))
            .unwrap_err()
            .to_string();
        for &action in ACTIONS {
            assert!(err.contains(action), "ACTIONS entry {} not in enum", action);
            assert!(ActionRequest::is_known(action));
        }
    }

    #[test]
    fn commit_and_push_gates_on_commit_outcome() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path()).unwrap();
        workspace.init("demo").unwrap();
        std::fs::write(dir.path().join("demo/a.txt"), "hello").unwrap();
        workspace.commit_all("demo", "initial").unwrap();

        // nothing staged: the commit envelope comes back unchanged and no push
        // is attempted (a push would fail, there is no origin remote)
        let envelope = commit_and_push(&workspace, "demo", "noop");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["outcome"], "nothing_to_commit");

        // a real change proceeds to the push, which fails loudly here
        std::fs::write(dir.path().join("demo/a.txt"), "changed").unwrap();
        let envelope = commit_and_push(&workspace, "demo", "update");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "error");
    }
}
