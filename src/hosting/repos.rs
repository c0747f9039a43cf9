//! Repository-level GitHub operations: create/get/delete/list repositories,
//! pull requests, and repository URL validation.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;

use super::client::{api_error, GithubClient};

#[derive(Debug, Deserialize)]
struct RepoInfo {
    full_name: String,
    clone_url: String,
}

impl GithubClient {
    pub async fn get_repo_url(&self, repo: &str) -> Result<String> {
        let qualified = self.qualify(repo).await?;
        let response = self
            .request(Method::GET, &format!("/repos/{}", qualified))
            .send()
            .await?;
        let info: RepoInfo = self.decode(response).await?;
        Ok(info.clone_url)
    }

    pub async fn create_repo(&self, name: &str, description: &str, private: bool) -> Result<String> {
        let body = json!({
            "name": name,
            "description": description,
            "private": private,
        });
        let response = self
            .request(Method::POST, "/user/repos")
            .json(&body)
            .send()
            .await?;
        let info: RepoInfo = self.decode(response).await?;
        Ok(info.clone_url)
    }

    pub async fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        #[derive(Deserialize)]
        struct PullInfo {
            html_url: String,
        }

        let qualified = self.qualify(repo).await?;
        let payload = json!({
            "title": title,
            "body": body,
            "head": head,
            "base": base,
        });
        let response = self
            .request(Method::POST, &format!("/repos/{}/pulls", qualified))
            .json(&payload)
            .send()
            .await?;
        let info: PullInfo = self.decode(response).await?;
        Ok(info.html_url)
    }

    pub async fn list_repos(&self) -> Result<Vec<String>> {
        let response = self.request(Method::GET, "/user/repos").send().await?;
        let repos: Vec<RepoInfo> = self.decode(response).await?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }

    pub async fn delete_repo(&self, repo: &str) -> Result<String> {
        let qualified = self.qualify(repo).await?;
        let response = self
            .request(Method::DELETE, &format!("/repos/{}", qualified))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(format!("Deleted {}", qualified))
        } else {
            Err(api_error(status, response).await)
        }
    }

    /// Syntactic plus existence check for a repository URL. Never errors: any
    /// malformed input or failed probe is `false`. A caller-supplied token
    /// overrides the client's own for the probe.
    pub async fn validate_repo_url(&self, url: &str, token: Option<&str>) -> bool {
        let Some((owner, repo)) = parse_repo_url(url) else {
            return false;
        };
        let request = self.request_as(
            Method::GET,
            &format!("/repos/{}/{}", owner, repo),
            token.unwrap_or_else(|| self.token_ref()),
        );
        match request.send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }
}

/// Extract `owner/repo` from a GitHub URL. The host must be github.com and the
/// path must resolve to exactly two segments.
pub(crate) fn parse_repo_url(url: &str) -> Option<(String, String)> {
    let trimmed = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    let path = trimmed.strip_prefix("github.com/")?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/');
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() || segments.next().is_some() {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}
