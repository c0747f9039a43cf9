//! Contents-API operations: single-level listings, file reads, and the
//! probe-then-act file write.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{DirEntry, EntryKind, FileContent, FileWriteOutcome, WriteAction};
use crate::tree::RepoReader;

use super::client::GithubClient;

/// Raw entry shape of the contents API.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

fn contents_url(qualified: &str, path: &str) -> String {
    if path.is_empty() {
        format!("/repos/{}/contents", qualified)
    } else {
        format!("/repos/{}/contents/{}", qualified, path)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

impl GithubClient {
    /// List one directory level, non-recursive. Order is the API's listing
    /// order. Symlinks and submodules are not traversable and are dropped.
    pub async fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<DirEntry>> {
        let qualified = self.qualify(repo).await?;
        let response = self
            .request(Method::GET, &contents_url(&qualified, path))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::PathNotFound(display_path(path).to_string()));
        }

        let listing: serde_json::Value = self.decode(response).await?;
        let Some(raw) = listing.as_array() else {
            return Err(AppError::InvalidPath(format!(
                "{} is not a directory",
                display_path(path)
            )));
        };

        let mut entries = Vec::new();
        for value in raw {
            let entry: ContentEntry = serde_json::from_value(value.clone())
                .map_err(|e| AppError::Internal(format!("malformed listing entry: {}", e)))?;
            let kind = match entry.entry_type.as_str() {
                "file" => EntryKind::File,
                "dir" => EntryKind::Directory,
                _ => continue,
            };
            entries.push(DirEntry {
                name: entry.name,
                path: entry.path,
                kind,
            });
        }

        Ok(entries)
    }

    /// Fetch and decode one file as UTF-8 text.
    pub async fn get_file_content(&self, repo: &str, file_path: &str) -> Result<FileContent> {
        let qualified = self.qualify(repo).await?;
        let response = self
            .request(Method::GET, &contents_url(&qualified, file_path))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::PathNotFound(file_path.to_string()));
        }

        let value: serde_json::Value = self.decode(response).await?;
        if value.is_array() {
            return Err(AppError::InvalidPath(format!("{} is not a file", file_path)));
        }

        let entry: ContentEntry = serde_json::from_value(value)
            .map_err(|e| AppError::Internal(format!("malformed content entry: {}", e)))?;
        let content = decode_blob(&entry)?;

        Ok(FileContent {
            filename: entry.name,
            content,
        })
    }

    /// Commit one file, creating or updating as appropriate. The existence
    /// probe is part of the contract: an update must carry the prior blob SHA
    /// to satisfy the API's optimistic-concurrency check, and an unconditional
    /// create on top of an existing path is rejected.
    pub async fn create_or_update_file(
        &self,
        repo: &str,
        file_path: &str,
        content: &str,
        message: &str,
    ) -> Result<FileWriteOutcome> {
        let qualified = self.qualify(repo).await?;
        let existing_sha = self.probe_sha(&qualified, file_path).await?;

        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
        });
        if let Some(sha) = &existing_sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .request(Method::PUT, &contents_url(&qualified, file_path))
            .json(&body)
            .send()
            .await?;
        let result: serde_json::Value = self.decode(response).await?;
        let commit_sha = result
            .pointer("/commit/sha")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(FileWriteOutcome {
            path: file_path.to_string(),
            action: if existing_sha.is_some() {
                WriteAction::Updated
            } else {
                WriteAction::Created
            },
            commit_sha,
        })
    }

    async fn probe_sha(&self, qualified: &str, file_path: &str) -> Result<Option<String>> {
        let response = self
            .request(Method::GET, &contents_url(qualified, file_path))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let value: serde_json::Value = self.decode(response).await?;
        if value.is_array() {
            return Err(AppError::InvalidPath(format!("{} is not a file", file_path)));
        }
        let sha = value
            .get("sha")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::Internal("content entry without sha".to_string()))?;

        Ok(Some(sha))
    }
}

fn decode_blob(entry: &ContentEntry) -> Result<String> {
    let encoded = entry
        .content
        .as_deref()
        .ok_or_else(|| AppError::InvalidPath(format!("{} has no content", entry.path)))?;

    match entry.encoding.as_deref() {
        // The contents API wraps base64 at 60 columns.
        Some("base64") | None => {
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = BASE64
                .decode(compact.as_bytes())
                .map_err(|e| AppError::Internal(format!("invalid base64 content: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|_| AppError::Internal(format!("{} is not valid UTF-8", entry.path)))
        }
        Some(other) => Err(AppError::Internal(format!(
            "unsupported content encoding: {}",
            other
        ))),
    }
}

#[async_trait::async_trait]
impl RepoReader for GithubClient {
    async fn list_dir(&self, repo: &str, path: &str) -> Result<Vec<DirEntry>> {
        GithubClient::list_dir(self, repo, path).await
    }

    async fn read_file(&self, repo: &str, path: &str) -> Result<String> {
        Ok(self.get_file_content(repo, path).await?.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> GithubClient {
        GithubClient::with_api_root("test-token".to_string(), server.url())
    }

    #[tokio::test]
    async fn existing_file_is_updated_with_prior_sha() {
        let mut server = mockito::Server::new_async().await;
        let probe = server
            .mock("GET", "/repos/octo/demo/contents/a.txt")
            .with_status(200)
            .with_body(r#"{"name":"a.txt","path":"a.txt","type":"file","sha":"oldsha"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/octo/demo/contents/a.txt")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "sha": "oldsha",
            })))
            .with_status(200)
            .with_body(r#"{"commit":{"sha":"newsha"}}"#)
            .create_async()
            .await;

        let outcome = client(&server)
            .create_or_update_file("octo/demo", "a.txt", "hello", "update a.txt")
            .await
            .unwrap();

        assert_eq!(outcome.action, WriteAction::Updated);
        assert_eq!(outcome.commit_sha.as_deref(), Some("newsha"));
        probe.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn missing_file_is_created_without_sha() {
        let mut server = mockito::Server::new_async().await;
        let probe = server
            .mock("GET", "/repos/octo/demo/contents/new.txt")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/octo/demo/contents/new.txt")
            .with_status(201)
            .with_body(r#"{"commit":{"sha":"firstsha"}}"#)
            .create_async()
            .await;

        let outcome = client(&server)
            .create_or_update_file("octo/demo", "new.txt", "hello", "add new.txt")
            .await
            .unwrap();

        assert_eq!(outcome.action, WriteAction::Created);
        probe.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn list_dir_maps_entries_and_drops_submodules() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octo/demo/contents")
            .with_status(200)
            .with_body(
                r#"[
                    {"name":"src","path":"src","type":"dir","sha":"s1"},
                    {"name":"main.rs","path":"main.rs","type":"file","sha":"s2"},
                    {"name":"vendored","path":"vendored","type":"submodule","sha":"s3"}
                ]"#,
            )
            .create_async()
            .await;

        let entries = client(&server).list_dir("octo/demo", "").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "src");
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].name, "main.rs");
        assert_eq!(entries[1].kind, EntryKind::File);
    }

    fn entry(content: &str, encoding: Option<&str>) -> ContentEntry {
        ContentEntry {
            name: "a.txt".to_string(),
            path: "a.txt".to_string(),
            entry_type: "file".to_string(),
            content: Some(content.to_string()),
            encoding: encoding.map(str::to_string),
        }
    }

    #[test]
    fn decodes_wrapped_base64() {
        // "hello world" split across two base64 lines, as the API serves it
        let decoded = decode_blob(&entry("aGVsbG8g\nd29ybGQ=\n", Some("base64"))).unwrap();
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn rejects_non_utf8_blob() {
        let encoded = BASE64.encode([0xff, 0xfe, 0x00, 0x01]);
        let err = decode_blob(&entry(&encoded, Some("base64"))).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn rejects_unknown_encoding() {
        let err = decode_blob(&entry("xx", Some("rot13"))).unwrap_err();
        assert!(err.to_string().contains("unsupported content encoding"));
    }
}
