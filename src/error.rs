//! Application error types and HTTP response mapping.
//!
//! `AppError` covers every operation-level failure (GitHub API, git2, path
//! resolution). Operation errors never surface as HTTP statuses: each handler
//! converts them to an error envelope at its boundary, so the response stays
//! 200 and the caller inspects the envelope's `status` field.
//!
//! `RequestError` covers request-shape failures (missing or unknown action,
//! undecodable params) and is the only error that maps to a 400 response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Tree depth limit exceeded under {0}")]
    DepthLimit(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Request-shape failures: the only errors that produce a non-200 response.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Missing 'action' in payload.")]
    MissingAction,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid params for action '{action}': {detail}")]
    InvalidParams { action: String, detail: String },

    #[error("Invalid request: {0}")]
    Malformed(String),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "detail": self.to_string(),
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
