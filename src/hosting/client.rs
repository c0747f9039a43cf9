use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

pub const API_ROOT: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("git-bridge/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client. The token is read once at construction and never
/// mutated; the authenticated login is resolved lazily on first use and cached
/// for the process lifetime.
pub struct GithubClient {
    http: Client,
    token: String,
    api_root: String,
    login: OnceCell<String>,
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        Self::with_api_root(token, API_ROOT.to_string())
    }

    /// Point the client at a different API root. Used by tests.
    pub fn with_api_root(token: String, api_root: String) -> Self {
        Self {
            http: Client::new(),
            token,
            api_root,
            login: OnceCell::new(),
        }
    }

    pub(crate) fn token_ref(&self) -> &str {
        &self.token
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_as(method, path, &self.token)
    }

    pub(crate) fn request_as(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_root, path))
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// Decode a response body, mapping non-2xx statuses to `AppError::Api`
    /// carrying the message GitHub put in the body.
    pub(crate) async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(api_error(status, response).await)
        }
    }

    /// The authenticated user's login, resolved once per process.
    pub(crate) async fn login(&self) -> Result<&str> {
        self.login
            .get_or_try_init(|| async {
                #[derive(Deserialize)]
                struct User {
                    login: String,
                }

                let response = self.request(Method::GET, "/user").send().await?;
                let user: User = self.decode(response).await?;
                Ok::<_, AppError>(user.login)
            })
            .await
            .map(String::as_str)
    }

    /// Qualify a bare repository name against the authenticated user; names
    /// already containing an owner pass through unchanged.
    pub(crate) async fn qualify(&self, repo: &str) -> Result<String> {
        if repo.contains('/') {
            Ok(repo.to_string())
        } else {
            Ok(format!("{}/{}", self.login().await?, repo))
        }
    }
}

pub(crate) async fn api_error(status: StatusCode, response: reqwest::Response) -> AppError {
    #[derive(Deserialize)]
    struct ApiMessage {
        message: String,
    }

    let detail = match response.json::<ApiMessage>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    AppError::Api {
        status: status.as_u16(),
        detail,
    }
}
