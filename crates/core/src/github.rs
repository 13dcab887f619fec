//! GitHub REST API client.
//!
//! Only the two reads the resolver needs: a commit's author and a user's
//! public profile.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::GitHubError;
use crate::identity::AuthorSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: GitHubCommitDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommitDetail {
    pub message: String,
    pub author: Option<GitHubGitActor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubGitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub name: Option<String>,
    /// Public profile email; `null` when unset or hidden.
    pub email: Option<String>,
}

impl GitHubCommit {
    /// The git author email recorded in the commit, if any.
    pub fn author_email(&self) -> Option<&str> {
        self.commit
            .author
            .as_ref()
            .and_then(|a| a.email.as_deref())
            .filter(|e| !e.is_empty())
    }
}

/// Asynchronous GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let token = token.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("slackauthor/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        info!(api_url = %api_url, "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            token,
        })
    }

    /// `GET /repos/{owner}/{repo}/commits/{ref}`
    #[instrument(skip(self))]
    pub async fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<GitHubCommit, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url, owner, repo, reference
        );
        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;
        check_response(&resp, &format!("{}/{}@{}", owner, repo, reference))?;
        let commit: GitHubCommit = resp
            .json()
            .await
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;
        debug!(sha = %commit.sha, "fetched commit");
        Ok(commit)
    }

    /// `GET /users/{username}`
    #[instrument(skip(self))]
    pub async fn get_user(&self, username: &str) -> Result<GitHubUser, GitHubError> {
        let url = format!("{}/users/{}", self.api_url, username);
        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;
        check_response(&resp, &format!("user {}", username))?;
        let user: GitHubUser = resp
            .json()
            .await
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;
        debug!(login = %user.login, "fetched user");
        Ok(user)
    }
}

#[async_trait]
impl AuthorSource for GitHubClient {
    async fn commit_author_email(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<Option<String>, GitHubError> {
        let commit = self.get_commit(owner, repo, reference).await?;
        Ok(commit.author_email().map(str::to_string))
    }

    async fn user_email(&self, username: &str) -> Result<Option<String>, GitHubError> {
        let user = self.get_user(username).await?;
        Ok(user.email.filter(|e| !e.is_empty()))
    }
}

fn check_response(resp: &reqwest::Response, subject: &str) -> Result<(), GitHubError> {
    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    status_to_result(
        resp.status().as_u16(),
        header("x-ratelimit-remaining").as_deref(),
        header("x-ratelimit-reset").as_deref(),
        subject,
    )
}

/// Map an HTTP status (plus rate-limit headers) to the error taxonomy.
/// GitHub signals an exhausted quota with 403 and `x-ratelimit-remaining: 0`.
fn status_to_result(
    status: u16,
    remaining: Option<&str>,
    reset: Option<&str>,
    subject: &str,
) -> Result<(), GitHubError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let rate_limited = status == 429 || (status == 403 && remaining == Some("0"));
    if rate_limited {
        return Err(GitHubError::RateLimited {
            reset_at: reset.unwrap_or("unknown").to_string(),
        });
    }
    match status {
        401 | 403 => Err(GitHubError::AuthenticationFailed(format!("HTTP {}", status))),
        404 => Err(GitHubError::NotFound(subject.to_string())),
        _ => Err(GitHubError::ApiError {
            status,
            body: format!("HTTP {} for {}", status, subject),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_author_email_parsed() {
        let json = r#"{
            "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
            "commit": {
                "message": "Fix all the bugs",
                "author": { "name": "Monalisa Octocat", "email": "mona@github.com", "date": "2011-04-14T16:00:49Z" },
                "committer": { "name": "Monalisa Octocat", "email": "mona@github.com", "date": "2011-04-14T16:00:49Z" }
            },
            "author": { "login": "octocat", "id": 1 },
            "parents": []
        }"#;
        let commit: GitHubCommit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.author_email(), Some("mona@github.com"));
    }

    #[test]
    fn test_commit_without_author_email() {
        let json = r#"{
            "sha": "abc",
            "commit": { "message": "x", "author": { "name": "Someone", "email": "" } }
        }"#;
        let commit: GitHubCommit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.author_email(), None);

        let json = r#"{ "sha": "abc", "commit": { "message": "x", "author": null } }"#;
        let commit: GitHubCommit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.author_email(), None);
    }

    #[test]
    fn test_user_with_hidden_email() {
        let json = r#"{ "login": "octocat", "id": 1, "name": "The Octocat", "email": null }"#;
        let user: GitHubUser = serde_json::from_str(json).unwrap();
        assert!(user.email.is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_to_result(200, None, None, "x").is_ok());
        assert!(matches!(
            status_to_result(401, None, None, "x"),
            Err(GitHubError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            status_to_result(403, Some("42"), None, "x"),
            Err(GitHubError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            status_to_result(404, None, None, "acme/web@main"),
            Err(GitHubError::NotFound(ref s)) if s == "acme/web@main"
        ));
        assert!(matches!(
            status_to_result(500, None, None, "x"),
            Err(GitHubError::ApiError { status: 500, .. })
        ));
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(matches!(
            status_to_result(403, Some("0"), Some("1700000000"), "x"),
            Err(GitHubError::RateLimited { ref reset_at }) if reset_at == "1700000000"
        ));
        assert!(matches!(
            status_to_result(429, None, None, "x"),
            Err(GitHubError::RateLimited { ref reset_at }) if reset_at == "unknown"
        ));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GitHubClient::new("https://api.github.com/", "ghp_test").unwrap();
        assert_eq!(client.api_url, "https://api.github.com");
    }
}
