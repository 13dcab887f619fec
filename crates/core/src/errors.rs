//! Error types for the slackauthor core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. The
//! resolver folds them into [`ResolveError`] rather than returning them.

use thiserror::Error;

// ---------------------------------------------------------------------------
// GitHub errors
// ---------------------------------------------------------------------------

/// Errors from the GitHub REST API client.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested commit, repository, or user does not exist (or the
    /// token cannot see it).
    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Slack errors
// ---------------------------------------------------------------------------

/// Errors from the Slack Web API client.
///
/// "No member has this email" is not an error; directory lookups report it
/// as `Ok(None)`.
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP-level transport error.
    #[error("Slack HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-success HTTP status outside the Web API envelope.
    #[error("Slack HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The Web API answered `ok: false` with the given error code.
    #[error("Slack API error: {code}")]
    Api { code: String },

    /// HTTP 429.
    #[error("Slack rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: String },

    /// JSON deserialization failure.
    #[error("Slack response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// A single failed directory attempt, kept for reporting.
#[derive(Debug)]
pub struct CandidateFailure {
    pub candidate: String,
    pub error: SlackError,
}

/// Why a resolution could not be determined.
///
/// Carried inside [`Outcome::UpstreamError`](crate::identity::Outcome).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The GitHub call for the author failed.
    #[error("failed to fetch author of {subject}: {source}")]
    AuthorFetch {
        subject: String,
        #[source]
        source: GitHubError,
    },

    /// GitHub answered, but there is no usable author email.
    #[error("no email available for {subject}")]
    NoAuthorEmail { subject: String },

    /// Every candidate lookup errored; absence could not be established.
    #[error("Slack directory unavailable for all candidates: {}", summarize(.attempts))]
    DirectoryUnavailable { attempts: Vec<CandidateFailure> },
}

fn summarize(attempts: &[CandidateFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.candidate, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
