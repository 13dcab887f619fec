//! TOML-based configuration for slackauthor.
//!
//! Tokens are never written to the file. They are stored as `_env` fields
//! naming environment variables, and resolved at runtime via
//! [`AppConfig::resolve_env_vars`]. Every section has defaults, so an absent
//! file is equivalent to `AppConfig::default()`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::identity::classify::{DEFAULT_BOT_EMAILS, DEFAULT_NOREPLY_DOMAIN};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Slack API settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Email classification and candidate generation.
    #[serde(default)]
    pub identity: IdentityConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            github: GitHubConfig::default(),
            slack: SlackConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Environment variable holding the GitHub access token.
    #[serde(default = "default_github_token_env")]
    pub token_env: String,

    /// Resolved token (populated by `resolve_env_vars` or set directly).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_github_token_env() -> String {
    "GITHUB_TOKEN".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token_env: default_github_token_env(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// How the Slack member directory is queried.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryMode {
    /// One `users.lookupByEmail` call per candidate.
    #[default]
    Direct,
    /// One paginated `users.list` fetch, scanned locally.
    List,
}

impl std::str::FromStr for DirectoryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "list" => Ok(Self::List),
            other => Err(ConfigError::InvalidValue {
                field: "slack.directory".into(),
                detail: format!("expected 'direct' or 'list', got '{}'", other),
            }),
        }
    }
}

/// Slack Web API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Slack Web API base URL (default `https://slack.com/api`).
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,

    /// Environment variable holding the Slack bot token.
    #[serde(default = "default_slack_token_env")]
    pub token_env: String,

    /// Directory query strategy.
    #[serde(default)]
    pub directory: DirectoryMode,

    /// Resolved token.
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".into()
}
fn default_slack_token_env() -> String {
    "SLACK_TOKEN".into()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: default_slack_api_url(),
            token_env: default_slack_token_env(),
            directory: DirectoryMode::default(),
            token: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Email classification and candidate generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Also try the first-initial + surname alias (`john.doe` -> `jdoe`).
    #[serde(default = "default_true")]
    pub corporate_alias: bool,

    /// Domain GitHub substitutes for hidden addresses.
    #[serde(default = "default_noreply_domain")]
    pub noreply_domain: String,

    /// Addresses that identify automation rather than a person.
    #[serde(default = "default_bot_emails")]
    pub bot_emails: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_noreply_domain() -> String {
    DEFAULT_NOREPLY_DOMAIN.into()
}
fn default_bot_emails() -> Vec<String> {
    DEFAULT_BOT_EMAILS.iter().map(|s| s.to_string()).collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            corporate_alias: true,
            noreply_domain: default_noreply_domain(),
            bot_emails: default_bot_emails(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Populate missing tokens from the environment variables named by the
    /// `*_env` fields. Tokens already set (e.g. from CLI inputs) are kept.
    ///
    /// Missing variables only log a warning; use
    /// [`require_tokens`](Self::require_tokens) to enforce them.
    pub fn resolve_env_vars(&mut self) {
        info!("resolving environment variable references in config");

        if self.github.token.is_none() {
            self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
        }
        if self.slack.token.is_none() {
            self.slack.token = resolve_optional_env(&self.slack.token_env, "slack.token_env");
        }

        debug!("environment variable resolution complete");
    }

    /// Validate that all fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: "GitHub API URL must not be empty".into(),
            });
        }
        if self.slack.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "slack.api_url".into(),
                detail: "Slack API URL must not be empty".into(),
            });
        }
        if self.identity.noreply_domain.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.noreply_domain".into(),
                detail: "noreply domain must not be empty".into(),
            });
        }
        if self.identity.noreply_domain.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "identity.noreply_domain".into(),
                detail: "noreply domain must not contain '@'".into(),
            });
        }
        Ok(())
    }

    /// Fail unless both tokens have been resolved.
    pub fn require_tokens(&self) -> Result<(), ConfigError> {
        if self.github.token.is_none() {
            return Err(ConfigError::EnvVarMissing {
                var: self.github.token_env.clone(),
                field: "github.token_env".into(),
            });
        }
        if self.slack.token.is_none() {
            return Err(ConfigError::EnvVarMissing {
                var: self.slack.token_env.clone(),
                field: "slack.token_env".into(),
            });
        }
        Ok(())
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
