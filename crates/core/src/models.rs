//! Data types shared across the resolver, the API clients, and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The Slack member matched for a commit author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedMember {
    /// Slack member ID (e.g. `U024BE7LH`), usable in `<@...>` mentions.
    pub member_id: String,
    /// Slack handle.
    pub username: String,
    /// The candidate address that matched.
    pub email: String,
}

/// How the author's email is obtained from GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorQuery {
    /// Author of a commit, identified by SHA, branch, or tag.
    Commit {
        owner: String,
        repo: String,
        reference: String,
    },
    /// Public profile email of a GitHub user.
    User { username: String },
}

impl AuthorQuery {
    /// Prefer an explicit username; otherwise use the commit reference.
    pub fn select(
        owner: &str,
        repo: &str,
        reference: Option<&str>,
        username: Option<&str>,
    ) -> Option<Self> {
        match (username.filter(|u| !u.is_empty()), reference.filter(|r| !r.is_empty())) {
            (Some(username), _) => Some(Self::User {
                username: username.to_string(),
            }),
            (None, Some(reference)) => Some(Self::Commit {
                owner: owner.to_string(),
                repo: repo.to_string(),
                reference: reference.to_string(),
            }),
            (None, None) => None,
        }
    }
}

impl fmt::Display for AuthorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit {
                owner,
                repo,
                reference,
            } => write!(f, "commit {}/{}@{}", owner, repo, reference),
            Self::User { username } => write!(f, "user {}", username),
        }
    }
}
