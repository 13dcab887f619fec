//! Collaborator interfaces consumed by the resolver.
//!
//! [`GitHubClient`](crate::github::GitHubClient) and the Slack directories in
//! [`crate::slack`] implement these; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::errors::{GitHubError, SlackError};
use crate::models::ResolvedMember;

/// Source of commit author emails.
///
/// `Ok(None)` means the service answered but has no email to give
/// (unset or private). Transport and auth failures are `Err`.
#[async_trait]
pub trait AuthorSource: Send + Sync {
    async fn commit_author_email(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<Option<String>, GitHubError>;

    async fn user_email(&self, username: &str) -> Result<Option<String>, GitHubError>;
}

/// Member directory keyed by email.
///
/// `Ok(None)` is the normal "no member has this email" answer and must never
/// be reported as an error.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<ResolvedMember>, SlackError>;
}
