//! slackauthor core library.
//!
//! Resolves the author of a GitHub commit to the Slack member who should be
//! notified: configuration, the GitHub and Slack API clients, email
//! classification, candidate generation, and the resolver that ties them
//! together.

pub mod config;
pub mod errors;
pub mod github;
pub mod identity;
pub mod models;
pub mod slack;

// Re-exports for convenience.
pub use config::AppConfig;
pub use github::GitHubClient;
pub use identity::{IdentityResolver, Outcome};
pub use models::{AuthorQuery, ResolvedMember};
pub use slack::SlackClient;
