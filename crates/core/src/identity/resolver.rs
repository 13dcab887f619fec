//! Commit author → Slack member resolution.
//!
//! [`IdentityResolver::resolve`] runs one sequential flow:
//!
//! 1. Fetch the author email from GitHub (by username or commit reference).
//! 2. Short-circuit bot and privacy-protected addresses without touching
//!    the directory.
//! 3. Build the candidate list (original address first).
//! 4. Look candidates up in order; the first match wins. A failed lookup is
//!    logged and the next candidate is tried.
//!
//! The resolver never returns an error; every path ends in an [`Outcome`].

use std::fmt;

use tracing::{debug, info, instrument, warn};

use super::candidates::build_candidates;
use super::classify::EmailClassifier;
use super::source::{AuthorSource, MemberDirectory};
use crate::config::IdentityConfig;
use crate::errors::{CandidateFailure, ResolveError};
use crate::models::{AuthorQuery, ResolvedMember};

/// Terminal result of one resolution.
#[derive(Debug)]
pub enum Outcome {
    /// A directory member matched one of the candidates.
    Resolved(ResolvedMember),
    /// The author is automation; nobody to notify.
    BotIdentity { email: String },
    /// The author hid their address on GitHub.
    PrivateIdentity { email: String },
    /// Every candidate was checked and none has a member.
    NotFound { candidates: Vec<String> },
    /// The answer could not be determined.
    UpstreamError(ResolveError),
}

impl Outcome {
    /// `NotFound` and `UpstreamError` are failures; bot and private authors
    /// are deliberate non-matches and are not.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UpstreamError(_))
    }

    pub fn member(&self) -> Option<&ResolvedMember> {
        match self {
            Self::Resolved(member) => Some(member),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(m) => write!(
                f,
                "resolved {} to Slack member {} ({})",
                m.email, m.member_id, m.username
            ),
            Self::BotIdentity { email } => write!(f, "author {} is a bot; skipping Slack lookup", email),
            Self::PrivateIdentity { email } => {
                write!(f, "author email {} is private; skipping Slack lookup", email)
            }
            Self::NotFound { candidates } => write!(
                f,
                "could not find an associated Slack user for {}",
                candidates.join(", ")
            ),
            Self::UpstreamError(e) => write!(f, "{}", e),
        }
    }
}

/// Orchestrates author lookup, classification, and directory fallback.
pub struct IdentityResolver<'a> {
    authors: &'a dyn AuthorSource,
    directory: &'a dyn MemberDirectory,
    classifier: EmailClassifier,
    corporate_alias: bool,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(authors: &'a dyn AuthorSource, directory: &'a dyn MemberDirectory) -> Self {
        Self {
            authors,
            directory,
            classifier: EmailClassifier::default(),
            corporate_alias: true,
        }
    }

    /// Apply classification and alias settings from configuration.
    pub fn with_config(mut self, config: &IdentityConfig) -> Self {
        self.classifier = EmailClassifier::from_config(config);
        self.corporate_alias = config.corporate_alias;
        self
    }

    #[instrument(skip_all, fields(query = %query))]
    pub async fn resolve(&self, query: &AuthorQuery) -> Outcome {
        let email = match self.fetch_email(query).await {
            Ok(email) => email,
            Err(e) => {
                warn!(error = %e, "could not obtain author email");
                return Outcome::UpstreamError(e);
            }
        };
        info!(email = %email, "fetched author email");

        if self.classifier.is_bot_identity(&email) {
            info!(email = %email, "author is a bot identity");
            return Outcome::BotIdentity { email };
        }
        if self.classifier.is_privacy_protected(&email) {
            info!(email = %email, "author email is privacy-protected");
            return Outcome::PrivateIdentity { email };
        }

        let candidates = self.candidates(&email);
        debug!(?candidates, "generated candidates");
        self.lookup(candidates).await
    }

    async fn fetch_email(&self, query: &AuthorQuery) -> Result<String, ResolveError> {
        let fetched = match query {
            AuthorQuery::Commit {
                owner,
                repo,
                reference,
            } => self.authors.commit_author_email(owner, repo, reference).await,
            AuthorQuery::User { username } => self.authors.user_email(username).await,
        };

        match fetched {
            Ok(Some(email)) if !email.trim().is_empty() => Ok(email),
            Ok(_) => Err(ResolveError::NoAuthorEmail {
                subject: query.to_string(),
            }),
            Err(source) => Err(ResolveError::AuthorFetch {
                subject: query.to_string(),
                source,
            }),
        }
    }

    fn candidates(&self, email: &str) -> Vec<String> {
        if self.corporate_alias {
            build_candidates(email)
        } else {
            vec![email.to_string()]
        }
    }

    async fn lookup(&self, candidates: Vec<String>) -> Outcome {
        let mut failures = Vec::new();
        let mut saw_negative = false;

        for candidate in &candidates {
            match self.directory.lookup_by_email(candidate).await {
                Ok(Some(member)) => {
                    info!(
                        candidate = %candidate,
                        member_id = %member.member_id,
                        "matched Slack member"
                    );
                    return Outcome::Resolved(member);
                }
                Ok(None) => {
                    debug!(candidate = %candidate, "no Slack member for candidate");
                    saw_negative = true;
                }
                Err(error) => {
                    warn!(
                        candidate = %candidate,
                        error = %error,
                        "Slack lookup failed, trying next candidate"
                    );
                    failures.push(CandidateFailure {
                        candidate: candidate.clone(),
                        error,
                    });
                }
            }
        }

        if saw_negative {
            if !failures.is_empty() {
                warn!(
                    failed = failures.len(),
                    "some candidates could not be checked; reporting not found"
                );
            }
            Outcome::NotFound { candidates }
        } else {
            Outcome::UpstreamError(ResolveError::DirectoryUnavailable { attempts: failures })
        }
    }
}
