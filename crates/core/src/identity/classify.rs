//! Special-case address detection.
//!
//! Both checks are total: malformed input is simply "not special".

use crate::config::IdentityConfig;

/// Domain GitHub uses for addresses hidden by the author's privacy settings.
pub const DEFAULT_NOREPLY_DOMAIN: &str = "users.noreply.github.com";

/// Committer addresses used by GitHub automation.
pub const DEFAULT_BOT_EMAILS: &[&str] = &[
    "noreply@github.com",
    "41898282+github-actions[bot]@users.noreply.github.com",
    "49699333+dependabot[bot]@users.noreply.github.com",
];

/// Classifies author emails as privacy-protected or bot-generated.
#[derive(Debug, Clone)]
pub struct EmailClassifier {
    noreply_domain: String,
    bot_emails: Vec<String>,
}

impl Default for EmailClassifier {
    fn default() -> Self {
        Self {
            noreply_domain: DEFAULT_NOREPLY_DOMAIN.to_string(),
            bot_emails: DEFAULT_BOT_EMAILS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EmailClassifier {
    pub fn new(noreply_domain: impl Into<String>, bot_emails: Vec<String>) -> Self {
        Self {
            noreply_domain: noreply_domain.into(),
            bot_emails,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.noreply_domain.clone(), config.bot_emails.clone())
    }

    /// True iff the part after the last `@` is exactly the noreply domain.
    pub fn is_privacy_protected(&self, email: &str) -> bool {
        match email.rsplit_once('@') {
            Some((_, domain)) => domain == self.noreply_domain,
            None => false,
        }
    }

    /// True iff `email` is one of the known bot sentinel addresses.
    pub fn is_bot_identity(&self, email: &str) -> bool {
        self.bot_emails.iter().any(|bot| bot == email)
    }
}
