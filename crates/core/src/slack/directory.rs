//! [`MemberDirectory`] implementations backed by Slack.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::client::{SlackClient, SlackMember};
use crate::config::DirectoryMode;
use crate::errors::SlackError;
use crate::identity::MemberDirectory;
use crate::models::ResolvedMember;

/// One `users.lookupByEmail` call per candidate.
pub struct DirectDirectory {
    client: SlackClient,
}

impl DirectDirectory {
    pub fn new(client: SlackClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MemberDirectory for DirectDirectory {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<ResolvedMember>, SlackError> {
        let member = self.client.lookup_by_email(email).await?;
        Ok(member.map(|m| m.to_resolved(email)))
    }
}

/// Anything that can produce the full member listing.
#[async_trait]
pub trait MemberListing: Send + Sync {
    async fn list_all_members(&self) -> Result<Vec<SlackMember>, SlackError>;
}

#[async_trait]
impl MemberListing for SlackClient {
    async fn list_all_members(&self) -> Result<Vec<SlackMember>, SlackError> {
        SlackClient::list_all_members(self).await
    }
}

/// Fetches the member listing once and scans it for each candidate.
///
/// The listing is kept only after a successful fetch, so a failed fetch
/// fails just the candidate that triggered it.
pub struct ListingDirectory<L = SlackClient> {
    source: L,
    members: OnceCell<Vec<SlackMember>>,
}

impl<L: MemberListing> ListingDirectory<L> {
    pub fn new(source: L) -> Self {
        Self {
            source,
            members: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &L {
        &self.source
    }

    async fn members(&self) -> Result<&[SlackMember], SlackError> {
        let members = self
            .members
            .get_or_try_init(|| async move {
                let members = self.source.list_all_members().await?;
                info!(count = members.len(), "loaded Slack member listing");
                Ok::<_, SlackError>(members)
            })
            .await?;
        Ok(members.as_slice())
    }
}

#[async_trait]
impl<L: MemberListing> MemberDirectory for ListingDirectory<L> {
    async fn lookup_by_email(&self, email: &str) -> Result<Option<ResolvedMember>, SlackError> {
        let found = self
            .members()
            .await?
            .iter()
            .filter(|m| !m.deleted)
            .find(|m| m.email() == Some(email))
            .map(|m| m.to_resolved(email));
        debug!(email, found = found.is_some(), "scanned member listing");
        Ok(found)
    }
}

/// Build the directory selected by configuration.
pub fn build_directory(mode: DirectoryMode, client: SlackClient) -> Box<dyn MemberDirectory> {
    match mode {
        DirectoryMode::Direct => Box::new(DirectDirectory::new(client)),
        DirectoryMode::List => Box::new(ListingDirectory::new(client)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::client::SlackProfile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn member(id: &str, name: &str, email: Option<&str>, deleted: bool) -> SlackMember {
        SlackMember {
            id: id.into(),
            name: name.into(),
            deleted,
            is_bot: false,
            profile: SlackProfile {
                email: email.map(str::to_string),
                real_name: None,
            },
        }
    }

    struct FakeListing {
        members: Vec<SlackMember>,
        fail_first: bool,
        fetches: AtomicUsize,
    }

    impl FakeListing {
        fn new(members: Vec<SlackMember>) -> Self {
            Self {
                members,
                fail_first: false,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MemberListing for FakeListing {
        async fn list_all_members(&self) -> Result<Vec<SlackMember>, SlackError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(SlackError::RateLimited {
                    retry_after: "1".into(),
                });
            }
            Ok(self.members.clone())
        }
    }

    #[tokio::test]
    async fn test_listing_fetched_once_for_several_candidates() {
        let directory = ListingDirectory::new(FakeListing::new(vec![
            member("U1", "alice", Some("alice@acme.com"), false),
            member("U2", "jdoe", Some("jdoe@acme.com"), false),
        ]));

        assert!(directory
            .lookup_by_email("john.doe@acme.com")
            .await
            .unwrap()
            .is_none());
        let found = directory
            .lookup_by_email("jdoe@acme.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.member_id, "U2");
        assert_eq!(found.username, "jdoe");
        assert_eq!(directory.source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listing_skips_deleted_and_emailless_members() {
        let directory = ListingDirectory::new(FakeListing::new(vec![
            member("U0", "old-alice", Some("alice@acme.com"), true),
            member("B1", "bot", None, false),
        ]));

        assert!(directory
            .lookup_by_email("alice@acme.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_listing_match_is_exact() {
        let directory = ListingDirectory::new(FakeListing::new(vec![member(
            "U1",
            "alice",
            Some("Alice@Acme.com"),
            false,
        )]));

        assert!(directory
            .lookup_by_email("alice@acme.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut listing =
            FakeListing::new(vec![member("U2", "jdoe", Some("jdoe@acme.com"), false)]);
        listing.fail_first = true;
        let directory = ListingDirectory::new(listing);

        assert!(matches!(
            directory.lookup_by_email("john.doe@acme.com").await,
            Err(SlackError::RateLimited { .. })
        ));
        let found = directory.lookup_by_email("jdoe@acme.com").await.unwrap();
        assert_eq!(found.unwrap().member_id, "U2");
        assert_eq!(directory.source.fetches.load(Ordering::SeqCst), 2);
    }
}
