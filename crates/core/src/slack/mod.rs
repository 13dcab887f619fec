//! Slack member directory.
//!
//! [`SlackClient`] speaks the Web API; [`DirectDirectory`] and
//! [`ListingDirectory`] adapt it to the resolver's
//! [`MemberDirectory`](crate::identity::MemberDirectory) seam.

pub mod client;
pub mod directory;

pub use client::{SlackClient, SlackMember};
pub use directory::{build_directory, DirectDirectory, ListingDirectory};
