//! Commit author identity resolution.
//!
//! The resolution order is:
//! 1. Bot and privacy-protected addresses short-circuit (no Slack calls)
//! 2. The author's own address
//! 3. Fallback: the corporate alias (`john.doe@` -> `jdoe@`)

pub mod candidates;
pub mod classify;
pub mod resolver;
pub mod source;

pub use candidates::{build_candidates, derive_corporate_alias};
pub use classify::EmailClassifier;
pub use resolver::{IdentityResolver, Outcome};
pub use source::{AuthorSource, MemberDirectory};
