//! Candidate email generation.
//!
//! Many organisations provision Slack accounts as `<initial><surname>@domain`
//! while developers commit as `<first>.<last>@domain`. The original address
//! is always tried first.

/// Derive `jdoe@acme.com` from `john.doe@acme.com`.
///
/// Returns `None` unless the local part is exactly two non-empty
/// dot-separated segments. Anything else is ambiguous and not guessed at.
pub fn derive_corporate_alias(email: &str) -> Option<String> {
    let (local, domain) = email.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }

    let mut segments = local.split('.');
    let (first, surname) = match (segments.next(), segments.next(), segments.next()) {
        (Some(first), Some(surname), None) => (first, surname),
        _ => return None,
    };

    let initial = first.chars().next()?;
    if surname.is_empty() {
        return None;
    }

    Some(format!("{}{}@{}", initial, surname, domain))
}

/// Ordered list of addresses to look up: the original, then the alias when
/// one can be derived and differs from the original.
pub fn build_candidates(email: &str) -> Vec<String> {
    let mut candidates = vec![email.to_string()];
    if let Some(alias) = derive_corporate_alias(email) {
        if alias != email {
            candidates.push(alias);
        }
    }
    candidates
}
