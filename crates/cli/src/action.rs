//! CI action entry point.
//!
//! The runner passes inputs as `INPUT_<NAME>` environment variables (name
//! upper-cased, hyphens kept) and collects outputs from the file named by
//! `$GITHUB_OUTPUT`. Failures are reported with `::error::` workflow
//! commands.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

use slackauthor_core::config::DirectoryMode;
use slackauthor_core::{AuthorQuery, Outcome, ResolvedMember};

/// Inputs declared by the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInputs {
    pub owner: String,
    pub repo: String,
    pub reference: Option<String>,
    pub username: Option<String>,
    pub github_token: Option<String>,
    pub slack_token: Option<String>,
    pub directory: Option<DirectoryMode>,
}

impl ActionInputs {
    /// Read inputs through `env`, falling back to the runner's
    /// `GITHUB_REPOSITORY` / `GITHUB_SHA` for the repository and ref.
    pub fn from_env<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| {
            env(&format!("INPUT_{}", name.to_uppercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let (default_owner, default_repo) = match env("GITHUB_REPOSITORY") {
            Some(full) => match full.split_once('/') {
                Some((owner, repo)) => (Some(owner.to_string()), Some(repo.to_string())),
                None => (None, None),
            },
            None => (None, None),
        };

        let owner = input("org")
            .or(default_owner)
            .context("input 'org' is required")?;
        let repo = input("repo")
            .or(default_repo)
            .context("input 'repo' is required")?;
        let username = input("username");
        let reference = input("ref").or_else(|| env("GITHUB_SHA").filter(|s| !s.is_empty()));

        if username.is_none() && reference.is_none() {
            bail!("either input 'ref' or input 'username' is required");
        }

        let directory = match input("directory") {
            Some(mode) => Some(mode.parse::<DirectoryMode>()?),
            None => None,
        };

        Ok(Self {
            owner,
            repo,
            reference,
            username,
            github_token: input("github-token"),
            slack_token: input("slack-token"),
            directory,
        })
    }

    pub fn query(&self) -> Option<AuthorQuery> {
        AuthorQuery::select(
            &self.owner,
            &self.repo,
            self.reference.as_deref(),
            self.username.as_deref(),
        )
    }
}

/// What an action step reports for one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Set the step outputs for the resolved member.
    Outputs(ResolvedMember),
    /// A `::notice::` line; the step still succeeds.
    Notice(String),
    /// An `::error::` line; the step fails.
    Error(String),
}

impl Report {
    pub fn for_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Resolved(member) => Self::Outputs(member.clone()),
            Outcome::BotIdentity { .. } | Outcome::PrivateIdentity { .. } => {
                Self::Notice(notice_command(&outcome.to_string()))
            }
            Outcome::NotFound { .. } | Outcome::UpstreamError(_) => {
                Self::Error(error_command(&outcome.to_string()))
            }
        }
    }

    /// Setup failures (bad inputs, missing tokens, client construction)
    /// are reported like a failed resolution.
    pub fn for_error(err: &anyhow::Error) -> Self {
        Self::Error(error_command(&format!("{:#}", err)))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Render the `member-id` / `username` outputs.
pub fn render_outputs(member: &ResolvedMember) -> String {
    format!(
        "member-id={}\nusername={}\n",
        member.member_id, member.username
    )
}

/// Append outputs to the runner's output file.
pub fn write_outputs(path: &Path, member: &ResolvedMember) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open output file {}", path.display()))?;
    file.write_all(render_outputs(member).as_bytes())
        .context("failed to write action outputs")?;
    Ok(())
}

/// Escape a message for use in a `::command::` line.
pub fn escape_data(msg: &str) -> String {
    msg.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn error_command(msg: &str) -> String {
    format!("::error::{}", escape_data(msg))
}

pub fn notice_command(msg: &str) -> String {
    format!("::notice::{}", escape_data(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slackauthor_core::errors::ResolveError;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_inputs_from_action_env() {
        let env = env_from(&[
            ("INPUT_REPO", "web"),
            ("INPUT_ORG", "acme"),
            ("INPUT_REF", "abc123"),
            ("INPUT_GITHUB-TOKEN", "ghp_x"),
            ("INPUT_SLACK-TOKEN", "xoxb-y"),
            ("INPUT_DIRECTORY", "list"),
        ]);
        let inputs = ActionInputs::from_env(env).unwrap();
        assert_eq!(inputs.owner, "acme");
        assert_eq!(inputs.repo, "web");
        assert_eq!(inputs.github_token.as_deref(), Some("ghp_x"));
        assert_eq!(inputs.slack_token.as_deref(), Some("xoxb-y"));
        assert_eq!(inputs.directory, Some(DirectoryMode::List));
        assert_eq!(inputs.query().unwrap().to_string(), "commit acme/web@abc123");
    }

    #[test]
    fn test_inputs_fall_back_to_runner_context() {
        let env = env_from(&[
            ("GITHUB_REPOSITORY", "acme/api"),
            ("GITHUB_SHA", "deadbeef"),
            ("INPUT_REF", ""),
        ]);
        let inputs = ActionInputs::from_env(env).unwrap();
        assert_eq!(inputs.owner, "acme");
        assert_eq!(inputs.repo, "api");
        assert_eq!(inputs.reference.as_deref(), Some("deadbeef"));
        assert!(inputs.github_token.is_none());
    }

    #[test]
    fn test_username_input_selects_user_query() {
        let env = env_from(&[
            ("GITHUB_REPOSITORY", "acme/api"),
            ("INPUT_USERNAME", "octocat"),
        ]);
        let inputs = ActionInputs::from_env(env).unwrap();
        assert_eq!(
            inputs.query(),
            Some(AuthorQuery::User {
                username: "octocat".into()
            })
        );
    }

    #[test]
    fn test_missing_repository_is_rejected() {
        let env = env_from(&[("INPUT_REF", "main")]);
        assert!(ActionInputs::from_env(env).is_err());
    }

    #[test]
    fn test_missing_ref_and_username_is_rejected() {
        let env = env_from(&[("INPUT_ORG", "acme"), ("INPUT_REPO", "web")]);
        let err = ActionInputs::from_env(env).unwrap_err();
        assert!(err.to_string().contains("'ref'"));
    }

    #[test]
    fn test_bad_directory_input_is_rejected() {
        let env = env_from(&[
            ("GITHUB_REPOSITORY", "acme/api"),
            ("GITHUB_SHA", "deadbeef"),
            ("INPUT_DIRECTORY", "bulk"),
        ]);
        assert!(ActionInputs::from_env(env).is_err());
    }

    #[test]
    fn test_outputs_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").unwrap();

        let member = ResolvedMember {
            member_id: "U01".into(),
            username: "jdoe".into(),
            email: "jdoe@acme.com".into(),
        };
        write_outputs(&path, &member).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "previous=1\nmember-id=U01\nusername=jdoe\n");
    }

    #[test]
    fn test_workflow_command_escaping() {
        assert_eq!(
            error_command("50% failed\nsecond line"),
            "::error::50%25 failed%0Asecond line"
        );
        assert_eq!(notice_command("ok"), "::notice::ok");
    }

    fn member() -> ResolvedMember {
        ResolvedMember {
            member_id: "U01".into(),
            username: "jdoe".into(),
            email: "jdoe@acme.com".into(),
        }
    }

    #[test]
    fn test_report_for_each_outcome() {
        let resolved = Report::for_outcome(&Outcome::Resolved(member()));
        assert_eq!(resolved, Report::Outputs(member()));
        assert!(!resolved.is_failure());

        for outcome in [
            Outcome::BotIdentity {
                email: "noreply@github.com".into(),
            },
            Outcome::PrivateIdentity {
                email: "1+octocat@users.noreply.github.com".into(),
            },
        ] {
            let report = Report::for_outcome(&outcome);
            assert!(matches!(report, Report::Notice(ref line) if line.starts_with("::notice::")));
            assert!(!report.is_failure());
        }

        for outcome in [
            Outcome::NotFound {
                candidates: vec!["john.doe@acme.com".into(), "jdoe@acme.com".into()],
            },
            Outcome::UpstreamError(ResolveError::NoAuthorEmail {
                subject: "commit acme/web@abc123".into(),
            }),
        ] {
            let report = Report::for_outcome(&outcome);
            assert!(matches!(report, Report::Error(ref line) if line.starts_with("::error::")));
            assert!(report.is_failure());
        }
    }

    #[test]
    fn test_setup_error_is_reported_as_workflow_error() {
        let env = env_from(&[("INPUT_ORG", "acme"), ("INPUT_REPO", "web")]);
        let err = ActionInputs::from_env(env).unwrap_err();
        let report = Report::for_error(&err.context("invalid action inputs"));
        match report {
            Report::Error(line) => {
                assert!(line.starts_with("::error::invalid action inputs: "));
                assert!(line.contains("either input 'ref' or input 'username' is required"));
            }
            other => panic!("unexpected report {other:?}"),
        }
    }
}
