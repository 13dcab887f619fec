//! slackauthor command-line tool.
//!
//! Resolves the author of a GitHub commit (or a GitHub user) to the Slack
//! member who should be notified. Runs either interactively (`resolve`) or
//! as a CI action step (`action`), and can generate / validate the
//! configuration file.

mod action;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use slackauthor_core::config::{AppConfig, DirectoryMode};
use slackauthor_core::slack::build_directory;
use slackauthor_core::{AuthorQuery, GitHubClient, IdentityResolver, Outcome, SlackClient};

use crate::action::{ActionInputs, Report};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Find the Slack member behind a GitHub commit.
#[derive(Parser, Debug)]
#[command(
    name = "slackauthor",
    version,
    about = "Resolve a GitHub commit author to a Slack member"
)]
struct Cli {
    /// Path to the TOML configuration file
    /// (default: <config dir>/slackauthor/config.toml, optional).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve one commit author or GitHub user.
    Resolve {
        /// Repository owner (user or organization).
        #[arg(long, required_unless_present = "username")]
        owner: Option<String>,

        /// Repository name.
        #[arg(long, required_unless_present = "username")]
        repo: Option<String>,

        /// Commit SHA, branch, or tag whose author to resolve.
        #[arg(long = "ref", required_unless_present = "username")]
        reference: Option<String>,

        /// Resolve this GitHub user instead of a commit author.
        #[arg(long)]
        username: Option<String>,

        /// Override the configured directory mode: direct or list.
        #[arg(long)]
        directory: Option<DirectoryMode>,

        /// Print the resolved member as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run as a CI action step (inputs from INPUT_* variables).
    Action,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./slackauthor.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { output } => {
            init_logging("warn", true);
            cmd_init(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            init_logging("warn", true);
            cmd_validate(cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve {
            owner,
            repo,
            reference,
            username,
            directory,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            init_logging(&config.log_level, true);
            if let Some(mode) = directory {
                config.slack.directory = mode;
            }
            let query = AuthorQuery::select(
                owner.as_deref().unwrap_or_default(),
                repo.as_deref().unwrap_or_default(),
                reference.as_deref(),
                username.as_deref(),
            )
            .context("either --ref or --username is required")?;
            cmd_resolve(config, &query, json).await
        }
        Commands::Action => {
            let mut report = match cmd_action(cli.config.as_deref()).await {
                Ok(report) => report,
                Err(e) => Report::for_error(&e),
            };
            if let Err(e) = emit_report(&report) {
                report = Report::for_error(&e);
                emit_report(&report)?;
            }
            Ok(if report.is_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

/// Log to stderr so stdout carries only results. Action logs go to the
/// runner's log viewer, which gets plain text.
fn init_logging(default_level: &str, ansi: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("slackauthor").join("config.toml"))
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            AppConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None => match default_config_path() {
            Some(path) => AppConfig::load_or_default(&path)
                .context("failed to load configuration file")?,
            None => AppConfig::default(),
        },
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

async fn resolve_author(mut config: AppConfig, query: &AuthorQuery) -> Result<Outcome> {
    config.resolve_env_vars();
    config.require_tokens().context("missing API token")?;

    let github_token = config.github.token.as_deref().unwrap_or_default();
    let slack_token = config.slack.token.as_deref().unwrap_or_default();

    let github = GitHubClient::new(&config.github.api_url, github_token)
        .context("failed to create GitHub client")?;
    let slack = SlackClient::new(&config.slack.api_url, slack_token)
        .context("failed to create Slack client")?;
    let directory = build_directory(config.slack.directory, slack);
    debug!(mode = ?config.slack.directory, "using Slack directory");

    let resolver =
        IdentityResolver::new(&github, directory.as_ref()).with_config(&config.identity);
    let outcome = resolver.resolve(query).await;
    info!(failure = outcome.is_failure(), "resolution finished");
    Ok(outcome)
}

async fn cmd_resolve(config: AppConfig, query: &AuthorQuery, json: bool) -> Result<ExitCode> {
    let outcome = resolve_author(config, query).await?;

    match &outcome {
        Outcome::Resolved(member) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(member).context("failed to encode member")?
                );
            } else {
                eprintln!("{}", style::success(&outcome.to_string()));
                print!("{}", action::render_outputs(member));
            }
        }
        Outcome::BotIdentity { .. } | Outcome::PrivateIdentity { .. } => {
            eprintln!("{}", style::notice(&outcome.to_string()));
        }
        Outcome::NotFound { .. } | Outcome::UpstreamError(_) => {
            eprintln!("{}", style::error(&outcome.to_string()));
        }
    }

    Ok(exit_code(&outcome))
}

async fn cmd_action(config_path: Option<&Path>) -> Result<Report> {
    let mut config = load_config(config_path)?;
    init_logging(&config.log_level, false);

    let inputs = ActionInputs::from_env(|name| std::env::var(name).ok())
        .context("invalid action inputs")?;
    config.github.token = inputs.github_token.clone();
    config.slack.token = inputs.slack_token.clone();
    if let Some(mode) = inputs.directory {
        config.slack.directory = mode;
    }

    let query = inputs
        .query()
        .context("either input 'ref' or input 'username' is required")?;
    let outcome = resolve_author(config, &query).await?;
    Ok(Report::for_outcome(&outcome))
}

fn emit_report(report: &Report) -> Result<()> {
    match report {
        Report::Outputs(member) => match std::env::var_os("GITHUB_OUTPUT") {
            Some(path) => action::write_outputs(Path::new(&path), member)?,
            None => print!("{}", action::render_outputs(member)),
        },
        Report::Notice(line) | Report::Error(line) => println!("{}", line),
    }
    Ok(())
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ---------------------------------------------------------------------------
// Config subcommands
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"# slackauthor configuration
# Every setting is optional; the values below are the defaults.

log_level = "info"

[github]
api_url = "https://api.github.com"
token_env = "GITHUB_TOKEN"

[slack]
api_url = "https://slack.com/api"
token_env = "SLACK_TOKEN"
# "direct": users.lookupByEmail per candidate (needs users:read.email)
# "list":   one users.list fetch scanned locally
directory = "direct"

[identity]
# Also try first-initial + surname (john.doe@acme.com -> jdoe@acme.com)
corporate_alias = true
noreply_domain = "users.noreply.github.com"
bot_emails = [
    "noreply@github.com",
    "41898282+github-actions[bot]@users.noreply.github.com",
    "49699333+dependabot[bot]@users.noreply.github.com",
]
"#;

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, DEFAULT_CONFIG).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Export the token variables (GITHUB_TOKEN, SLACK_TOKEN)");
    println!(
        "  2. Validate with: slackauthor validate --config {}",
        output.display()
    );
    println!(
        "  3. Resolve: slackauthor --config {} resolve --owner <org> --repo <repo> --ref <sha>",
        output.display()
    );

    Ok(())
}

fn cmd_validate(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("no --config given and no config directory")?,
    };
    println!(
        "{}",
        style::header(&format!("Validating configuration: {}", path.display()))
    );
    println!();

    let mut config =
        AppConfig::load_from_file(&path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    config.resolve_env_vars();
    println!("  {}", style::success("Environment variable references processed"));

    if let Err(e) = config.validate() {
        println!("  {}", style::error(&format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::success("All fields are valid"));

    let set = |token: &Option<String>| if token.is_some() { "set" } else { "NOT SET" };

    println!();
    println!("{}", style::header("Configuration summary:"));
    println!("  GitHub API    : {}", config.github.api_url);
    println!(
        "  GitHub token  : {} {}",
        set(&config.github.token),
        style::dim(&format!("(${})", config.github.token_env))
    );
    println!("  Slack API     : {}", config.slack.api_url);
    println!(
        "  Slack token   : {} {}",
        set(&config.slack.token),
        style::dim(&format!("(${})", config.slack.token_env))
    );
    println!("  Directory     : {:?}", config.slack.directory);
    println!("  Alias fallback: {}", config.identity.corporate_alias);
    println!("  Noreply domain: {}", config.identity.noreply_domain);
    println!("  Bot addresses : {}", config.identity.bot_emails.len());
    println!();
    println!("Configuration is valid.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slackauthor.toml");
        cmd_init(&path).unwrap();

        let parsed = AppConfig::load_from_file(&path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(parsed.github.api_url, defaults.github.api_url);
        assert_eq!(parsed.slack.directory, defaults.slack.directory);
        assert_eq!(parsed.identity.bot_emails, defaults.identity.bot_emails);
        assert_eq!(parsed.identity.noreply_domain, defaults.identity.noreply_domain);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slackauthor.toml");
        cmd_init(&path).unwrap();
        assert!(cmd_init(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/slackauthor.toml"))).is_err());
    }

    #[test]
    fn test_cli_requires_ref_or_username() {
        let parsed = Cli::try_parse_from([
            "slackauthor",
            "resolve",
            "--owner",
            "acme",
            "--repo",
            "web",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "slackauthor",
            "resolve",
            "--owner",
            "acme",
            "--repo",
            "web",
            "--username",
            "octocat",
            "--directory",
            "list",
        ])
        .unwrap();
        match parsed.command {
            Commands::Resolve { directory, .. } => {
                assert_eq!(directory, Some(DirectoryMode::List))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_username_resolve_needs_no_repository() {
        let parsed =
            Cli::try_parse_from(["slackauthor", "resolve", "--username", "octocat"]).unwrap();
        match parsed.command {
            Commands::Resolve {
                owner, username, ..
            } => {
                assert!(owner.is_none());
                assert_eq!(username.as_deref(), Some("octocat"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let parsed = Cli::try_parse_from(["slackauthor", "resolve", "--ref", "abc123"]);
        assert!(parsed.is_err());
    }
}
