use anyhow::{Context, Result};
use clap::{ArgAction, Parser, builder::BoolishValueParser};
use url::Url;

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

pub const DEFAULT_COMMENT_TEMPLATE: &str =
    "This PR has been open for more than ${days} days without any activity. Closing it.";

/// A credential that must never be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Settings for one run, fixed once parsed.
#[derive(Debug, Clone)]
pub struct Config {
    pub owner: String,
    pub repo: String,
    pub token: Secret,
    pub inactive_days: u32,
    pub dry_run: bool,
    pub comment_template: String,
    pub app_name_template: Option<String>,
    pub api_url: Url,
}

#[derive(Parser, Debug)]
#[command(
    name = "autostale",
    about = "Comment on and close pull requests that have seen no activity for a number of days"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Repository owner (user or organisation)
    #[arg(long, env = "INPUT_OWNER", value_name = "OWNER")]
    owner: String,

    /// Repository name
    #[arg(long, env = "INPUT_REPO", value_name = "REPO")]
    repo: String,

    /// Token used as bearer authentication (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true, value_name = "TOKEN")]
    github_token: Option<String>,

    /// Close PRs inactive for strictly more than this many days
    #[arg(long, env = "INPUT_INACTIVE-DAYS", value_name = "DAYS")]
    inactive_days: u32,

    /// Report what would be closed without commenting or closing
    #[arg(
        long,
        env = "INPUT_DRY-RUN",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    dry_run: bool,

    /// Comment posted before closing; ${days} expands to the threshold
    #[arg(
        long,
        env = "INPUT_COMMENT-TEMPLATE",
        default_value = DEFAULT_COMMENT_TEMPLATE,
        value_name = "TEMPLATE"
    )]
    comment_template: String,

    /// Rendered per stale PR (${id}, ${number}) and exported as APP_NAME
    #[arg(long, env = "INPUT_APP-NAME-TEMPLATE", value_name = "TEMPLATE")]
    app_name_template: Option<String>,

    /// GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL", default_value = DEFAULT_API_URL, value_name = "URL")]
    api_url: String,
}

impl CliArgs {
    fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            anyhow::bail!("Repository owner must not be empty");
        }
        if self.repo.trim().is_empty() {
            anyhow::bail!("Repository name must not be empty");
        }
        if self.comment_template.trim().is_empty() {
            anyhow::bail!("Comment template must not be empty");
        }
        Ok(())
    }
}

fn resolve_token(explicit: Option<String>) -> Result<Secret> {
    let token = explicit
        .filter(|t| !t.trim().is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .context("A GitHub token is required: pass --github-token or set GITHUB_TOKEN")?;
    Ok(Secret::new(token))
}

fn build_config(cli: CliArgs) -> Result<Config> {
    cli.validate()?;

    let api_url = Url::parse(&cli.api_url)
        .with_context(|| format!("Invalid GraphQL endpoint URL: '{}'", cli.api_url))?;

    Ok(Config {
        owner: cli.owner.trim().to_string(),
        repo: cli.repo.trim().to_string(),
        token: resolve_token(cli.github_token)?,
        inactive_days: cli.inactive_days,
        dry_run: cli.dry_run,
        comment_template: cli.comment_template,
        app_name_template: cli.app_name_template.filter(|t| !t.is_empty()),
        api_url,
    })
}

/// Parses command-line arguments, with environment fallbacks for every
/// input, into the run configuration.
pub fn parse_args<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_config(cli)
}
