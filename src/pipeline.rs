use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::{
    client::Remote,
    config::Config,
    fetch::fetch_open_pull_requests,
    report,
    stale::select_stale,
    triage::triage_all,
    types::{PullRequestCandidate, TriageOutcome, TriageResult},
};

/// Everything a run decided and did.
#[derive(Debug)]
pub struct RunSummary {
    /// Number of open pull requests fetched.
    pub fetched: usize,
    pub stale: Vec<PullRequestCandidate>,
    pub results: Vec<TriageResult>,
    /// Rendered app-name report, present when a template is configured.
    pub app_names: Option<String>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Fetches, filters and triages stale pull requests for one repository.
///
/// `now` is the single reference instant for every staleness decision in
/// the run. A fetch failure aborts before any mutation is sent; triage
/// failures are recorded per candidate and never stop sibling candidates.
pub async fn run<R>(config: &Config, remote: &R, now: DateTime<Utc>) -> Result<RunSummary>
where
    R: Remote + ?Sized,
{
    let candidates = fetch_open_pull_requests(remote, &config.owner, &config.repo)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch open pull requests for {}/{}",
                config.owner, config.repo
            )
        })?;

    let stale = select_stale(&candidates, config.inactive_days, now);
    report::log_stale_count(stale.len(), config.inactive_days);

    let app_names = config
        .app_name_template
        .as_deref()
        .map(|template| report::build_summary(&stale, template));

    let results = if config.dry_run {
        report::log_dry_run(&stale, app_names.as_deref());
        stale
            .iter()
            .map(|pr| TriageResult::new(pr, TriageOutcome::DryRunWouldClose))
            .collect()
    } else {
        let results = triage_all(remote, &stale, config).await;
        report::log_failures(&results);
        results
    };

    Ok(RunSummary {
        fetched: candidates.len(),
        stale,
        results,
        app_names,
    })
}
