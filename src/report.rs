use tracing::{info, warn};

use crate::{
    template,
    types::{PullRequestCandidate, TriageResult},
};

/// Renders `template` once per candidate and joins the results with a
/// single space, in candidate order.
pub fn build_summary(candidates: &[PullRequestCandidate], template: &str) -> String {
    candidates
        .iter()
        .map(|pr| template::render(template, |field| pr.field(field)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `#1, #2` style list of pull request numbers.
pub fn format_numbers(candidates: &[PullRequestCandidate]) -> String {
    candidates
        .iter()
        .map(|pr| format!("#{}", pr.number))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn stale_count_line(count: usize, inactive_days: u32) -> String {
    format!("Found {count} PRs inactive for more than {inactive_days} days")
}

/// The dry-run line naming every PR a live run would close.
pub fn would_close_line(stale: &[PullRequestCandidate]) -> String {
    if stale.is_empty() {
        "Would not close any PRs".to_string()
    } else {
        format!("Would have closed PR(s) {}", format_numbers(stale))
    }
}

pub fn comment_added_line(number: u64) -> String {
    format!("Added comment to PR #{number}")
}

pub fn closed_line(number: u64) -> String {
    format!("Closed PR #{number}")
}

pub fn log_stale_count(count: usize, inactive_days: u32) {
    info!("{}", stale_count_line(count, inactive_days));
}

pub fn log_dry_run(stale: &[PullRequestCandidate], summary: Option<&str>) {
    info!("{}", would_close_line(stale));
    if let Some(summary) = summary {
        info!("App Names {summary}");
    }
}

/// Logs one line per failed candidate and returns how many failed.
pub fn log_failures(results: &[TriageResult]) -> usize {
    let failed: Vec<&TriageResult> = results.iter().filter(|r| r.outcome.is_failed()).collect();
    for result in &failed {
        warn!(pr = result.number, id = %result.id, "PR #{} {}", result.number, result.outcome);
    }
    failed.len()
}
