use chrono::{DateTime, Utc};

use crate::types::PullRequestCandidate;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fractional days elapsed between `updated_at` and `now`.
pub fn age_in_days(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - updated_at).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Selects candidates inactive for strictly more than `threshold_days`.
///
/// Every candidate is measured against the same `now`. A candidate whose
/// age equals the threshold exactly is kept open. Input order is preserved.
pub fn select_stale(
    candidates: &[PullRequestCandidate],
    threshold_days: u32,
    now: DateTime<Utc>,
) -> Vec<PullRequestCandidate> {
    candidates
        .iter()
        .filter(|pr| age_in_days(pr.updated_at, now) > f64::from(threshold_days))
        .cloned()
        .collect()
}
