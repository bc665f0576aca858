use futures::future::join_all;
use serde_json::json;
use tracing::{debug, error, info};

use crate::{
    client::Remote,
    config::Config,
    report, template,
    types::{PullRequestCandidate, TriageOutcome, TriageResult},
};

const ADD_COMMENT_MUTATION: &str = r#"
mutation addComment($input: AddCommentInput!) {
  addComment(input: $input) {
    commentEdge {
      node {
        id
      }
    }
  }
}
"#;

const CLOSE_PULL_REQUEST_MUTATION: &str = r#"
mutation closePr($input: ClosePullRequestInput!) {
  closePullRequest(input: $input) {
    pullRequest {
      closed
    }
  }
}
"#;

/// Renders the closing comment for `candidate`.
///
/// `${days}` expands to the configured threshold; candidate fields are
/// available under their GraphQL names.
pub fn comment_body(config: &Config, candidate: &PullRequestCandidate) -> String {
    template::render(&config.comment_template, |field| match field {
        "days" => Some(config.inactive_days.to_string()),
        other => candidate.field(other),
    })
}

/// Comments on and then closes a single stale pull request.
///
/// The close mutation is only sent once the comment has been accepted. A
/// failed close leaves the comment in place. Dry runs never reach this:
/// the pipeline records them without calling into the remote.
pub async fn triage<R>(remote: &R, candidate: &PullRequestCandidate, config: &Config) -> TriageResult
where
    R: Remote + ?Sized,
{
    let comment = json!({
        "input": {
            "subjectId": candidate.id,
            "body": comment_body(config, candidate),
        }
    });

    match remote.execute(ADD_COMMENT_MUTATION, comment).await {
        Ok(response) => {
            debug!(pr = candidate.number, response = %response, "Add comment response");
            info!("{}", report::comment_added_line(candidate.number));
        }
        Err(e) => {
            error!(pr = candidate.number, error = %e, "Failed to add comment");
            return TriageResult::new(
                candidate,
                TriageOutcome::Failed(format!("comment failed: {e}")),
            );
        }
    }

    let close = json!({
        "input": {
            "pullRequestId": candidate.id,
        }
    });

    match remote.execute(CLOSE_PULL_REQUEST_MUTATION, close).await {
        Ok(response) => {
            debug!(pr = candidate.number, response = %response, "Close PR response");
            info!("{}", report::closed_line(candidate.number));
            TriageResult::new(candidate, TriageOutcome::CommentedAndClosed)
        }
        Err(e) => {
            error!(
                pr = candidate.number,
                error = %e,
                "Failed to close PR after commenting; it remains open"
            );
            TriageResult::new(
                candidate,
                TriageOutcome::Failed(format!("close failed after commenting: {e}")),
            )
        }
    }
}

/// Triages every stale candidate concurrently and waits for all of them.
///
/// A failure on one candidate never cancels the others. Results are
/// returned in the same order as `stale`.
pub async fn triage_all<R>(
    remote: &R,
    stale: &[PullRequestCandidate],
    config: &Config,
) -> Vec<TriageResult>
where
    R: Remote + ?Sized,
{
    join_all(stale.iter().map(|candidate| triage(remote, candidate, config))).await
}
