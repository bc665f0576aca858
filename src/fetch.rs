use serde_json::json;
use tracing::debug;

use crate::{
    client::{QueryError, Remote},
    types::{GraphQLResponse, PullRequestCandidate},
};

/// Number of open pull requests considered per run. Pull requests beyond
/// the first page are left for a later run.
pub const PAGE_SIZE: u32 = 10;

const OPEN_PULL_REQUESTS_QUERY: &str = r#"
query repository($name: String!, $owner: String!, $first: Int!) {
  repository(name: $name, owner: $owner) {
    pullRequests(first: $first, states: [OPEN], orderBy: {field: UPDATED_AT, direction: ASC}) {
      nodes {
        id
        number
        updatedAt
      }
    }
  }
}
"#;

/// Fetches the first page of open pull requests, least recently updated
/// first.
///
/// The order of the response is kept as-is. Any client error is returned
/// unchanged and no partial list is produced.
pub async fn fetch_open_pull_requests<R>(
    remote: &R,
    owner: &str,
    repo: &str,
) -> Result<Vec<PullRequestCandidate>, QueryError>
where
    R: Remote + ?Sized,
{
    let variables = json!({
        "owner": owner,
        "name": repo,
        "first": PAGE_SIZE,
    });

    let body = remote.execute(OPEN_PULL_REQUESTS_QUERY, variables).await?;

    let response: GraphQLResponse =
        serde_json::from_value(body.clone()).map_err(|e| QueryError::Malformed {
            reason: e.to_string(),
            body: body.to_string(),
        })?;

    let repository = response.data.repository.ok_or_else(|| QueryError::Malformed {
        reason: format!("repository {owner}/{repo} missing from response"),
        body: body.to_string(),
    })?;

    let candidates = repository.pull_requests.nodes;
    debug!(count = candidates.len(), "Fetched open pull requests");
    Ok(candidates)
}
