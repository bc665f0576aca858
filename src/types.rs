use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An open pull request fetched for evaluation, before the staleness
/// decision.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestCandidate {
    /// Opaque node id, used as the subject of mutations.
    pub id: String,
    pub number: u64,
    pub updated_at: DateTime<Utc>,
}

impl PullRequestCandidate {
    /// Looks up a placeholder field by its GraphQL name.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "number" => Some(self.number.to_string()),
            "updatedAt" => Some(self.updated_at.to_rfc3339()),
            _ => None,
        }
    }
}

/// What happened to a single stale candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageOutcome {
    CommentedAndClosed,
    DryRunWouldClose,
    Failed(String),
}

impl TriageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TriageOutcome::Failed(_))
    }
}

impl std::fmt::Display for TriageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriageOutcome::CommentedAndClosed => write!(f, "commented and closed"),
            TriageOutcome::DryRunWouldClose => write!(f, "would close (dry run)"),
            TriageOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageResult {
    pub id: String,
    pub number: u64,
    pub outcome: TriageOutcome,
}

impl TriageResult {
    pub fn new(candidate: &PullRequestCandidate, outcome: TriageOutcome) -> Self {
        Self {
            id: candidate.id.clone(),
            number: candidate.number,
            outcome,
        }
    }
}

// Shapes of the candidate query response. Only `data` is inspected here;
// the top-level `errors` list is handled by the client before decoding.

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse {
    pub data: RepositoryData,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub pull_requests: PullRequestConnection,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestConnection {
    pub nodes: Vec<PullRequestCandidate>,
}

/// One entry of a GraphQL `errors` list.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}
