use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use autostale::{
    Config, PAGE_SIZE, QueryError, Remote, TriageOutcome, classify_response, parse_args, report,
    run,
};
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Fetch,
    Comment,
    Close,
}

#[derive(Debug, Clone)]
struct Request {
    operation: Operation,
    variables: Value,
}

/// Scripted GraphQL endpoint that records every request it receives.
struct MockRemote {
    fetch_response: Result<Value, (StatusCode, String)>,
    failing_comments: HashSet<String>,
    failing_closes: HashSet<String>,
    requests: Mutex<Vec<Request>>,
}

impl MockRemote {
    fn new(nodes: Value) -> Self {
        Self {
            fetch_response: Ok(json!({
                "data": { "repository": { "pullRequests": { "nodes": nodes } } }
            })),
            failing_comments: HashSet::new(),
            failing_closes: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_fetch(status: StatusCode, body: &str) -> Self {
        let mut remote = Self::new(json!([]));
        remote.fetch_response = Err((status, body.to_string()));
        remote
    }

    fn fail_comment_on(mut self, id: &str) -> Self {
        self.failing_comments.insert(id.to_string());
        self
    }

    fn fail_close_on(mut self, id: &str) -> Self {
        self.failing_closes.insert(id.to_string());
        self
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn ids_for(&self, operation: Operation) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.operation == operation)
            .map(|r| {
                let input = &r.variables["input"];
                input["subjectId"]
                    .as_str()
                    .or_else(|| input["pullRequestId"].as_str())
                    .unwrap()
                    .to_string()
            })
            .collect()
    }

    fn mutation_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.operation != Operation::Fetch)
            .count()
    }
}

fn remote_failure(message: &str) -> QueryError {
    QueryError::Remote {
        messages: vec![message.to_string()],
    }
}

#[async_trait]
impl Remote for MockRemote {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, QueryError> {
        let operation = if query.contains("addComment") {
            Operation::Comment
        } else if query.contains("closePullRequest") {
            Operation::Close
        } else {
            Operation::Fetch
        };

        self.requests.lock().unwrap().push(Request {
            operation: operation.clone(),
            variables: variables.clone(),
        });

        match operation {
            Operation::Fetch => match &self.fetch_response {
                Ok(body) => classify_response(StatusCode::OK, &body.to_string()),
                Err((status, body)) => classify_response(*status, body),
            },
            Operation::Comment => {
                let id = variables["input"]["subjectId"].as_str().unwrap_or_default();
                if self.failing_comments.contains(id) {
                    Err(remote_failure("comment rejected"))
                } else {
                    Ok(json!({"data": {"addComment": {"commentEdge": {"node": {"id": "C"}}}}}))
                }
            }
            Operation::Close => {
                let id = variables["input"]["pullRequestId"]
                    .as_str()
                    .unwrap_or_default();
                if self.failing_closes.contains(id) {
                    Err(remote_failure("close rejected"))
                } else {
                    Ok(json!({"data": {"closePullRequest": {"pullRequest": {"closed": true}}}}))
                }
            }
        }
    }
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T09:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn node(id: &str, number: u64, days_ago: i64) -> Value {
    json!({
        "id": id,
        "number": number,
        "updatedAt": (now() - Duration::days(days_ago)).to_rfc3339(),
    })
}

/// Open PRs updated 1, 6 and 10 days ago.
fn three_prs() -> Value {
    json!([
        node("PR_fresh", 31, 1),
        node("PR_six", 22, 6),
        node("PR_ten", 13, 10),
    ])
}

fn config(extra: &[&str]) -> Config {
    let mut args = vec![
        "autostale",
        "--owner",
        "octo",
        "--repo",
        "widgets",
        "--github-token",
        "ghp_testtoken",
        "--inactive-days",
        "5",
    ];
    args.extend_from_slice(extra);
    parse_args(args).unwrap()
}

#[tokio::test]
async fn test_fetch_sends_repository_variables() {
    let remote = MockRemote::new(json!([]));
    run(&config(&[]), &remote, now()).await.unwrap();

    let requests = remote.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operation, Operation::Fetch);
    assert_eq!(requests[0].variables["owner"], "octo");
    assert_eq!(requests[0].variables["name"], "widgets");
    assert_eq!(requests[0].variables["first"], PAGE_SIZE);
}

#[tokio::test]
async fn test_live_run_comments_then_closes_each_stale_pr() {
    let remote = MockRemote::new(three_prs());
    let summary = run(&config(&[]), &remote, now()).await.unwrap();

    assert_eq!(summary.fetched, 3);
    let stale: Vec<u64> = summary.stale.iter().map(|pr| pr.number).collect();
    assert_eq!(stale, vec![22, 13]);

    assert_eq!(remote.ids_for(Operation::Comment).len(), 2);
    assert_eq!(remote.ids_for(Operation::Close).len(), 2);
    assert!(!remote.ids_for(Operation::Comment).contains(&"PR_fresh".to_string()));

    assert!(summary.is_success());
    assert!(
        summary
            .results
            .iter()
            .all(|r| r.outcome == TriageOutcome::CommentedAndClosed)
    );
    let result_numbers: Vec<u64> = summary.results.iter().map(|r| r.number).collect();
    assert_eq!(result_numbers, vec![22, 13]);
}

#[tokio::test]
async fn test_comment_precedes_close_for_each_pr() {
    let remote = MockRemote::new(three_prs());
    run(&config(&[]), &remote, now()).await.unwrap();

    let requests = remote.requests();
    for id in ["PR_six", "PR_ten"] {
        let position = |op: Operation, key: &str| {
            requests
                .iter()
                .position(|r| r.operation == op && r.variables["input"][key] == id)
                .unwrap()
        };
        assert!(position(Operation::Comment, "subjectId") < position(Operation::Close, "pullRequestId"));
    }
}

#[tokio::test]
async fn test_comment_body_uses_threshold() {
    let remote = MockRemote::new(json!([node("PR_ten", 13, 10)]));
    run(&config(&[]), &remote, now()).await.unwrap();

    let comment = remote
        .requests()
        .into_iter()
        .find(|r| r.operation == Operation::Comment)
        .unwrap();
    assert_eq!(
        comment.variables["input"]["body"],
        "This PR has been open for more than 5 days without any activity. Closing it."
    );
}

#[tokio::test]
async fn test_dry_run_sends_no_mutations() {
    let remote = MockRemote::new(three_prs());
    let summary = run(&config(&["--dry-run"]), &remote, now()).await.unwrap();

    assert_eq!(remote.mutation_count(), 0);
    assert_eq!(summary.stale.len(), 2);
    assert_eq!(
        report::would_close_line(&summary.stale),
        "Would have closed PR(s) #22, #13"
    );
    assert!(
        summary
            .results
            .iter()
            .all(|r| r.outcome == TriageOutcome::DryRunWouldClose)
    );
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_dry_run_with_many_stale_prs_sends_no_mutations() {
    let nodes: Vec<Value> = (0..PAGE_SIZE as u64)
        .map(|n| node(&format!("PR_{n}"), n, 30 + n as i64))
        .collect();
    let remote = MockRemote::new(Value::Array(nodes));
    let summary = run(&config(&["--dry-run=true"]), &remote, now()).await.unwrap();

    assert_eq!(summary.stale.len(), PAGE_SIZE as usize);
    assert_eq!(remote.mutation_count(), 0);
}

#[tokio::test]
async fn test_failed_comment_skips_close_and_spares_siblings() {
    let remote = MockRemote::new(three_prs()).fail_comment_on("PR_six");
    let summary = run(&config(&[]), &remote, now()).await.unwrap();

    assert!(!remote.ids_for(Operation::Close).contains(&"PR_six".to_string()));
    assert_eq!(remote.ids_for(Operation::Close), vec!["PR_ten".to_string()]);

    assert_eq!(summary.failed_count(), 1);
    assert!(!summary.is_success());
    let six = summary.results.iter().find(|r| r.id == "PR_six").unwrap();
    assert!(matches!(&six.outcome, TriageOutcome::Failed(reason) if reason.contains("comment")));
    let ten = summary.results.iter().find(|r| r.id == "PR_ten").unwrap();
    assert_eq!(ten.outcome, TriageOutcome::CommentedAndClosed);
}

#[tokio::test]
async fn test_failed_close_leaves_comment_in_place() {
    let remote = MockRemote::new(three_prs()).fail_close_on("PR_ten");
    let summary = run(&config(&[]), &remote, now()).await.unwrap();

    assert!(remote.ids_for(Operation::Comment).contains(&"PR_ten".to_string()));
    let ten = summary.results.iter().find(|r| r.id == "PR_ten").unwrap();
    assert!(matches!(&ten.outcome, TriageOutcome::Failed(reason) if reason.contains("close")));
    assert_eq!(summary.failed_count(), 1);
}

#[tokio::test]
async fn test_server_error_aborts_before_triage() {
    let remote = MockRemote::failing_fetch(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let err = run(&config(&[]), &remote, now()).await.unwrap_err();

    assert_eq!(remote.requests().len(), 1);
    assert_eq!(remote.mutation_count(), 0);

    let message = format!("{err:#}");
    assert!(message.contains("octo/widgets"));
    assert!(message.contains("500"));
    assert!(!message.contains("ghp_testtoken"));
    assert!(matches!(
        err.downcast_ref::<QueryError>(),
        Some(QueryError::Status { .. })
    ));
}

#[tokio::test]
async fn test_error_list_with_ok_status_aborts() {
    let body = json!({
        "data": { "repository": { "pullRequests": { "nodes": [node("PR_ten", 13, 10)] } } },
        "errors": [{ "message": "Something went wrong" }]
    });
    let remote = MockRemote::failing_fetch(StatusCode::OK, &body.to_string());
    let err = run(&config(&[]), &remote, now()).await.unwrap_err();

    assert_eq!(remote.mutation_count(), 0);
    assert!(format!("{err:#}").contains("Something went wrong"));
    assert!(matches!(
        err.downcast_ref::<QueryError>(),
        Some(QueryError::Remote { .. })
    ));
}

#[tokio::test]
async fn test_missing_repository_is_an_error() {
    let remote = MockRemote::failing_fetch(StatusCode::OK, r#"{"data":{"repository":null}}"#);
    let err = run(&config(&[]), &remote, now()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QueryError>(),
        Some(QueryError::Malformed { .. })
    ));
}

#[tokio::test]
async fn test_app_names_rendered_in_live_and_dry_run() {
    let template = ["--app-name-template", "pr-${number}-${id}"];

    let live = run(&config(&template), &MockRemote::new(three_prs()), now())
        .await
        .unwrap();
    assert_eq!(live.app_names.as_deref(), Some("pr-22-PR_six pr-13-PR_ten"));

    let mut dry_args = template.to_vec();
    dry_args.push("--dry-run");
    let dry = run(&config(&dry_args), &MockRemote::new(three_prs()), now())
        .await
        .unwrap();
    assert_eq!(dry.app_names, live.app_names);
}

#[tokio::test]
async fn test_no_app_names_without_template() {
    let summary = run(&config(&[]), &MockRemote::new(three_prs()), now())
        .await
        .unwrap();
    assert_eq!(summary.app_names, None);
}

#[tokio::test]
async fn test_nothing_stale_sends_no_mutations() {
    let remote = MockRemote::new(json!([node("PR_fresh", 31, 1)]));
    let summary = run(&config(&["--app-name-template", "${number}"]), &remote, now())
        .await
        .unwrap();

    assert!(summary.stale.is_empty());
    assert_eq!(remote.mutation_count(), 0);
    assert_eq!(summary.app_names.as_deref(), Some(""));
    assert!(summary.is_success());
}
