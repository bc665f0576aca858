use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{config::Secret, types::GraphQLError};

const ACCEPT_HEADER: &str = "application/vnd.github.v4.idl";
const CLIENT_IDENTIFIER: &str = "Github Actions";

/// Why a GraphQL request did not produce usable data.
#[derive(Debug)]
pub enum QueryError {
    /// The request never got a response (connection refused, reset, DNS).
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: StatusCode, body: String },
    /// The response body is not the JSON shape we expected.
    Malformed { reason: String, body: String },
    /// The response carried a non-empty top-level `errors` list.
    Remote { messages: Vec<String> },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Transport(e) => write!(f, "request failed: {e}"),
            QueryError::Status { status, body } => {
                write!(f, "server responded with HTTP {status}: {body}")
            }
            QueryError::Malformed { reason, .. } => write!(f, "malformed response: {reason}"),
            QueryError::Remote { messages } => {
                write!(f, "GraphQL errors: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// A GraphQL endpoint that accepts a document plus variables.
///
/// The production implementation is [`GraphQlClient`]; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, QueryError>;
}

/// Decides whether a response is usable and decodes it.
///
/// Success requires a 2xx status and a JSON body without a non-empty
/// top-level `errors` list. A response that fails either check is rejected
/// even when it also carries `data`.
pub fn classify_response(status: StatusCode, body: &str) -> Result<Value, QueryError> {
    if !status.is_success() {
        return Err(QueryError::Status {
            status,
            body: body.to_string(),
        });
    }

    let json: Value = serde_json::from_str(body).map_err(|e| QueryError::Malformed {
        reason: e.to_string(),
        body: body.to_string(),
    })?;

    match json.get("errors") {
        None | Some(Value::Null) => Ok(json),
        Some(Value::Array(errors)) if errors.is_empty() => Ok(json),
        Some(errors) => {
            let messages = match serde_json::from_value::<Vec<GraphQLError>>(errors.clone()) {
                Ok(errors) => errors.into_iter().map(|e| e.message).collect(),
                Err(_) => vec![errors.to_string()],
            };
            Err(QueryError::Remote { messages })
        }
    }
}

/// HTTP client bound to a single GraphQL endpoint.
///
/// Headers, including the bearer token, are fixed at construction and the
/// client is shared read-only by every concurrent request.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl GraphQlClient {
    pub fn new(endpoint: Url, token: &Secret) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .context("GitHub token contains characters not allowed in an HTTP header")?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_IDENTIFIER));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl Remote for GraphQlClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, QueryError> {
        let payload = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(QueryError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(QueryError::Transport)?;

        debug!(status = status.as_u16(), "Response status");
        debug!(body = %body, "Response body");

        classify_response(status, &body)
    }
}
