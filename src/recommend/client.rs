//! `RecommendationClient` trait and its HTTP implementation.
//!
//! [`HttpRecommendationClient`] sends one `POST { "query": … }` per call to
//! the endpoint configured in [`ServiceConfig`].  There is no timeout and no
//! retry: a call ends only when the server answers or the transport fails.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::query::Query;

/// Success text used when the server answers without a recommendation.
pub const NO_RECOMMENDATION: &str = "No recommendation found.";

// ---------------------------------------------------------------------------
// RequestError
// ---------------------------------------------------------------------------

/// Ways a single recommendation request can fail.
///
/// `Display` yields the exact message shown in the result area.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No response was obtained (DNS, connect, reset, …).
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// A success response whose body is not the expected JSON.
    #[error("{0}")]
    MalformedBody(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        RequestError::Transport(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RecommendRequest<'a> {
    query: &'a str,
}

/// Display text of a JSON field, or `None` when the value is falsy
/// (`null`, `false`, `0`, `""`).  Non-string values are shown as JSON.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Why an error body yielded no usable message.
#[derive(Debug, Error)]
pub enum ErrorBodyIssue {
    #[error("error body is not valid JSON: {0}")]
    Unparseable(#[from] serde_json::Error),
    #[error("error body has no `error` message")]
    MissingMessage,
}

/// Extract the server-provided `error` message from a failure body.
pub fn try_parse_error_body(body: &[u8]) -> Result<String, ErrorBodyIssue> {
    let parsed: Value = serde_json::from_slice(body)?;
    parsed
        .get("error")
        .and_then(field_text)
        .ok_or(ErrorBodyIssue::MissingMessage)
}

/// Message used when a failure body carries nothing usable.
pub fn server_error_fallback(status: u16) -> String {
    format!("Server error ({status}). Please try again later.")
}

/// Map a completed HTTP exchange to a recommendation or an error.
///
/// ```
/// use reqwest::StatusCode;
/// use recommend_assistant::recommend::client::interpret_response;
///
/// let ok = interpret_response(StatusCode::OK, br#"{"recommendation":"Buy X"}"#);
/// assert_eq!(ok.unwrap(), "Buy X");
///
/// let err = interpret_response(StatusCode::SERVICE_UNAVAILABLE, b"<html>");
/// assert_eq!(err.unwrap_err().to_string(),
///            "Server error (503). Please try again later.");
/// ```
pub fn interpret_response(status: StatusCode, body: &[u8]) -> Result<String, RequestError> {
    if status.is_success() {
        let parsed: Value = serde_json::from_slice(body)
            .map_err(|e| RequestError::MalformedBody(e.to_string()))?;
        return Ok(parsed
            .get("recommendation")
            .and_then(field_text)
            .unwrap_or_else(|| NO_RECOMMENDATION.to_string()));
    }

    let code = status.as_u16();
    let message = match try_parse_error_body(body) {
        Ok(message) => message,
        Err(issue) => {
            log::debug!("recommend: status {code} without server message ({issue})");
            server_error_fallback(code)
        }
    };
    Err(RequestError::Server {
        status: code,
        message,
    })
}

// ---------------------------------------------------------------------------
// RecommendationClient trait
// ---------------------------------------------------------------------------

/// Async source of recommendations.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn RecommendationClient>` with tasks on the runtime.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    async fn recommend(&self, query: &Query) -> Result<String, RequestError>;
}

// ---------------------------------------------------------------------------
// HttpRecommendationClient
// ---------------------------------------------------------------------------

/// Calls the recommendation endpoint over HTTP.
pub struct HttpRecommendationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecommendationClient {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn recommend(&self, query: &Query) -> Result<String, RequestError> {
        log::info!("recommend: POST {} ({} chars)", self.endpoint, query.as_str().len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RecommendRequest {
                query: query.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        log::debug!("recommend: status {status}, {} body bytes", body.len());

        interpret_response(status, &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
