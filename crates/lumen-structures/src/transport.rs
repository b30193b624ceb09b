//! Outbound calls to the structure rendering service.
//!
//! Wire format:
//!
//! ```text
//! POST <service_url>
//! { "contents": ["CCO", "O=C=O"] }
//!
//! 200 OK
//! { "results": { "CCO": { "url": "https://…/cco.svg" }, "O=C=O": { "error": "…" } } }
//! ```
//!
//! Any non-2xx status fails the whole batch.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::error::StructureError;

/// Request body of a batched call.
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub contents: &'a [String],
}

/// Response body of a batched call.
#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    pub results: HashMap<String, StructureResult>,
}

/// Per-content result inside a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureResult {
    Url { url: String },
    Error { error: String },
}

/// Seam between the batcher and the network.
///
/// `fetch` receives the distinct contents of one window and resolves to the
/// per-content results, or to a single error when the whole call failed.
pub trait StructureTransport: Send + Sync + 'static {
    fn fetch(
        &self,
        contents: Vec<String>,
    ) -> impl Future<Output = Result<HashMap<String, StructureResult>, StructureError>> + Send;
}

/// Create a ureq agent that reports HTTP error statuses as responses.
#[must_use]
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`StructureTransport`] posting JSON to the structure service.
///
/// ureq is blocking, so each call runs on Tokio's blocking pool.
#[derive(Clone)]
pub struct HttpTransport {
    agent: Agent,
    url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StructureTransport for HttpTransport {
    fn fetch(
        &self,
        contents: Vec<String>,
    ) -> impl Future<Output = Result<HashMap<String, StructureResult>, StructureError>> + Send {
        let agent = self.agent.clone();
        let url = self.url.clone();
        async move {
            tokio::task::spawn_blocking(move || post_batch(&agent, &url, &contents))
                .await
                .map_err(|e| StructureError::Transport(e.to_string()))?
        }
    }
}

fn post_batch(
    agent: &Agent,
    url: &str,
    contents: &[String],
) -> Result<HashMap<String, StructureResult>, StructureError> {
    let response = agent
        .post(url)
        .send_json(&BatchRequest { contents })
        .map_err(|e| StructureError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if !(200..300).contains(&status) {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        return Err(StructureError::Transport(format!(
            "HTTP {status}: {error_body}"
        )));
    }

    let parsed: BatchResponse = body
        .read_json()
        .map_err(|e| StructureError::Transport(format!("invalid response body: {e}")))?;
    Ok(parsed.results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body() {
        let contents = vec!["CCO".to_owned(), "O".to_owned()];
        let json = serde_json::to_string(&BatchRequest {
            contents: &contents,
        })
        .unwrap();
        assert_eq!(json, r#"{"contents":["CCO","O"]}"#);
    }

    #[test]
    fn test_response_body_mixed_results() {
        let response: BatchResponse = serde_json::from_str(
            r#"{"results": {"CCO": {"url": "https://img/cco.svg"}, "X": {"error": "bad smiles"}}}"#,
        )
        .unwrap();

        assert_eq!(
            response.results["CCO"],
            StructureResult::Url {
                url: "https://img/cco.svg".to_owned()
            }
        );
        assert_eq!(
            response.results["X"],
            StructureResult::Error {
                error: "bad smiles".to_owned()
            }
        );
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        let agent = create_agent(Duration::from_secs(1));
        let result = post_batch(&agent, "http://127.0.0.1:1/structures", &["O".to_owned()]);
        assert!(matches!(result, Err(StructureError::Transport(_))));
    }
}
