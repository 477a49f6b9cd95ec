//! The transport client itself.
//!
//! Each operation is one stateless request/response exchange: no retries, no
//! polling, no shared mutable state between calls. Concurrent invocations are
//! independent; cancellation is dropping the future. Payloads go through the
//! `kba-core` normalizer, so callers always receive fully-defaulted entities.

use kba_core::{
    normalize_chat_response, normalize_messages, normalize_sessions, normalize_web_results,
};
use kba_types::{ChatMessage, ChatResponse, ChatSession, HistoryTurn, Scope, WebSearchResult};
use reqwest::header::CACHE_CONTROL;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Result count sent to the web-search endpoint when the caller has no
/// preference.
pub const DEFAULT_WEB_RESULTS: usize = 5;

/// Wire request for `/api/chat`.
///
/// The session id is omitted from the body entirely when unset; an empty
/// string passed to [`AskRequest::with_session`] counts as unset.
#[derive(Clone, Debug, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub scope: Scope,
    pub agent: String,
    pub strict_citations: bool,
    pub history: Vec<HistoryTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_session_id: Option<String>,
}

impl AskRequest {
    pub fn new(query: impl Into<String>, scope: Scope) -> Self {
        Self {
            query: query.into(),
            scope,
            agent: "default".to_owned(),
            strict_citations: false,
            history: Vec::new(),
            chat_session_id: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    pub fn with_strict_citations(mut self, strict_citations: bool) -> Self {
        self.strict_citations = strict_citations;
        self
    }

    /// Prior turns to send along. The caller bounds the length; the client
    /// forwards whatever it is given.
    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        self.chat_session_id = (!session_id.is_empty()).then_some(session_id);
        self
    }
}

/// Diagnostic probe targets under `/api/test/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Llm,
    Rag,
    Serper,
}

impl Probe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Probe::Llm => "llm",
            Probe::Rag => "rag",
            Probe::Serper => "serper",
        }
    }
}

impl std::str::FromStr for Probe {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "llm" => Ok(Probe::Llm),
            "rag" => Ok(Probe::Rag),
            "serper" => Ok(Probe::Serper),
            other => Err(format!(
                "unknown probe '{other}' (expected llm, rag or serper)"
            )),
        }
    }
}

/// Async client for the KB-Assist backend wire contract.
#[derive(Clone, Debug)]
pub struct KbClient {
    http: reqwest::Client,
    base: Url,
}

impl KbClient {
    /// Build a client from resolved configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let base = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, base })
    }

    /// Join path segments onto the base endpoint. Segments are appended one
    /// at a time so anything embedded in them (slashes included) gets
    /// percent-encoded instead of splitting the path.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Ask a question. POST `/api/chat`.
    pub async fn ask_question(&self, request: &AskRequest) -> ClientResult<ChatResponse> {
        let url = self.endpoint(&["api", "chat"]);
        tracing::debug!(%url, scope = request.scope.as_str(), "asking question");

        let response = self.http.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        Ok(normalize_chat_response(&body))
    }

    /// List persisted conversations. GET `/api/chat/sessions`, always fresh
    /// (never served from an intermediary cache).
    pub async fn list_sessions(&self) -> ClientResult<Vec<ChatSession>> {
        let url = self.endpoint(&["api", "chat", "sessions"]);
        tracing::debug!(%url, "listing sessions");

        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        Ok(normalize_sessions(&body))
    }

    /// Fetch the transcript of one session. GET `/api/chat/sessions/{id}`.
    pub async fn session_messages(&self, session_id: &str) -> ClientResult<Vec<ChatMessage>> {
        let url = self.endpoint(&["api", "chat", "sessions", session_id]);
        tracing::debug!(%url, "fetching session transcript");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        Ok(normalize_messages(&body))
    }

    /// Run a web search. POST `/api/websearch`.
    pub async fn web_search(
        &self,
        query: &str,
        num_results: usize,
    ) -> ClientResult<Vec<WebSearchResult>> {
        let url = self.endpoint(&["api", "websearch"]);
        tracing::debug!(%url, num_results, "running web search");

        let payload = json!({ "query": query, "num_results": num_results });
        let response = self.http.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        Ok(normalize_web_results(&body))
    }

    /// Hit a diagnostic probe. GET `/api/test/{probe}`, opaque passthrough.
    pub async fn probe(&self, probe: Probe) -> ClientResult<Value> {
        let url = self.endpoint(&["api", "test", probe.as_str()]);
        tracing::debug!(%url, "running diagnostic probe");

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }
}

/// Turn a non-success response into the single error the caller sees.
async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ClientError::Api {
        status,
        message: error_message(status, &body),
    }
}

/// Resolve the best human-readable message from an error body.
///
/// Strictly sequential, each step attempted only when the previous failed:
/// JSON `detail` field (stringified if not a string), the whole JSON body
/// serialized, the raw body text, a generic status-code message.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = parsed.get("detail") {
            return match detail.as_str() {
                Some(text) => text.to_owned(),
                None => detail.to_string(),
            };
        }
        if let Ok(serialized) = serde_json::to_string(&parsed) {
            return serialized;
        }
    }
    if !body.is_empty() {
        return body.to_owned();
    }
    format!("request failed with status {status}")
}
