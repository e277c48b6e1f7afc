//! Brain client: HTTP bridge to the remote Luminous backend.
//!
//! One request/response exchange with the backend is a cycle, one "thought"
//! of the agent. The interactive path never sees a transport failure: every
//! error is classified and converted into a synthetic [`CycleResult`] carrying
//! a user-facing diagnostic, so callers always receive a well-formed result.
//!
//! Memory writes (short-term slot, history log) return plain `Result`s; the
//! sync layer logs failures and moves on.

use crate::endpoint::{resolve_backend_url, SECURE_PROXY_PATH};
use crate::shared::{
    ContextSnapshot, CycleResult, InteractionRecord, LuminousState, MemoryItem, WARNING_MARKER,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Remote short-term slot carrying context between cycles.
pub const CONTEXT_MEMORY_KEY: &str = "luminous_context";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Markers in an error body that mean the backend ran out of quota.
const QUOTA_TEXT_MARKERS: [&str; 2] = ["quota", "resource_exhausted"];

#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    /// No response at all: DNS failure, refused connection, timeout.
    #[error("backend unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    /// Secure origin pointed at a non-proxy target and the dial failed.
    #[error("mixed-content security block")]
    SecurityBlock,
    /// Backend answered with a non-2xx status.
    #[error("backend error {status}: {body}")]
    Status { status: u16, body: String },
    /// HTTP 429, or a quota marker in the error body.
    #[error("backend quota exhausted")]
    QuotaExhausted,
    /// Response arrived but did not parse as the expected shape.
    #[error("malformed backend response: {0}")]
    Malformed(#[source] reqwest::Error),
}

// Wire shapes of the backend contract.

#[derive(Serialize)]
struct CycleRequest<'a> {
    input_text: &'a str,
    current_state: LuminousState,
    /// JSON-encoded snapshot of whatever short-term memory the caller holds.
    memory_context: String,
    time_context: &'a str,
}

#[derive(Serialize)]
struct ShortTermWrite<'a> {
    key: &'a str,
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct ShortTermRead {
    #[serde(default)]
    result: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct HistoryAppend<'a> {
    items: &'a [InteractionRecord],
}

#[derive(Serialize)]
struct LongTermQuery<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct LongTermResults {
    #[serde(default)]
    results: Vec<MemoryItem>,
}

/// HTTP client for the cycle and memory endpoints. Cheap to clone per task is
/// not needed; wrap it in an `Arc` at the composition root.
pub struct BrainClient {
    base_url: String,
    api_key: Option<String>,
    secure_transport: bool,
    client: reqwest::Client,
}

impl BrainClient {
    /// Resolves the backend base URL and builds the client. When resolution
    /// yields the relative proxy path, `public_origin` (if any) is prepended
    /// so requests still carry an absolute URL.
    pub fn new(
        secure_transport: bool,
        configured_url: Option<&str>,
        public_origin: Option<&str>,
        api_key: Option<String>,
    ) -> Self {
        let resolved = resolve_backend_url(secure_transport, configured_url);
        let base_url = match public_origin {
            Some(origin) if resolved.starts_with('/') => {
                format!("{}{}", origin.trim_end_matches('/'), resolved)
            }
            _ => resolved,
        };
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url,
            api_key,
            secure_transport,
            client,
        }
    }

    /// Effective base URL, after proxy forcing and origin joining.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder
    }

    /// True when the base points somewhere other than the secure proxy while
    /// the shell itself is on secure transport. A dial failure in that
    /// configuration is the mixed-content block, not a dead backend.
    fn secure_direct_dial(&self) -> bool {
        self.secure_transport && !self.base_url.ends_with(SECURE_PROXY_PATH)
    }

    fn classify_send_error(&self, err: reqwest::Error) -> BrainError {
        if self.secure_direct_dial() {
            BrainError::SecurityBlock
        } else {
            BrainError::Unreachable(err)
        }
    }

    async fn classify_status(res: reqwest::Response) -> BrainError {
        let status = res.status().as_u16();
        if status == 429 {
            return BrainError::QuotaExhausted;
        }
        let body = res.text().await.unwrap_or_default();
        let lowered = body.to_lowercase();
        if QUOTA_TEXT_MARKERS.iter().any(|m| lowered.contains(m)) {
            return BrainError::QuotaExhausted;
        }
        BrainError::Status { status, body }
    }

    /// One cycle against the backend. Fails with the classified error; use
    /// [`BrainClient::process_cycle`] on the interactive path.
    pub async fn try_cycle(
        &self,
        input: &str,
        current_state: LuminousState,
        memory_context: Option<&serde_json::Value>,
        time_context: &str,
    ) -> Result<CycleResult, BrainError> {
        let memory_context = match memory_context {
            Some(value) => value.to_string(),
            None => "null".to_string(),
        };
        let body = CycleRequest {
            input_text: input,
            current_state,
            memory_context,
            time_context,
        };
        let res = self
            .post("/cycle")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        if !res.status().is_success() {
            return Err(Self::classify_status(res).await);
        }
        res.json::<CycleResult>().await.map_err(BrainError::Malformed)
    }

    /// One cycle, with failures converted into a synthetic result. Always
    /// returns a well-formed [`CycleResult`].
    pub async fn process_cycle(
        &self,
        input: &str,
        current_state: LuminousState,
        memory_context: Option<&serde_json::Value>,
        time_context: &str,
    ) -> CycleResult {
        match self
            .try_cycle(input, current_state, memory_context, time_context)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(target: "luminous::brain", "cycle failed: {}", err);
                self.synthetic_failure(&err)
            }
        }
    }

    /// Builds the diagnostic result for a failed cycle. Quota exhaustion puts
    /// the agent to sleep; everything else reads as a severed link.
    pub fn synthetic_failure(&self, err: &BrainError) -> CycleResult {
        let (state, emotional, thought, diagnostic) = match err {
            BrainError::QuotaExhausted => (
                LuminousState::Sleeping,
                "Exhausted",
                "Cognitive quota exhausted. Entering rest cycle.",
                "API quota exceeded. Resting until the quota window resets.".to_string(),
            ),
            BrainError::SecurityBlock => (
                LuminousState::Idle,
                "Disconnected",
                "Neural Link Severed.",
                "Security Block: secure origin prevented connection to insecure IP. Clearing saved settings may fix this.".to_string(),
            ),
            BrainError::Unreachable(_) => (
                LuminousState::Idle,
                "Disconnected",
                "Neural Link Severed.",
                "Connection Refused. Is the VPS backend online?".to_string(),
            ),
            BrainError::Status { status, .. } => (
                LuminousState::Idle,
                "Disconnected",
                "Neural Link Severed.",
                format!("Backend Error: {}", status),
            ),
            BrainError::Malformed(_) => (
                LuminousState::Idle,
                "Disconnected",
                "Neural Link Severed.",
                "Backend returned an unreadable response.".to_string(),
            ),
        };
        CycleResult {
            state,
            emotional_state: emotional.into(),
            thought_process: thought.into(),
            response: format!("{} SYSTEM ERROR: {}", WARNING_MARKER, diagnostic),
            gem_updates: Vec::new(),
            generated_code: None,
            refusal_reason: None,
        }
    }

    /// Writes one value into the remote short-term slot.
    pub async fn save_short_term(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), BrainError> {
        let res = self
            .post("/memory/short")
            .json(&ShortTermWrite { key, value })
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        if !res.status().is_success() {
            return Err(Self::classify_status(res).await);
        }
        Ok(())
    }

    /// Reads the remote short-term slot. Absent keys come back as `None`.
    pub async fn get_short_term(
        &self,
        key: &str,
    ) -> Result<Option<serde_json::Value>, BrainError> {
        let mut builder = self
            .client
            .get(self.url("/memory/short"))
            .query(&[("key", key)]);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("x-api-key", api_key);
        }
        let res = builder
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        if !res.status().is_success() {
            return Err(Self::classify_status(res).await);
        }
        let parsed: ShortTermRead = res.json().await.map_err(BrainError::Malformed)?;
        Ok(parsed.result)
    }

    /// Appends a batch of interaction records to the remote history log.
    pub async fn append_history(&self, items: &[InteractionRecord]) -> Result<(), BrainError> {
        let res = self
            .post("/memory/history")
            .json(&HistoryAppend { items })
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        if !res.status().is_success() {
            return Err(Self::classify_status(res).await);
        }
        Ok(())
    }

    /// Semantic search over long-term memory.
    pub async fn search_long_term(&self, query: &str) -> Result<Vec<MemoryItem>, BrainError> {
        let res = self
            .post("/memory/long/search")
            .json(&LongTermQuery { query })
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;
        if !res.status().is_success() {
            return Err(Self::classify_status(res).await);
        }
        let parsed: LongTermResults = res.json().await.map_err(BrainError::Malformed)?;
        Ok(parsed.results)
    }
}

/// Destination of a flush. The real client implements it against the remote
/// memory endpoints; tests substitute recording doubles.
#[async_trait]
pub trait MemorySink: Send + Sync {
    async fn append_history(&self, items: &[InteractionRecord]) -> Result<(), BrainError>;
    async fn save_context(&self, snapshot: &ContextSnapshot) -> Result<(), BrainError>;
}

#[async_trait]
impl MemorySink for BrainClient {
    async fn append_history(&self, items: &[InteractionRecord]) -> Result<(), BrainError> {
        BrainClient::append_history(self, items).await
    }

    async fn save_context(&self, snapshot: &ContextSnapshot) -> Result<(), BrainError> {
        let value = serde_json::to_value(snapshot)
            .unwrap_or_else(|_| serde_json::Value::Null);
        self.save_short_term(CONTEXT_MEMORY_KEY, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_base_joins_public_origin() {
        let client = BrainClient::new(
            true,
            Some("http://74.208.153.196"),
            Some("https://skipper.example.com/"),
            None,
        );
        assert_eq!(client.base_url(), "https://skipper.example.com/api");
    }

    #[test]
    fn direct_base_ignores_public_origin() {
        let client = BrainClient::new(
            false,
            Some("http://10.0.0.5:8080"),
            Some("https://skipper.example.com"),
            None,
        );
        assert_eq!(client.base_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn quota_synthetic_result_sleeps_exhausted() {
        let client = BrainClient::new(false, Some("http://10.0.0.5"), None, None);
        let result = client.synthetic_failure(&BrainError::QuotaExhausted);
        assert_eq!(result.state, LuminousState::Sleeping);
        assert_eq!(result.emotional_state, "Exhausted");
        assert!(result.is_warning());
        assert!(result.gem_updates.is_empty());
    }

    #[test]
    fn status_synthetic_result_idles_with_marker() {
        let client = BrainClient::new(false, Some("http://10.0.0.5"), None, None);
        let result = client.synthetic_failure(&BrainError::Status {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(result.state, LuminousState::Idle);
        assert_eq!(result.emotional_state, "Disconnected");
        assert!(result.response.starts_with(WARNING_MARKER));
        assert!(result.response.contains("Backend Error: 500"));
    }
}
