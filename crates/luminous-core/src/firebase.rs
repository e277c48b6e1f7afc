//! Firebase Realtime Database mirror: console entries are pushed to the
//! `luminous_logs` list via the RTDB REST API when credentials are present.

use crate::config::FirebaseConfig;
use crate::shared::LogEntry;
use chrono::Utc;
use std::time::Duration;

const MIRROR_TIMEOUT: Duration = Duration::from_secs(10);

/// REST writer for the `luminous_logs` list. Cheap to clone.
#[derive(Clone)]
pub struct FirebaseLogSink {
    client: reqwest::Client,
    push_url: String,
}

impl FirebaseLogSink {
    /// Builds the sink when both the API key and database URL are configured;
    /// otherwise the mirror stays off.
    pub fn from_config(config: &FirebaseConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?.trim();
        let database_url = config.database_url.as_deref()?.trim();
        if api_key.is_empty() || database_url.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder()
            .timeout(MIRROR_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            client,
            push_url: format!(
                "{}/luminous_logs.json?auth={}",
                database_url.trim_end_matches('/'),
                api_key
            ),
        })
    }

    /// Pushes one entry. RTDB `POST .json` appends under a generated key.
    /// The mirrored copy carries a full ISO timestamp instead of the console's
    /// time-of-day string.
    pub async fn push(&self, entry: &LogEntry) -> Result<(), reqwest::Error> {
        let mut value = serde_json::to_value(entry).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }
        self.client
            .post(&self.push_url)
            .json(&value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
