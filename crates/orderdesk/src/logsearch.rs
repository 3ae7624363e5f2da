use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Client for the external log-search service. Lookups are keyed by a
/// correlation identifier; a missing match is a normal outcome, not an
/// error.
pub struct LogSearchClient {
    client: Client,
    base_url: String,
}

impl LogSearchClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fuzzy search for the raw log line matching the given correlation
    /// id. Returns `None` when the index has no match.
    pub async fn search(&self, correlation_id: &str) -> Result<Option<String>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        // padded with spaces so the term matches as a whole token
        let payload = json!({
            "search_term": format!(" {} ", correlation_id),
            "index": "main",
        });

        debug!(correlation_id, "log search");
        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Log search failed: {}", response.status()));
        }

        let body: Value = response.json().await?;
        let raw = body["results"][0]["_raw"].as_str().map(String::from);
        Ok(raw)
    }
}
