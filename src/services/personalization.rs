use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct MemorySnippet {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct QueryAnswer {
    answer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DifficultyPrediction {
    recommended_difficulty: Option<i64>,
}

/// Client for the personalization/memory service. Every call is advisory:
/// absence or failure only reduces the richness of reasoning/insight
/// fields, never observable correctness.
#[derive(Clone)]
pub struct PersonalizationClient {
    base_url: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl PersonalizationClient {
    pub fn from_env() -> Self {
        let base_url = env_string("PERSONALIZATION_API_URL")
            .map(|url| url.trim_end_matches('/').to_string());
        let api_key = env_string("PERSONALIZATION_API_KEY");
        let timeout = Duration::from_millis(
            env_string("PERSONALIZATION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url,
            api_key,
            client,
        }
    }

    pub fn disabled() -> Self {
        Self {
            base_url: None,
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.base_url.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// Registers a learner profile. Fire-and-forget.
    pub async fn register(&self, learner_id: &str, traits: &Value) {
        self.post_advisory(
            "register",
            &serde_json::json!({ "learner_id": learner_id, "traits": traits }),
        )
        .await;
    }

    /// Feeds a learning event into the memory service. Fire-and-forget.
    pub async fn ingest_event(
        &self,
        learner_id: &str,
        event_type: &str,
        content: &Value,
        metadata: &Value,
    ) {
        self.post_advisory(
            "events",
            &serde_json::json!({
                "learner_id": learner_id,
                "type": event_type,
                "content": content,
                "metadata": metadata,
            }),
        )
        .await;
    }

    /// Natural-language question over the learner's profile.
    pub async fn query(&self, learner_id: &str, question: &str) -> Option<String> {
        let value = self
            .post_json(
                "query",
                &serde_json::json!({ "learner_id": learner_id, "question": question }),
            )
            .await?;
        serde_json::from_value::<QueryAnswer>(value)
            .ok()
            .and_then(|r| r.answer)
            .filter(|a| !a.trim().is_empty())
    }

    /// Retrieves the `top_k` memories most relevant to `query`. Empty on
    /// absence or failure.
    pub async fn retrieve(&self, learner_id: &str, query: &str, top_k: usize) -> Vec<MemorySnippet> {
        let Some(value) = self
            .post_json(
                "retrieve",
                &serde_json::json!({
                    "learner_id": learner_id,
                    "query": query,
                    "top_k": top_k,
                }),
            )
            .await
        else {
            return Vec::new();
        };
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Predicts a recommended difficulty for the given decision context.
    /// The caller clamps the value to the valid range.
    pub async fn predict(&self, learner_id: &str, context: &Value) -> Option<i64> {
        let value = self
            .post_json(
                "predict",
                &serde_json::json!({ "learner_id": learner_id, "context": context }),
            )
            .await?;
        serde_json::from_value::<DifficultyPrediction>(value)
            .ok()
            .and_then(|p| p.recommended_difficulty)
    }

    async fn post_advisory(&self, path: &str, payload: &Value) {
        if self.post_json(path, payload).await.is_none() && self.is_available() {
            warn!(path, "personalization call dropped");
        }
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Option<Value> {
        let base = self.base_url.as_deref()?;
        let url = format!("{base}/{path}");

        let mut request = self.client.post(&url).json(payload);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(Value::Null) => None,
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(path, error = %err, "personalization response undecodable");
                    None
                }
            },
            Ok(resp) => {
                warn!(path, status = %resp.status(), "personalization error status");
                None
            }
            Err(err) => {
                warn!(path, error = %err, "personalization service unreachable");
                None
            }
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_yields_empty_results() {
        let client = PersonalizationClient::disabled();
        assert!(!client.is_available());
        assert!(client.query("learner-1", "anything").await.is_none());
        assert!(client.retrieve("learner-1", "anything", 3).await.is_empty());
        assert!(client
            .predict("learner-1", &serde_json::json!({}))
            .await
            .is_none());
    }
}
