use std::time::Duration;

use serde_json::Value;
use tracing::warn;

const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Client for the external reasoning service: given an agent definition, a
/// context object and the expected output schema, it may return a JSON
/// result. It is never required for correctness; every call site carries a
/// deterministic fallback.
#[derive(Clone)]
pub struct ReasoningClient {
    endpoint: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ReasoningClient {
    pub fn from_env() -> Self {
        let endpoint = env_string("REASONING_API_URL");
        let api_key = env_string("REASONING_API_KEY");
        let timeout = Duration::from_millis(
            env_string("REASONING_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint,
            api_key,
            client,
        }
    }

    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// Runs a reasoning agent. Any transport error, timeout, non-success
    /// status or undecodable body collapses to `None`.
    pub async fn invoke(
        &self,
        definition: &str,
        context: &Value,
        output_schema: &Value,
    ) -> Option<Value> {
        let endpoint = self.endpoint.as_deref()?;

        let payload = serde_json::json!({
            "definition": definition,
            "context": context,
            "output_schema": output_schema,
        });

        let mut request = self.client.post(endpoint).json(&payload);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(Value::Null) => None,
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(error = %err, "reasoning service returned undecodable body");
                    None
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "reasoning service returned error status");
                None
            }
            Err(err) => {
                warn!(error = %err, "reasoning service unreachable");
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
    async fn test_disabled_client_returns_none() {
        let client = ReasoningClient::disabled();
        assert!(!client.is_available());
        let result = client
            .invoke("lesson", &serde_json::json!({}), &serde_json::json!({}))
            .await;
        assert!(result.is_none());
    }
}
