//! Chat-assistant client.
//!
//! The assistant is a single-operation collaborator: `ask(prompt)` sends
//! one chat-completion request and returns the reply text. Every failure
//! mode — transport error, timeout, non-success status, malformed reply —
//! collapses into one descriptive [`WorkflowError::Assistant`] so the
//! calling screen can render it inline. Nothing here retries.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::WorkflowError;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// HTTP client for the chat-completion endpoint.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AssistantClient {
    /// Builds a client from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Internal`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, WorkflowError> {
        Self::new(
            &config.assistant_base_url,
            &config.assistant_api_key,
            &config.assistant_model,
            Duration::from_secs(config.assistant_timeout_secs),
        )
    }

    /// Builds a client with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Internal`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, WorkflowError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Sends one prompt and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidRequest`] for an empty prompt, or
    /// [`WorkflowError::Assistant`] for any transport, status, or payload
    /// failure.
    pub async fn ask(&self, prompt: &str) -> Result<String, WorkflowError> {
        if prompt.trim().is_empty() {
            return Err(WorkflowError::InvalidRequest("prompt is empty".to_string()));
        }

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.http.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkflowError::Assistant(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Assistant(format!(
                "endpoint returned {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| WorkflowError::Assistant(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| WorkflowError::Assistant("reply contained no choices".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_prompt_is_rejected_locally() {
        let Ok(client) =
            AssistantClient::new("http://127.0.0.1:9", "", "test-model", Duration::from_secs(1))
        else {
            panic!("client build failed");
        };
        let result = client.ask("   ").await;
        assert!(matches!(result, Err(WorkflowError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn unresponsive_endpoint_yields_error_string() {
        // Bind a listener that never answers; the client times out and the
        // failure surfaces as a descriptive error, not a panic.
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };

        let Ok(client) = AssistantClient::new(
            &format!("http://{addr}"),
            "key",
            "test-model",
            Duration::from_millis(300),
        ) else {
            panic!("client build failed");
        };

        let result = client.ask("hello?").await;
        let Err(WorkflowError::Assistant(message)) = result else {
            panic!("expected assistant error");
        };
        assert!(!message.is_empty());
        drop(listener);
    }
}
