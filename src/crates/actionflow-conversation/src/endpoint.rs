//! Model endpoint boundary.
//!
//! The orchestrator talks to the model through the [`ModelEndpoint`] trait:
//! one turn in, one turn out. [`HttpModelEndpoint`] is the production
//! implementation, posting the full transcript plus an idempotency key to a
//! remote chat endpoint; tests substitute their own implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ConversationError, Result};
use crate::messages::ChatMessage;

/// One request to the model endpoint.
///
/// Carries the full transcript so the endpoint is stateless, plus an
/// idempotency key so a retried request with the same key can be
/// deduplicated server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// The full transcript so far.
    pub messages: Vec<ChatMessage>,

    /// Which agent configuration the endpoint should run.
    pub agent_id: String,

    /// Opaque end-user configuration forwarded to the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_config: Option<Value>,

    /// Deduplication key for this request.
    pub idempotency_key: String,
}

/// A tool call the model requested in its turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
}

/// A result the model's backend attached to one of its tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToolResult {
    pub tool_call_id: String,
    #[serde(default)]
    pub result: Value,
}

/// One model turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnResponse {
    /// Assistant text, if any.
    pub text: Option<String>,

    /// Tool calls requested this turn.
    pub tool_calls: Vec<WireToolCall>,

    /// Backend-resolved results keyed by tool call id.
    pub tool_results: Vec<WireToolResult>,

    /// Terminal error code for the turn.
    pub error: Option<String>,

    /// Terminal error description for the turn.
    pub message: Option<String>,
}

impl TurnResponse {
    /// The terminal error for this turn, if the endpoint reported one.
    pub fn terminal_error(&self) -> Option<String> {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) => Some(format!("{error}: {message}")),
            (Some(error), None) => Some(error.clone()),
            (None, Some(message)) => Some(message.clone()),
            (None, None) => None,
        }
    }

    /// The backend-resolved result for a tool call, if one was attached.
    pub fn result_for(&self, tool_call_id: &str) -> Option<&Value> {
        self.tool_results
            .iter()
            .find(|result| result.tool_call_id == tool_call_id)
            .map(|result| &result.result)
    }
}

/// A collaborator that can run one model turn.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Send one turn request and await the model's response.
    async fn send_turn(&self, request: TurnRequest) -> Result<TurnResponse>;
}

/// Configuration for the HTTP model endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Full URL of the chat endpoint.
    pub url: String,

    /// Agent configuration id sent with every request.
    pub agent_id: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl EndpointConfig {
    /// Create a configuration with the default timeout.
    pub fn new(url: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent_id: agent_id.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP implementation of [`ModelEndpoint`].
#[derive(Debug, Clone)]
pub struct HttpModelEndpoint {
    client: Client,
    config: EndpointConfig,
}

impl HttpModelEndpoint {
    /// Create an endpoint client from a configuration.
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// The agent id this endpoint was configured with.
    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }
}

#[async_trait]
impl ModelEndpoint for HttpModelEndpoint {
    async fn send_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        debug!(
            url = %self.config.url,
            messages = request.messages.len(),
            idempotency_key = %request.idempotency_key,
            "sending model turn"
        );

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConversationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|error| ConversationError::InvalidResponse(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn turn_response_decodes_camel_case_fields() {
        let response: TurnResponse = serde_json::from_value(json!({
            "text": "Checking the weather.",
            "toolCalls": [
                {"toolCallId": "call_1", "toolName": "ACTION_SERVER_GetWeather", "args": {"city": "Oslo"}}
            ],
            "toolResults": [
                {"toolCallId": "call_1", "result": {"temp": 18}}
            ]
        }))
        .unwrap();

        assert_eq!(response.text.as_deref(), Some("Checking the weather."));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.result_for("call_1"), Some(&json!({"temp": 18})));
        assert_eq!(response.result_for("call_2"), None);
        assert!(response.terminal_error().is_none());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let response: TurnResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text.is_none());
        assert!(response.tool_calls.is_empty());
        assert!(response.tool_results.is_empty());
    }

    #[test]
    fn terminal_error_combines_error_and_message() {
        let response: TurnResponse = serde_json::from_value(json!({
            "error": "rate_limited",
            "message": "try again later"
        }))
        .unwrap();
        assert_eq!(
            response.terminal_error().as_deref(),
            Some("rate_limited: try again later")
        );
    }

    #[test]
    fn turn_request_serializes_idempotency_key() {
        let request = TurnRequest {
            messages: vec![ChatMessage::user("hello")],
            agent_id: "agent_1".to_string(),
            user_config: None,
            idempotency_key: "key_1".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["agentId"], "agent_1");
        assert_eq!(value["idempotencyKey"], "key_1");
        assert!(value.get("userConfig").is_none());
    }
}
