//! Conversation transcript types.
//!
//! A [`Transcript`] is the append-only message history of one conversation
//! session. Each [`ChatMessage`] carries a list of [`Part`]s: plain text, or
//! a tool invocation that starts `Partial` and transitions to `Result`
//! exactly once when dispatch completes. Results are additionally recorded
//! in a per-invocation map keyed by `(message_id, part_index)` so the
//! interpretation step can consume each one exactly once.
//!
//! Messages are never removed except by [`Transcript::clear`], and a
//! resolved invocation's result is immutable: attempting to resolve the
//! same invocation twice is an error.
//!
//! # Example
//!
//! ```rust
//! use actionflow_conversation::{ChatMessage, Transcript};
//!
//! let mut transcript = Transcript::new();
//! transcript.push(ChatMessage::user("What's the weather in Oslo?"));
//! transcript.push(ChatMessage::assistant("Let me check."));
//!
//! assert_eq!(transcript.len(), 2);
//! assert!(transcript.visible_text().contains("Oslo"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{ConversationError, Result};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The model.
    Assistant,
}

/// Lifecycle state of a tool invocation part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationState {
    /// Dispatched but not yet resolved.
    Partial,
    /// Resolved; `result` is attached and immutable.
    Result,
}

/// One piece of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Part {
    /// Plain text content.
    Text { text: String },
    /// A model-requested tool invocation.
    #[serde(rename_all = "camelCase")]
    ToolInvocation {
        tool_call_id: String,
        tool_name: String,
        args: Value,
        state: InvocationState,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Create a pending tool invocation part.
    pub fn invocation(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: Value,
    ) -> Self {
        Part::ToolInvocation {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            state: InvocationState::Partial,
            result: None,
        }
    }

    /// Whether this part is a still-pending invocation.
    pub fn is_pending_invocation(&self) -> bool {
        matches!(
            self,
            Part::ToolInvocation {
                state: InvocationState::Partial,
                ..
            }
        )
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id.
    pub id: String,

    /// Who authored the message.
    pub role: Role,

    /// Ordered message parts.
    pub parts: Vec<Part>,

    /// When the message entered the transcript.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with explicit parts.
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
            created_at: Utc::now(),
        }
    }

    /// Create a user text message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// Create an assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Part::text(text)])
    }

    /// Check if this is a user message.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Check if this is an assistant message.
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Concatenated text content of this message.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let Part::Text { text } = part {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    /// Whether any invocation part is still pending.
    pub fn has_pending_invocations(&self) -> bool {
        self.parts.iter().any(Part::is_pending_invocation)
    }
}

/// The raw value an invocation resolved to, kept until the interpretation
/// step consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    /// The value returned by dispatch, or an `{error, details}` object.
    pub value: Value,
}

impl ActionResult {
    /// Whether the value carries a dispatch failure.
    pub fn is_error(&self) -> bool {
        self.value.get("error").is_some()
    }
}

/// Append-only message history for one conversation session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    results: HashMap<(String, usize), ActionResult>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, returning its id.
    pub fn push(&mut self, message: ChatMessage) -> String {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// All messages in append order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages and recorded results.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.results.clear();
    }

    /// Attach a result to the pending invocation with the given tool call
    /// id.
    ///
    /// The part transitions `Partial → Result` exactly once; a second
    /// resolution for the same invocation fails with
    /// [`ConversationError::ResultAlreadyAttached`]. The value is also
    /// recorded in the result map under `(message_id, part_index)` for the
    /// interpretation step.
    pub fn resolve_invocation(&mut self, tool_call_id: &str, value: Value) -> Result<()> {
        for message in self.messages.iter_mut().rev() {
            let message_id = message.id.clone();
            for (index, part) in message.parts.iter_mut().enumerate() {
                if let Part::ToolInvocation {
                    tool_call_id: id,
                    state,
                    result,
                    ..
                } = part
                {
                    if id != tool_call_id {
                        continue;
                    }
                    if *state == InvocationState::Result {
                        return Err(ConversationError::ResultAlreadyAttached(
                            tool_call_id.to_string(),
                        ));
                    }
                    *state = InvocationState::Result;
                    *result = Some(value.clone());
                    self.results
                        .insert((message_id, index), ActionResult { value });
                    return Ok(());
                }
            }
        }
        Err(ConversationError::UnknownInvocation(tool_call_id.to_string()))
    }

    /// Consume the recorded result for one invocation. Each result can be
    /// taken once.
    pub fn take_result(&mut self, message_id: &str, part_index: usize) -> Option<ActionResult> {
        self.results
            .remove(&(message_id.to_string(), part_index))
    }

    /// The user-visible text of the conversation, one line per text part.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            let text = message.text();
            if text.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_roles_and_text() {
        let user = ChatMessage::user("hello");
        let assistant = ChatMessage::assistant("hi there");

        assert!(user.is_user());
        assert!(assistant.is_assistant());
        assert_eq!(user.text(), "hello");
        assert_ne!(user.id, assistant.id);
    }

    #[test]
    fn invocation_part_starts_partial() {
        let part = Part::invocation("call_1", "ACTION_SERVER_GetWeather", json!({"city": "Oslo"}));
        assert!(part.is_pending_invocation());
    }

    #[test]
    fn resolve_invocation_transitions_exactly_once() {
        let mut transcript = Transcript::new();
        let message = ChatMessage::new(
            Role::Assistant,
            vec![Part::invocation("call_1", "ACTION_SERVER_GetWeather", json!({}))],
        );
        let message_id = transcript.push(message);

        transcript
            .resolve_invocation("call_1", json!({"temp": 18}))
            .unwrap();

        let error = transcript
            .resolve_invocation("call_1", json!({"temp": 21}))
            .unwrap_err();
        assert!(matches!(error, ConversationError::ResultAlreadyAttached(_)));

        // First resolution stands.
        let result = transcript.take_result(&message_id, 0).unwrap();
        assert_eq!(result.value, json!({"temp": 18}));
        assert!(!result.is_error());
    }

    #[test]
    fn resolving_unknown_invocation_fails() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("hello"));

        let error = transcript
            .resolve_invocation("call_missing", json!(null))
            .unwrap_err();
        assert!(matches!(error, ConversationError::UnknownInvocation(_)));
    }

    #[test]
    fn results_are_taken_once() {
        let mut transcript = Transcript::new();
        let message_id = transcript.push(ChatMessage::new(
            Role::Assistant,
            vec![Part::invocation("call_1", "ACTION_CLIENT_refreshPage", json!({}))],
        ));
        transcript.resolve_invocation("call_1", json!("ok")).unwrap();

        assert!(transcript.take_result(&message_id, 0).is_some());
        assert!(transcript.take_result(&message_id, 0).is_none());
    }

    #[test]
    fn visible_text_skips_invocation_parts() {
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::user("What's the weather?"));
        transcript.push(ChatMessage::new(
            Role::Assistant,
            vec![
                Part::text("Checking now."),
                Part::invocation("call_1", "ACTION_SERVER_GetWeather", json!({})),
            ],
        ));

        assert_eq!(transcript.visible_text(), "What's the weather?\nChecking now.");
    }

    #[test]
    fn error_results_are_detected() {
        let result = ActionResult {
            value: json!({"error": "upstream_status", "details": "503"}),
        };
        assert!(result.is_error());
    }

    #[test]
    fn parts_serialize_with_camel_case_tags() {
        let part = Part::invocation("call_1", "ACTION_SERVER_GetWeather", json!({"city": "Oslo"}));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "toolInvocation");
        assert_eq!(value["toolCallId"], "call_1");
        assert_eq!(value["state"], "partial");
        assert!(value.get("result").is_none());
    }
}
