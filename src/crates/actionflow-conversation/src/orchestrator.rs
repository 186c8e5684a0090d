//! Conversation orchestrator.
//!
//! Drives the multi-turn loop between the user, the model endpoint, and the
//! compiled action tools:
//!
//! ```text
//! Idle → Sending → AwaitingModel → ExecutingTools → Interpreting → Idle
//!                       │
//!                       └────────→ Idle   (no actionable invocations)
//! ```
//!
//! A user submission is appended optimistically, the full transcript goes to
//! the model, and any actionable tool invocations in the reply (calls whose
//! tool name carries the action prefix and whose arguments the model's
//! backend already resolved) are dispatched independently and concurrently.
//! Each completion appends its own outcome message and then runs a follow-up
//! interpretation turn asking the model to narrate that specific result, so
//! message append order follows completion order, not submission order.
//!
//! Processing is tracked with a per-invocation pending counter rather than a
//! single flag: the orchestrator reports busy until every dispatched
//! invocation has completed and been interpreted.
//!
//! Dispatch failures never end the conversation: compiled tools fold them
//! into `{error, details}` result values that flow through the same outcome
//! and interpretation path. Only failures talking to the model endpoint
//! itself move the conversation to `Failed`, append a user-visible error
//! message, and surface a [`ConversationError`]; the state then returns to
//! `Idle` so the user can continue.

use actionflow_core::{ToolCall, ToolOutput, ToolRegistry};
use actionflow_dispatch::{is_action_tool, strip_context_prefix};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::endpoint::{ModelEndpoint, TurnRequest, TurnResponse, WireToolCall};
use crate::error::{ConversationError, Result};
use crate::messages::{ChatMessage, Part, Role, Transcript};

/// Where the orchestrator currently is in its turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ready for the next user input.
    Idle,
    /// A user submission is being sent to the model endpoint.
    Sending,
    /// Waiting for the model's turn response.
    AwaitingModel,
    /// Dispatching actionable tool invocations.
    ExecutingTools,
    /// Asking the model to narrate a tool result.
    Interpreting,
    /// The last turn failed; surfaced to the user, returns to `Idle`.
    Failed,
}

/// Builds the ephemeral prompt for an interpretation turn.
pub type InterpretationPrompt = Arc<dyn Fn(&str, &Value) -> String + Send + Sync>;

fn default_interpretation_prompt(tool_name: &str, result: &Value) -> String {
    format!(
        "The tool {} returned the following result:\n{}\n\
         Briefly explain this result to the user in plain language.",
        strip_context_prefix(tool_name),
        result
    )
}

/// Orchestrates one conversation session over a set of compiled tools.
pub struct Orchestrator<E: ModelEndpoint> {
    endpoint: E,
    tools: Arc<ToolRegistry>,
    transcript: Transcript,
    agent_id: String,
    user_config: Option<Value>,
    interpretation_prompt: InterpretationPrompt,
    phase: Phase,
    pending: usize,
}

impl<E: ModelEndpoint> Orchestrator<E> {
    /// Create an orchestrator for one conversation session.
    pub fn new(endpoint: E, tools: ToolRegistry, agent_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            tools: Arc::new(tools),
            transcript: Transcript::new(),
            agent_id: agent_id.into(),
            user_config: None,
            interpretation_prompt: Arc::new(default_interpretation_prompt),
            phase: Phase::Idle,
            pending: 0,
        }
    }

    /// Forward opaque end-user configuration with every endpoint request.
    pub fn with_user_config(mut self, config: Value) -> Self {
        self.user_config = Some(config);
        self
    }

    /// Override how interpretation prompts are built.
    pub fn with_interpretation_prompt(mut self, prompt: InterpretationPrompt) -> Self {
        self.interpretation_prompt = prompt;
        self
    }

    /// The transcript so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Current phase of the turn loop.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether any submitted work is still in flight.
    pub fn is_processing(&self) -> bool {
        self.pending > 0
    }

    /// End the session: drop all messages, recorded results, and the
    /// compiled tool set (and with it any client function references).
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.tools = Arc::new(ToolRegistry::new());
        self.pending = 0;
        self.phase = Phase::Idle;
    }

    /// Submit one user message and run the turn to completion, including
    /// tool dispatch and interpretation follow-ups.
    ///
    /// Empty input is ignored. Endpoint failures append a user-visible
    /// error message and are also returned to the caller; the orchestrator
    /// is ready for the next input either way.
    pub async fn submit(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.phase = Phase::Sending;
        self.pending += 1;
        self.transcript.push(ChatMessage::user(text));

        let outcome = self.run_turn().await;
        self.pending = self.pending.saturating_sub(1);

        match outcome {
            Ok(()) => {
                if self.pending == 0 {
                    self.phase = Phase::Idle;
                }
                Ok(())
            }
            Err(error) => {
                warn!(%error, "conversation turn failed");
                self.phase = Phase::Failed;
                self.transcript.push(ChatMessage::assistant(format!(
                    "Something went wrong while processing your message: {error}"
                )));
                self.pending = 0;
                self.phase = Phase::Idle;
                Err(error)
            }
        }
    }

    async fn run_turn(&mut self) -> Result<()> {
        self.phase = Phase::AwaitingModel;
        let response = self.request_turn(self.transcript.messages().to_vec()).await?;
        if let Some(error) = response.terminal_error() {
            return Err(ConversationError::Turn(error));
        }

        let actionable = actionable_invocations(&response);
        let text = response.text.unwrap_or_default();

        if actionable.is_empty() {
            if !text.is_empty() {
                self.transcript.push(ChatMessage::assistant(text));
            }
            return Ok(());
        }

        let mut parts = Vec::with_capacity(actionable.len() + 1);
        if !text.is_empty() {
            parts.push(Part::text(text));
        }
        for (call, args) in &actionable {
            parts.push(Part::invocation(
                call.tool_call_id.clone(),
                call.tool_name.clone(),
                args.clone(),
            ));
        }
        self.transcript.push(ChatMessage::new(Role::Assistant, parts));

        self.phase = Phase::ExecutingTools;
        let mut executions = FuturesUnordered::new();
        for (call, args) in actionable {
            self.pending += 1;
            let tools = Arc::clone(&self.tools);
            executions.push(async move {
                debug!(tool = %call.tool_name, id = %call.tool_call_id, "dispatching invocation");
                let result = tools
                    .execute_tool_call(&ToolCall::new(
                        call.tool_call_id.clone(),
                        call.tool_name.clone(),
                        args,
                    ))
                    .await;
                (call, result)
            });
        }

        // Completion order, not submission order: each finished invocation
        // appends its outcome and interpretation before the counter drops.
        // Interpretation turns serialize the drain, so a slow interpretation
        // delays observing dispatches that have already finished.
        loop {
            self.phase = Phase::ExecutingTools;
            let Some((call, result)) = executions.next().await else {
                break;
            };
            let value = match result.output {
                ToolOutput::Success { content } => content,
                ToolOutput::Error { error } => {
                    json!({"error": "execution_failed", "details": error})
                }
            };

            self.transcript
                .resolve_invocation(&call.tool_call_id, value.clone())?;
            self.transcript
                .push(ChatMessage::assistant(outcome_text(&call.tool_name, &value)));

            self.phase = Phase::Interpreting;
            let interpretation = self.interpret(&call.tool_name, &value).await?;
            if !interpretation.is_empty() {
                self.transcript.push(ChatMessage::assistant(interpretation));
            }
            self.pending = self.pending.saturating_sub(1);
        }

        Ok(())
    }

    /// Run one interpretation turn for a resolved invocation. The prompt is
    /// ephemeral: it goes to the endpoint but never enters the transcript.
    async fn interpret(&self, tool_name: &str, value: &Value) -> Result<String> {
        let prompt = (self.interpretation_prompt)(tool_name, value);
        let mut messages = self.transcript.messages().to_vec();
        messages.push(ChatMessage::user(prompt));

        let response = self.request_turn(messages).await?;
        if let Some(error) = response.terminal_error() {
            return Err(ConversationError::Turn(error));
        }
        Ok(response.text.unwrap_or_default())
    }

    async fn request_turn(&self, messages: Vec<ChatMessage>) -> Result<TurnResponse> {
        self.endpoint
            .send_turn(TurnRequest {
                messages,
                agent_id: self.agent_id.clone(),
                user_config: self.user_config.clone(),
                idempotency_key: Uuid::new_v4().to_string(),
            })
            .await
    }
}

/// The invocations in a turn that can actually be dispatched: tool calls
/// carrying the action prefix whose arguments the backend already resolved.
/// A result object stands in for the call arguments when present.
fn actionable_invocations(response: &TurnResponse) -> Vec<(WireToolCall, Value)> {
    response
        .tool_calls
        .iter()
        .filter(|call| is_action_tool(&call.tool_name))
        .filter_map(|call| {
            let resolved = response.result_for(&call.tool_call_id)?;
            let args = if resolved.is_object() {
                resolved.clone()
            } else {
                call.args.clone()
            };
            Some((call.clone(), args))
        })
        .collect()
}

fn outcome_text(tool_name: &str, value: &Value) -> String {
    let name = strip_context_prefix(tool_name);
    match value.get("details").and_then(Value::as_str) {
        Some(details) if value.get("error").is_some() => {
            format!("Tool {name} failed: {details}")
        }
        _ if value.get("error").is_some() => format!("Tool {name} failed."),
        _ => format!("Tool {name} succeeded."),
    }
}
