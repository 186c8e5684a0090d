//! Callable tools and the tool registry.
//!
//! A [`Tool`] is the derived, ephemeral projection of one action: a name that
//! encodes its execution context, the natural-language description shown to
//! the model, the compiled input schema, and a bound async executor. Tools
//! are rebuilt whenever the action set for a conversation is loaded and are
//! never persisted.
//!
//! The [`ToolRegistry`] resolves tool calls by name and executes them,
//! multiple calls in parallel when a model turn requests more than one.
//! Failures are reported as data in the [`ToolOutput`] so the conversation
//! can continue and the model can see what went wrong.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Tool execution result.
pub type ToolResult = Result<Value, ToolError>;

/// Future type for async tool execution.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool executor function type. The executor closes over everything the tool
/// needs (compiled request, client registry, HTTP client) at compile time.
pub type ToolExecutor = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Errors that can occur when resolving or invoking a tool.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum ToolError {
    /// Tool not found in the registry.
    #[error("tool '{0}' not found; available tools: {1}")]
    ToolNotFound(String, String),

    /// Arguments did not have the expected shape.
    #[error("invalid arguments for tool '{tool}': {error}")]
    InvalidArguments { tool: String, error: String },

    /// The tool's executor failed.
    #[error("tool '{tool}' execution failed: {error}")]
    ExecutionFailed { tool: String, error: String },
}

/// A named, schema-validated, executable tool.
pub struct Tool {
    /// Tool name; carries the execution-context prefix.
    pub name: String,

    /// Description forwarded to the model.
    pub description: String,

    /// Input schema (JSON Schema) compiled from the action's parameters.
    pub input_schema: Value,

    /// Bound executor.
    pub executor: ToolExecutor,
}

impl Tool {
    /// Create a new tool.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        executor: ToolExecutor,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            executor,
        }
    }

    /// Execute the tool with the given arguments.
    pub async fn execute(&self, args: Value) -> ToolResult {
        (self.executor)(args).await
    }

    /// Check that the arguments are an object, the only shape the compiled
    /// input schemas describe.
    pub fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        if args.is_object() {
            Ok(())
        } else {
            Err(ToolError::InvalidArguments {
                tool: self.name.clone(),
                error: "arguments must be an object".to_string(),
            })
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("executor", &"<function>")
            .finish()
    }
}

/// One model-requested call to a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Tool call id, assigned by the model layer.
    pub id: String,

    /// Tool name to invoke.
    pub name: String,

    /// Arguments (JSON object).
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// The outcome of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallResult {
    /// Tool call id (matches the request).
    pub id: String,

    /// Tool name that was invoked.
    pub name: String,

    /// Success or error output.
    pub output: ToolOutput,
}

/// Tool execution output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutput {
    /// Successful execution.
    Success { content: Value },

    /// Execution failed.
    Error { error: String },
}

impl ToolOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutput::Error { .. })
    }
}

/// Registry of the tools compiled for one conversation.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Check whether a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of every registered tool.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a single tool call. Unknown tools and argument-shape problems
    /// are reported in the output, never raised.
    pub async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolCallResult {
        let tool = match self.get(&tool_call.name) {
            Some(tool) => tool,
            None => {
                return ToolCallResult {
                    id: tool_call.id.clone(),
                    name: tool_call.name.clone(),
                    output: ToolOutput::Error {
                        error: ToolError::ToolNotFound(
                            tool_call.name.clone(),
                            self.tool_names().join(", "),
                        )
                        .to_string(),
                    },
                };
            }
        };

        if let Err(error) = tool.validate_args(&tool_call.args) {
            return ToolCallResult {
                id: tool_call.id.clone(),
                name: tool_call.name.clone(),
                output: ToolOutput::Error {
                    error: error.to_string(),
                },
            };
        }

        match tool.execute(tool_call.args.clone()).await {
            Ok(content) => ToolCallResult {
                id: tool_call.id.clone(),
                name: tool_call.name.clone(),
                output: ToolOutput::Success { content },
            },
            Err(error) => ToolCallResult {
                id: tool_call.id.clone(),
                name: tool_call.name.clone(),
                output: ToolOutput::Error {
                    error: error.to_string(),
                },
            },
        }
    }

    /// Execute multiple tool calls in parallel. Results are returned in
    /// request order; the calls themselves run concurrently.
    pub async fn execute_tool_calls(&self, tool_calls: &[ToolCall]) -> Vec<ToolCallResult> {
        use futures::future::join_all;

        let futures = tool_calls.iter().map(|call| self.execute_tool_call(call));
        join_all(futures).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
