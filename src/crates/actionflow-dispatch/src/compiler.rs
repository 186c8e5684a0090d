//! Tool Compiler.
//!
//! Builds one callable [`Tool`] per action: the tool name deterministically
//! encodes the execution context (`ACTION_SERVER_` / `ACTION_CLIENT_` prefix
//! plus the sanitized action name) so downstream consumers can route a tool
//! call without consulting the action record again; the input schema comes
//! from the parameter schema compiler; the executor closure binds everything
//! the tool needs at compile time: the pre-compiled request template and
//! HTTP dispatcher for server actions, the target function name and client
//! registry for client actions.
//!
//! Executors fold [`DispatchError`]s into `{error, details}` result values,
//! so an invoked tool always yields a value and the conversation continues.

use crate::error::DispatchError;
use crate::http::HttpDispatcher;
use crate::registry::ClientFunctionRegistry;
use actionflow_core::schema::compile_schema;
use actionflow_core::template::{filter_args, CompiledRequest};
use actionflow_core::{
    Action, ExecutionContext, ExecutionModel, SchemaError, Tool, ToolExecutor, ToolRegistry,
};
use std::sync::Arc;
use tracing::warn;

/// Tool-name prefix for server-context actions.
pub const SERVER_PREFIX: &str = "ACTION_SERVER_";

/// Tool-name prefix for client-context actions.
pub const CLIENT_PREFIX: &str = "ACTION_CLIENT_";

/// Prefix shared by both execution contexts; marks a tool call as an action
/// invocation.
pub const ACTION_PREFIX: &str = "ACTION_";

/// The name prefix that encodes an execution context.
pub fn context_prefix(context: ExecutionContext) -> &'static str {
    match context {
        ExecutionContext::Server => SERVER_PREFIX,
        ExecutionContext::Client => CLIENT_PREFIX,
    }
}

/// Derive the tool name for an action.
///
/// A name with no ASCII alphanumerics would sanitize to an empty suffix and
/// collide with every sibling in the same context; the action id stands in
/// for the suffix in that case.
pub fn tool_name(action: &Action) -> String {
    let mut suffix = sanitize(&action.name);
    if suffix.is_empty() {
        suffix = sanitize(&action.id);
    }
    format!("{}{}", context_prefix(action.context()), suffix)
}

/// Sanitize a human action label into a tool-name suffix: alphanumerics kept,
/// everything else collapsed to single underscores.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for character in name.trim().chars() {
        if character.is_ascii_alphanumeric() {
            out.push(character);
            last_was_separator = false;
        } else if !last_was_separator && !out.is_empty() {
            out.push('_');
            last_was_separator = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Strip the execution-context prefix from a tool or function name.
pub fn strip_context_prefix(name: &str) -> &str {
    name.strip_prefix(CLIENT_PREFIX)
        .or_else(|| name.strip_prefix(SERVER_PREFIX))
        .unwrap_or(name)
}

/// Whether a tool name marks an action invocation.
pub fn is_action_tool(name: &str) -> bool {
    name.starts_with(ACTION_PREFIX)
}

/// Compiles actions into callable tools.
#[derive(Debug, Clone)]
pub struct ToolCompiler {
    dispatcher: Arc<HttpDispatcher>,
    client_registry: Option<ClientFunctionRegistry>,
}

impl ToolCompiler {
    /// Create a compiler around an HTTP dispatcher.
    pub fn new(dispatcher: HttpDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            client_registry: None,
        }
    }

    /// Supply the client function registry for this conversation session.
    pub fn with_client_registry(mut self, registry: ClientFunctionRegistry) -> Self {
        self.client_registry = Some(registry);
        self
    }

    /// Compile one action into a tool.
    ///
    /// Fails only on schema errors; everything that can go wrong at
    /// execution time is deferred into the executor and reported as data.
    pub fn compile(&self, action: &Action) -> Result<Tool, SchemaError> {
        let input_schema = compile_schema(&action.parameters)?;
        let name = tool_name(action);

        let executor: ToolExecutor = match &action.execution {
            ExecutionModel::Server(model) => {
                let compiled = Arc::new(CompiledRequest::compile(&model.request));
                let dispatcher = Arc::clone(&self.dispatcher);
                Arc::new(move |args| {
                    let compiled = Arc::clone(&compiled);
                    let dispatcher = Arc::clone(&dispatcher);
                    Box::pin(async move {
                        let result = dispatcher.dispatch(&compiled, &args).await;
                        Ok(result.unwrap_or_else(|error| error.failure_value()))
                    })
                })
            }
            ExecutionModel::Client(model) => {
                let function_name =
                    strip_context_prefix(&model.function_name).to_string();
                let registry = self.client_registry.clone();
                Arc::new(move |args| {
                    let function_name = function_name.clone();
                    let registry = registry.clone();
                    Box::pin(async move {
                        // Parameters pass through as structured data; the
                        // target is a typed function, not a text template.
                        let filtered = filter_args(&args);
                        let result = match registry {
                            Some(registry) => registry.invoke(&function_name, filtered).await,
                            None => Err(DispatchError::MissingClientRegistry),
                        };
                        Ok(result.unwrap_or_else(|error| error.failure_value()))
                    })
                })
            }
        };

        Ok(Tool::new(name, action.description.clone(), input_schema, executor))
    }

    /// Compile every action into a tool registry.
    ///
    /// Actions whose parameter schema fails to compile are omitted from the
    /// tool set.
    pub fn compile_all(&self, actions: &[Action]) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        for action in actions {
            match self.compile(action) {
                Ok(tool) => registry.register(tool),
                Err(error) => {
                    warn!(action = %action.name, %error, "omitting action with invalid parameter schema");
                }
            }
        }
        registry
    }
}
