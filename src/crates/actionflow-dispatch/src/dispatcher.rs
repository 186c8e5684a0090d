//! Direct action execution.
//!
//! [`ActionDispatcher`] runs a single action against concrete arguments
//! without going through the tool layer. The tool compiler is the normal
//! path for model-driven invocations; this entry point serves callers that
//! already hold an [`Action`] record and want its result now: previews,
//! scheduled runs, admin consoles.

use crate::compiler::strip_context_prefix;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::http::HttpDispatcher;
use crate::registry::ClientFunctionRegistry;
use actionflow_core::template::{filter_args, CompiledRequest};
use actionflow_core::{Action, ExecutionModel};
use serde_json::Value;
use tracing::debug;

/// Executes actions by routing on their execution context.
#[derive(Debug)]
pub struct ActionDispatcher {
    http: HttpDispatcher,
}

impl ActionDispatcher {
    /// Create a dispatcher from a dispatch configuration.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Ok(Self {
            http: HttpDispatcher::new(config)?,
        })
    }

    /// Execute one action with the given arguments.
    ///
    /// Server actions compile and resolve the request template, then issue
    /// the HTTP call. Client actions strip the context prefix from the
    /// target function name, filter the arguments, and invoke the matching
    /// entry in `registry`; a missing registry is an error because there is
    /// nowhere to deliver the call.
    pub async fn execute(
        &self,
        action: &Action,
        args: &Value,
        registry: Option<&ClientFunctionRegistry>,
    ) -> Result<Value> {
        debug!(action = %action.name, context = ?action.context(), "executing action");
        match &action.execution {
            ExecutionModel::Server(model) => {
                let compiled = CompiledRequest::compile(&model.request);
                self.http.dispatch(&compiled, args).await
            }
            ExecutionModel::Client(model) => {
                let registry = registry.ok_or(DispatchError::MissingClientRegistry)?;
                let function_name = strip_context_prefix(&model.function_name);
                registry.invoke(function_name, filter_args(args)).await
            }
        }
    }
}
