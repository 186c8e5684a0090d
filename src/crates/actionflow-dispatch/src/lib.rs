//! Action dispatch and tool compilation.
//!
//! This crate turns action records from `actionflow-core` into things that
//! actually run:
//!
//! - [`http`] - resolves compiled request templates against call arguments
//!   and issues the HTTP requests for server-context actions.
//! - [`registry`] - the per-session registry of client callback functions
//!   that client-context actions are delivered to.
//! - [`compiler`] - compiles each action into a callable [`Tool`] whose name
//!   encodes the execution context (`ACTION_SERVER_` / `ACTION_CLIENT_`).
//! - [`dispatcher`] - direct one-shot execution of an action outside the
//!   tool layer.
//!
//! Execution failures are folded into `{error, details}` result values by
//! the compiled tools, so a conversation continues after a failed call and
//! the model can explain or retry.
//!
//! [`Tool`]: actionflow_core::Tool

pub mod compiler;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod registry;

pub use compiler::{
    context_prefix, is_action_tool, sanitize, strip_context_prefix, tool_name, ToolCompiler,
    ACTION_PREFIX, CLIENT_PREFIX, SERVER_PREFIX,
};
pub use config::DispatchConfig;
pub use dispatcher::ActionDispatcher;
pub use error::{DispatchError, Result};
pub use http::HttpDispatcher;
pub use registry::{ClientFunction, ClientFunctionRegistry};
