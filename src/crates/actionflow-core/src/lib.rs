//! # actionflow-core: Action Model & Compilation Primitives
//!
//! Core types for turning declarative action records into callable tools:
//!
//! - **[Action model](action)**: typed action records with a tagged
//!   execution context (server HTTP request vs client function).
//! - **[Schema compiler](schema)**: declared parameters → JSON Schema input
//!   schema with all-optional fields.
//! - **[Template engine](template)**: `{{name}}` placeholder substitution
//!   over strings, JSON documents, and structured bodies, with the filtering
//!   rule that keeps payloads clean when the model omits optional values.
//! - **[Tool types](tool)**: the compiled tool, its registry, and parallel
//!   tool-call execution.
//!
//! Higher layers live in their own crates: `actionflow-dispatch` executes
//! compiled actions, `actionflow-conversation` drives the multi-turn
//! conversation loop.
//!
//! # Example
//!
//! ```rust
//! use actionflow_core::action::{Parameter, ParameterType};
//! use actionflow_core::schema::compile_schema;
//!
//! let schema = compile_schema(&[Parameter {
//!     name: "city".into(),
//!     description: "City name".into(),
//!     param_type: ParameterType::String,
//!     is_array: false,
//! }])
//! .unwrap();
//!
//! assert_eq!(schema["properties"]["city"]["type"], "string");
//! ```

pub mod action;
pub mod error;
pub mod schema;
pub mod template;
pub mod tool;

pub use action::{
    Action, BodyTemplate, ClientExecutionModel, ExecutionContext, ExecutionModel, HttpMethod,
    Parameter, ParameterType, RequestTemplate, ServerExecutionModel,
};
pub use error::SchemaError;
pub use schema::compile_schema;
pub use template::{
    filter_args, params_from_args, substitute_body, CompiledRequest, ParamMap, ResolvedRequest,
    StringTemplate,
};
pub use tool::{
    Tool, ToolCall, ToolCallResult, ToolError, ToolExecutor, ToolFuture, ToolOutput, ToolRegistry,
    ToolResult,
};
