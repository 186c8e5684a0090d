//! Error types for action dispatch.

use actionflow_core::SchemaError;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors that can occur while dispatching an action.
///
/// Dispatch errors are recovered locally: the tool compiler folds them into
/// an `{error, details}` result value via [`failure_value`] so the
/// conversation layer never sees them as exceptions and the model can reason
/// about the failure in its next turn.
///
/// [`failure_value`]: DispatchError::failure_value
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The HTTP request could not be issued or completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream returned a non-success status.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The upstream response body was not valid JSON.
    #[error("upstream response was not valid JSON: {0}")]
    InvalidJson(String),

    /// A URL or header placeholder was still unresolved at dispatch time.
    #[error("parameter '{0}' was not resolved before dispatch")]
    UnresolvedPlaceholder(String),

    /// The requested client function is not in the caller-supplied registry.
    #[error("client function '{0}' is not registered")]
    UnknownClientFunction(String),

    /// No client registry was supplied for a client-context action.
    #[error("no client function registry was supplied")]
    MissingClientRegistry,

    /// The action's parameter schema could not be compiled.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A client function reported a failure of its own.
    #[error("client function failed: {0}")]
    ClientFunction(String),
}

impl DispatchError {
    /// Fold this error into the `{error, details}` value returned as the
    /// tool result.
    pub fn failure_value(&self) -> Value {
        let kind = match self {
            DispatchError::Http(_) => "request_failed",
            DispatchError::Status { .. } => "upstream_status",
            DispatchError::InvalidJson(_) => "invalid_json",
            DispatchError::UnresolvedPlaceholder(_) => "unresolved_parameter",
            DispatchError::UnknownClientFunction(_) => "unknown_client_function",
            DispatchError::MissingClientRegistry => "unknown_client_function",
            DispatchError::Schema(_) => "invalid_schema",
            DispatchError::ClientFunction(_) => "client_function_failed",
        };
        json!({"error": kind, "details": self.to_string()})
    }
}
