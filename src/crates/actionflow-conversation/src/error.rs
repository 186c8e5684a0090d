//! Error types for the conversation layer.

use thiserror::Error;

/// Result type for conversation operations.
pub type Result<T> = std::result::Result<T, ConversationError>;

/// Errors surfaced by the conversation orchestrator.
///
/// Only failures talking to the model endpoint itself reach this type;
/// action dispatch failures are folded into result values further down and
/// arrive here as ordinary tool results.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The model endpoint could not be reached.
    #[error("model endpoint request failed: {0}")]
    Endpoint(#[from] reqwest::Error),

    /// The model endpoint returned a non-success status.
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The model endpoint response could not be decoded.
    #[error("model endpoint response was invalid: {0}")]
    InvalidResponse(String),

    /// The model reported a terminal error for this turn.
    #[error("model turn failed: {0}")]
    Turn(String),

    /// A tool invocation part already carries a result.
    #[error("invocation '{0}' already has a result attached")]
    ResultAlreadyAttached(String),

    /// A result arrived for a tool call the transcript does not contain.
    #[error("no pending invocation with tool call id '{0}'")]
    UnknownInvocation(String),
}
