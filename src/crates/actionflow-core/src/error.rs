//! Error types for action schema compilation.

use thiserror::Error;

/// Result type for schema compilation.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while compiling an action's parameter list into an input
/// schema.
///
/// A schema error is fatal to tool compilation for that action: the action is
/// omitted from the tool set rather than compiled with a guessed type, since
/// an incorrect type would allow malformed downstream substitution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The same parameter name is declared more than once.
    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// The declared parameter type is not one of string/number/boolean.
    #[error("parameter '{name}' has an unsupported declared type")]
    UnsupportedType { name: String },

    /// A parameter declaration is unusable (e.g. empty name).
    #[error("invalid parameter declaration: {0}")]
    InvalidParameter(String),
}
