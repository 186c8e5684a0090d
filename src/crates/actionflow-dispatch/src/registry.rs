//! Client function registry.
//!
//! Client-context actions resolve to functions supplied by the embedding
//! page. The registry is an explicitly injected dependency with a defined
//! lifecycle: built before the widget initializes, handed to the dispatcher
//! and tool compiler for one conversation session, and dropped on teardown.
//! Nothing here is ambient or module-global.
//!
//! # Example
//!
//! ```rust
//! use actionflow_dispatch::registry::ClientFunctionRegistry;
//! use serde_json::json;
//!
//! let mut registry = ClientFunctionRegistry::new();
//! registry.register("refreshPage", |_args| async move { Ok(json!({"ok": true})) });
//! assert!(registry.contains("refreshPage"));
//! ```

use crate::error::{DispatchError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future type returned by client functions.
pub type ClientFunctionFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// A registered client function: async, takes the filtered parameter map.
pub type ClientFunction = Arc<dyn Fn(Value) -> ClientFunctionFuture + Send + Sync>;

/// Map from unqualified function name to callable function.
#[derive(Clone, Default)]
pub struct ClientFunctionRegistry {
    functions: HashMap<String, ClientFunction>,
}

impl ClientFunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register an async function under its unqualified name.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.functions.insert(
            name.into(),
            Arc::new(move |args| Box::pin(function(args))),
        );
    }

    /// Check whether a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names of every registered function.
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Invoke a function by unqualified name and await its result.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| DispatchError::UnknownClientFunction(name.to_string()))?;
        function(args).await
    }
}

impl std::fmt::Debug for ClientFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn invokes_registered_function_with_args() {
        let mut registry = ClientFunctionRegistry::new();
        registry.register("echo", |args| async move { Ok(json!({"echo": args})) });

        let result = registry.invoke("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(result, json!({"echo": {"x": 1}}));
    }

    #[tokio::test]
    async fn unknown_function_fails_with_typed_error() {
        let registry = ClientFunctionRegistry::new();
        let error = registry.invoke("missing", json!({})).await.unwrap_err();
        assert!(matches!(error, DispatchError::UnknownClientFunction(name) if name == "missing"));
    }
}
