//! Action data model.
//!
//! An [`Action`] is an immutable, declarative description of one callable
//! capability: either a server-side HTTP request built from templates, or a
//! client-side function looked up in a caller-supplied registry at runtime.
//! Action records are owned by an external definition store and are read-only
//! here; this crate only projects them into compiled tools.
//!
//! Execution context is a tagged variant ([`ExecutionModel`]) resolved once
//! when the record is deserialized, so downstream code matches on an enum
//! instead of re-parsing a context string per call.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "id": "act_1",
//!   "name": "GetWeather",
//!   "description": "Look up the current weather for a city",
//!   "executionContext": "SERVER",
//!   "executionModel": {
//!     "request": {
//!       "url": "https://api.example.com/weather/{{city}}",
//!       "method": "GET"
//!     }
//!   },
//!   "parameters": [
//!     {"name": "city", "description": "City name", "type": "string"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A declarative description of one callable capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Stable identifier assigned by the definition store.
    pub id: String,

    /// Human label; the tool name is derived from it.
    pub name: String,

    /// Natural-language hint shown to the model when selecting tools.
    pub description: String,

    /// Execution context plus its context-specific model.
    #[serde(flatten)]
    pub execution: ExecutionModel,

    /// Declared parameters. Names are unique within one action and match the
    /// placeholder tokens used in the request template.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Action {
    /// The execution context this action runs in.
    pub fn context(&self) -> ExecutionContext {
        self.execution.context()
    }
}

/// Where an action executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// Outbound HTTP request issued by the server runtime.
    Server,
    /// Named function invoked in the embedding client.
    Client,
}

/// Execution context tag plus the context-specific execution model.
///
/// Serialized adjacently tagged so the stored record keeps its
/// `executionContext` / `executionModel` field pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "executionContext", content = "executionModel")]
pub enum ExecutionModel {
    /// Server-side HTTP call described by a request template.
    #[serde(rename = "SERVER")]
    Server(ServerExecutionModel),

    /// Client-side function resolved against a runtime registry.
    #[serde(rename = "CLIENT")]
    Client(ClientExecutionModel),
}

impl ExecutionModel {
    /// The execution context this model belongs to.
    pub fn context(&self) -> ExecutionContext {
        match self {
            ExecutionModel::Server(_) => ExecutionContext::Server,
            ExecutionModel::Client(_) => ExecutionContext::Client,
        }
    }
}

/// Execution model for server actions: one templated HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerExecutionModel {
    /// The request template resolved against tool arguments at dispatch time.
    pub request: RequestTemplate,
}

/// Execution model for client actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientExecutionModel {
    /// Key the embedding page must provide in its function registry. May
    /// carry the execution-context prefix; the dispatcher strips it before
    /// lookup.
    pub function_name: String,
}

/// Templated HTTP request attached to a server action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    /// URL template; may contain `{{name}}` placeholders.
    pub url: String,

    /// HTTP method.
    pub method: HttpMethod,

    /// Header templates, substituted the same way as the URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Optional body template, either a literal JSON document containing
    /// placeholders or a structured object with templated leaf strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyTemplate>,
}

/// HTTP methods supported by action requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// Body template in one of its two stored forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BodyTemplate {
    /// A literal JSON document as text, with `{{name}}` placeholders that
    /// are substituted type-preservingly before parsing.
    Text(String),

    /// A structured value whose leaf strings carry placeholders.
    Structured(Value),
}

/// One declared parameter of an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name; matches the placeholder token in templates.
    pub name: String,

    /// Natural-language description forwarded into the input schema.
    #[serde(default)]
    pub description: String,

    /// Declared value type.
    #[serde(rename = "type")]
    pub param_type: ParameterType,

    /// Whether the parameter is a list of the declared type.
    #[serde(default)]
    pub is_array: bool,
}

/// Declared parameter types.
///
/// Stored records with any other type tag deserialize to [`Unknown`], which
/// the schema compiler rejects rather than silently defaulting.
///
/// [`Unknown`]: ParameterType::Unknown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    #[serde(other, skip_serializing)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_server_action() {
        let raw = json!({
            "id": "act_1",
            "name": "GetWeather",
            "description": "Look up weather",
            "executionContext": "SERVER",
            "executionModel": {
                "request": {
                    "url": "https://api.x/{{city}}",
                    "method": "GET"
                }
            },
            "parameters": [
                {"name": "city", "description": "City name", "type": "string"}
            ]
        });

        let action: Action = serde_json::from_value(raw).unwrap();
        assert_eq!(action.context(), ExecutionContext::Server);
        match &action.execution {
            ExecutionModel::Server(model) => {
                assert_eq!(model.request.url, "https://api.x/{{city}}");
                assert_eq!(model.request.method, HttpMethod::Get);
            }
            ExecutionModel::Client(_) => panic!("expected server model"),
        }
        assert_eq!(action.parameters.len(), 1);
        assert_eq!(action.parameters[0].param_type, ParameterType::String);
    }

    #[test]
    fn deserializes_client_action() {
        let raw = json!({
            "id": "act_2",
            "name": "Refresh Page",
            "description": "Reload the embedding page",
            "executionContext": "CLIENT",
            "executionModel": {"functionName": "ACTION_CLIENT_refreshPage"}
        });

        let action: Action = serde_json::from_value(raw).unwrap();
        assert_eq!(action.context(), ExecutionContext::Client);
        match &action.execution {
            ExecutionModel::Client(model) => {
                assert_eq!(model.function_name, "ACTION_CLIENT_refreshPage");
            }
            ExecutionModel::Server(_) => panic!("expected client model"),
        }
        assert!(action.parameters.is_empty());
    }

    #[test]
    fn unknown_parameter_type_is_preserved_not_defaulted() {
        let raw = json!({"name": "when", "type": "datetime"});
        let parameter: Parameter = serde_json::from_value(raw).unwrap();
        assert_eq!(parameter.param_type, ParameterType::Unknown);
    }

    #[test]
    fn body_template_forms() {
        let text: BodyTemplate =
            serde_json::from_value(json!("{\"amount\": {{amount}}}")).unwrap();
        assert!(matches!(text, BodyTemplate::Text(_)));

        let structured: BodyTemplate =
            serde_json::from_value(json!({"note": "{{note}}"})).unwrap();
        assert!(matches!(structured, BodyTemplate::Structured(_)));
    }

    #[test]
    fn action_round_trips_through_serde() {
        let action = Action {
            id: "act_3".into(),
            name: "CreateNote".into(),
            description: "Create a note".into(),
            execution: ExecutionModel::Server(ServerExecutionModel {
                request: RequestTemplate {
                    url: "https://api.x/notes".into(),
                    method: HttpMethod::Post,
                    headers: None,
                    body: Some(BodyTemplate::Structured(json!({"text": "{{text}}"}))),
                },
            }),
            parameters: vec![Parameter {
                name: "text".into(),
                description: String::new(),
                param_type: ParameterType::String,
                is_array: false,
            }],
        };

        let raw = serde_json::to_value(&action).unwrap();
        assert_eq!(raw["executionContext"], "SERVER");
        let back: Action = serde_json::from_value(raw).unwrap();
        assert_eq!(back, action);
    }
}
