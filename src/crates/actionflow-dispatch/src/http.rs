//! HTTP dispatch for server-context actions.
//!
//! Resolves an action's compiled request template against the tool arguments
//! and issues the request with reqwest. A request is refused before any
//! network traffic when its URL or a header still carries an unresolved
//! placeholder; a malformed URL must never reach the wire.
//!
//! The parsed JSON response is returned verbatim as the tool result. An HTTP
//! 200 whose body is itself an upstream error payload is *not* treated as a
//! dispatch failure: the model is the consumer of both shapes. Only
//! transport-level failures (network, non-2xx status, non-JSON body) become
//! [`DispatchError`]s.

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use actionflow_core::template::{params_from_args, CompiledRequest, ResolvedRequest};
use actionflow_core::HttpMethod;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Issues resolved action requests.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
    config: DispatchConfig,
}

impl HttpDispatcher {
    /// Create a dispatcher with the given configuration.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// The configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve a compiled request against raw tool arguments.
    ///
    /// Fails with [`DispatchError::UnresolvedPlaceholder`] when a URL or
    /// header parameter is absent from the arguments.
    pub fn resolve(&self, compiled: &CompiledRequest, args: &Value) -> Result<ResolvedRequest> {
        let params = params_from_args(args);
        if let Some(name) = compiled.first_missing(&params) {
            return Err(DispatchError::UnresolvedPlaceholder(name.to_string()));
        }
        Ok(compiled.resolve(&params))
    }

    /// Resolve and dispatch a compiled request, returning the parsed JSON
    /// response.
    pub async fn dispatch(&self, compiled: &CompiledRequest, args: &Value) -> Result<Value> {
        let resolved = self.resolve(compiled, args)?;
        self.send(resolved).await
    }

    /// Issue an already-resolved request.
    pub async fn send(&self, request: ResolvedRequest) -> Result<Value> {
        debug!(method = %request.method, url = %request.url, "dispatching action request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
            HttpMethod::Patch => self.client.patch(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = match body {
                // A string-shaped body that failed to parse as JSON goes on
                // the wire unparsed, as authored.
                Value::String(text) => builder.body(text),
                other => builder.json(&other),
            };
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|error| DispatchError::InvalidJson(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionflow_core::action::{HttpMethod, RequestTemplate};
    use serde_json::json;

    fn dispatcher() -> HttpDispatcher {
        HttpDispatcher::new(DispatchConfig::new()).unwrap()
    }

    fn weather_request() -> CompiledRequest {
        CompiledRequest::compile(&RequestTemplate {
            url: "https://api.x/{{city}}".to_string(),
            method: HttpMethod::Get,
            headers: None,
            body: None,
        })
    }

    // Scenario: GetWeather invoked with {city: "Oslo"} resolves to
    // https://api.x/Oslo.
    #[test]
    fn resolves_url_from_arguments() {
        let resolved = dispatcher()
            .resolve(&weather_request(), &json!({"city": "Oslo"}))
            .unwrap();
        assert_eq!(resolved.url, "https://api.x/Oslo");
        assert_eq!(resolved.method, HttpMethod::Get);
    }

    // Scenario: the same action with {city: undefined} must surface a
    // dispatch error instead of calling an invalid URL.
    #[test]
    fn refuses_dispatch_with_unresolved_url_parameter() {
        let error = dispatcher()
            .resolve(&weather_request(), &json!({"city": null}))
            .unwrap_err();
        assert!(
            matches!(error, DispatchError::UnresolvedPlaceholder(name) if name == "city")
        );
    }

    #[test]
    fn refuses_dispatch_with_unresolved_header_parameter() {
        let compiled = CompiledRequest::compile(&RequestTemplate {
            url: "https://api.x/fixed".to_string(),
            method: HttpMethod::Post,
            headers: Some(
                [("Authorization".to_string(), "Bearer {{token}}".to_string())]
                    .into_iter()
                    .collect(),
            ),
            body: None,
        });

        let error = dispatcher().resolve(&compiled, &json!({})).unwrap_err();
        assert!(
            matches!(error, DispatchError::UnresolvedPlaceholder(name) if name == "token")
        );
    }

    #[test]
    fn resolves_body_with_missing_optional_fields_dropped() {
        let compiled = CompiledRequest::compile(&RequestTemplate {
            url: "https://api.x/notes".to_string(),
            method: HttpMethod::Post,
            headers: None,
            body: Some(actionflow_core::BodyTemplate::Structured(json!({
                "text": "{{text}}",
                "tags": "{{tags}}",
            }))),
        });

        let resolved = dispatcher()
            .resolve(&compiled, &json!({"text": "hello"}))
            .unwrap();
        assert_eq!(resolved.body, Some(json!({"text": "hello"})));
    }
}
